//! html5ever tree sink that collects a small reference-counted DOM.
//!
//! The DOM only lives for one parse: [`DomSink::into_body`] turns the
//! content of `<body>` into a [`TreeNode`] with text/tail strings.

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, QualName};

use super::tree::TreeNode;

type DomRef = Rc<DomNode>;

enum NodeKind {
    Document,
    Element {
        name: QualName,
        attrs: RefCell<Vec<Attribute>>,
    },
    Text(RefCell<String>),
    /// Comments and processing instructions, dropped on conversion.
    Ignored,
}

pub(super) struct DomNode {
    kind: NodeKind,
    parent: RefCell<Option<Weak<DomNode>>>,
    children: RefCell<Vec<DomRef>>,
}

impl DomNode {
    fn new(kind: NodeKind) -> DomRef {
        Rc::new(Self {
            kind,
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }

    fn parent(&self) -> Option<DomRef> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn local_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { name, .. } => Some(&*name.local),
            _ => None,
        }
    }
}

/// Builds a [`DomNode`] tree for html5ever.
pub(super) struct DomSink {
    document: DomRef,
}

impl DomSink {
    pub(super) fn new() -> Self {
        Self {
            document: DomNode::new(NodeKind::Document),
        }
    }

    /// Content of the first `<body>` element as an anonymous root.
    pub(super) fn into_body(self) -> TreeNode {
        let mut root = TreeNode::default();
        if let Some(body) = find_element(&self.document, "body") {
            fill(&body, &mut root);
        }
        root
    }
}

fn find_element(node: &DomRef, tag: &str) -> Option<DomRef> {
    if node.local_name() == Some(tag) {
        return Some(Rc::clone(node));
    }
    node.children
        .borrow()
        .iter()
        .find_map(|child| find_element(child, tag))
}

/// Copy `node`'s children into `out`, folding text into `text`/`tail`.
fn fill(node: &DomNode, out: &mut TreeNode) {
    for child in node.children.borrow().iter() {
        match &child.kind {
            NodeKind::Text(text) => match out.children.last_mut() {
                Some(last) => last.tail.push_str(&text.borrow()),
                None => out.text.push_str(&text.borrow()),
            },
            NodeKind::Element { name, attrs } => {
                let mut element = TreeNode::new(&*name.local);
                element.attrs = attrs.borrow().iter().map(attr_pair).collect();
                fill(child, &mut element);
                out.children.push(element);
            }
            NodeKind::Document | NodeKind::Ignored => {}
        }
    }
}

fn attr_pair(attr: &Attribute) -> (String, String) {
    let key = match &attr.name.prefix {
        Some(prefix) => format!("{prefix}:{}", attr.name.local),
        None => attr.name.local.to_string(),
    };
    (key, attr.value.to_string())
}

fn append_text(parent: &DomRef, text: &str) {
    let mut children = parent.children.borrow_mut();
    if let Some(NodeKind::Text(existing)) = children.last().map(|last| &last.kind) {
        existing.borrow_mut().push_str(text);
        return;
    }
    let node = DomNode::new(NodeKind::Text(RefCell::new(text.to_owned())));
    *node.parent.borrow_mut() = Some(Rc::downgrade(parent));
    children.push(node);
}

fn detach(target: &DomRef) {
    let parent = target.parent.borrow_mut().take();
    if let Some(parent) = parent.as_ref().and_then(Weak::upgrade) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, target));
    }
}

impl TreeSink for DomSink {
    type Handle = DomRef;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        tracing::trace!(error = %msg, "Recovered from HTML parse error");
    }

    fn get_document(&self) -> DomRef {
        Rc::clone(&self.document)
    }

    fn elem_name<'a>(&'a self, target: &'a DomRef) -> Self::ElemName<'a> {
        static NO_NAME: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };
        match &target.kind {
            NodeKind::Element { name, .. } => name,
            _ => &NO_NAME,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> DomRef {
        DomNode::new(NodeKind::Element {
            name,
            attrs: RefCell::new(attrs),
        })
    }

    fn create_comment(&self, _text: StrTendril) -> DomRef {
        DomNode::new(NodeKind::Ignored)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> DomRef {
        DomNode::new(NodeKind::Ignored)
    }

    fn append(&self, parent: &DomRef, child: NodeOrText<DomRef>) {
        match child {
            NodeOrText::AppendNode(node) => {
                detach(&node);
                *node.parent.borrow_mut() = Some(Rc::downgrade(parent));
                parent.children.borrow_mut().push(node);
            }
            NodeOrText::AppendText(text) => append_text(parent, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &DomRef,
        prev_element: &DomRef,
        child: NodeOrText<DomRef>,
    ) {
        if element.parent().is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &DomRef) -> DomRef {
        Rc::clone(target)
    }

    fn same_node(&self, x: &DomRef, y: &DomRef) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &DomRef, new_node: NodeOrText<DomRef>) {
        let Some(parent) = sibling.parent() else {
            return;
        };
        if let NodeOrText::AppendNode(node) = &new_node {
            detach(node);
        }

        let mut children = parent.children.borrow_mut();
        let Some(index) = children.iter().position(|child| Rc::ptr_eq(child, sibling)) else {
            return;
        };
        let node = match new_node {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => {
                if let Some(NodeKind::Text(existing)) =
                    index.checked_sub(1).map(|prev| &children[prev].kind)
                {
                    existing.borrow_mut().push_str(&text);
                    return;
                }
                DomNode::new(NodeKind::Text(RefCell::new(text.to_string())))
            }
        };
        *node.parent.borrow_mut() = Some(Rc::downgrade(&parent));
        children.insert(index, node);
    }

    fn add_attrs_if_missing(&self, target: &DomRef, attrs: Vec<Attribute>) {
        if let NodeKind::Element { attrs: existing, .. } = &target.kind {
            let mut existing = existing.borrow_mut();
            for attr in attrs {
                if !existing.iter().any(|present| present.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &DomRef) {
        detach(target);
    }

    fn reparent_children(&self, node: &DomRef, new_parent: &DomRef) {
        let moved = std::mem::take(&mut *node.children.borrow_mut());
        let mut children = new_parent.children.borrow_mut();
        for child in moved {
            *child.parent.borrow_mut() = Some(Rc::downgrade(new_parent));
            children.push(child);
        }
    }
}
