//! Element tree with ElementTree-style `text`/`tail` strings.

/// Node in a parsed markup tree.
///
/// `text` is the content before the first child, `tail` the content after
/// the node's closing tag up to its next sibling. The root of a parsed
/// fragment is an anonymous node with an empty tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeNode {
    /// Element tag name, lowercase.
    pub tag: String,
    /// Text before the first child.
    pub text: String,
    /// Text after the closing tag.
    pub tail: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
    /// Child elements.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Create a new tree node with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set tail content.
    #[must_use]
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = tail.into();
        self
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Set children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children;
        self
    }

    /// Attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name, value)),
        }
    }

    /// Whitespace-separated classes of the node.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    /// Add a class unless already present.
    pub fn add_class(&mut self, class: &str) {
        if self.classes().any(|c| c == class) {
            return;
        }
        let value = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_owned(),
        };
        self.set_attr("class", value);
    }

    /// Concatenated text of the node and its descendants, tails of
    /// descendants included, the node's own tail excluded.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_text(out);
            out.push_str(&child.tail);
        }
    }

    /// Remove the child at `index`, keeping its tail text in the tree.
    ///
    /// The tail moves to the previous sibling's tail, or to this node's
    /// text when the removed child was the first.
    pub fn remove_child(&mut self, index: usize) -> TreeNode {
        let mut removed = self.children.remove(index);
        let tail = std::mem::take(&mut removed.tail);
        if index == 0 {
            self.text.push_str(&tail);
        } else {
            self.children[index - 1].tail.push_str(&tail);
        }
        removed
    }

    /// Remove the descendant at a child index path, see [`Self::remove_child`].
    pub fn remove_at(&mut self, path: &[usize]) -> Option<TreeNode> {
        let (&index, parent_path) = path.split_last()?;
        let parent = self.node_at_mut(parent_path)?;
        (index < parent.children.len()).then(|| parent.remove_child(index))
    }

    /// Replace the child at `index` with its own content.
    ///
    /// The child's text, children and tail take its place.
    pub fn unwrap_child(&mut self, index: usize) {
        let removed = self.children.remove(index);
        let leading = if index == 0 {
            &mut self.text
        } else {
            &mut self.children[index - 1].tail
        };
        leading.push_str(&removed.text);

        let mut grandchildren = removed.children;
        match grandchildren.last_mut() {
            Some(last) => last.tail.push_str(&removed.tail),
            None => {
                let leading = if index == 0 {
                    &mut self.text
                } else {
                    &mut self.children[index - 1].tail
                };
                leading.push_str(&removed.tail);
            }
        }
        self.children.splice(index..index, grandchildren);
    }

    /// Child index path to the first descendant matching `predicate`,
    /// in document order. The node itself is not considered.
    pub fn find_path(&self, predicate: &impl Fn(&TreeNode) -> bool) -> Option<Vec<usize>> {
        for (index, child) in self.children.iter().enumerate() {
            if predicate(child) {
                return Some(vec![index]);
            }
            if let Some(mut path) = child.find_path(predicate) {
                path.insert(0, index);
                return Some(path);
            }
        }
        None
    }

    /// Paths to every descendant matching `predicate`, in document order.
    /// A match comes before the matches nested inside it.
    pub fn find_all_paths(&self, predicate: &impl Fn(&TreeNode) -> bool) -> Vec<Vec<usize>> {
        let mut paths = Vec::new();
        let mut prefix = Vec::new();
        self.collect_paths(predicate, &mut prefix, &mut paths);
        paths
    }

    fn collect_paths(
        &self,
        predicate: &impl Fn(&TreeNode) -> bool,
        prefix: &mut Vec<usize>,
        paths: &mut Vec<Vec<usize>>,
    ) {
        for (index, child) in self.children.iter().enumerate() {
            prefix.push(index);
            if predicate(child) {
                paths.push(prefix.clone());
            }
            child.collect_paths(predicate, prefix, paths);
            prefix.pop();
        }
    }

    /// First descendant matching `predicate`, in document order.
    pub fn find(&self, predicate: &impl Fn(&TreeNode) -> bool) -> Option<&TreeNode> {
        let path = self.find_path(predicate)?;
        self.node_at(&path)
    }

    /// First descendant with the given tag.
    #[must_use]
    pub fn find_tag(&self, tag: &str) -> Option<&TreeNode> {
        self.find(&|node: &TreeNode| node.tag == tag)
    }

    /// Node at a child index path.
    #[must_use]
    pub fn node_at(&self, path: &[usize]) -> Option<&TreeNode> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get(index))
    }

    /// Mutable node at a child index path.
    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut TreeNode> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get_mut(index))
    }

    /// Visit every descendant mutably, parents before children.
    pub fn for_each_descendant_mut(&mut self, f: &mut impl FnMut(&mut TreeNode)) {
        for child in &mut self.children {
            f(child);
            child.for_each_descendant_mut(f);
        }
    }
}
