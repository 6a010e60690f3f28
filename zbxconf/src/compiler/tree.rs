/// One element of a compiled document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub tag: String,
    pub text: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: None,
            children: Vec::new(),
        }
    }

    /// A text-only node.
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    pub fn push(&mut self, child: Node) -> &mut Node {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// First direct child with `tag`.
    pub fn child(&self, tag: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.tag == tag)
    }

    pub fn child_mut(&mut self, tag: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|child| child.tag == tag)
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    /// Every node matching a `/`-separated path of tags, relative to `self`.
    pub fn find_all(&self, path: &str) -> Vec<&Node> {
        let mut current = vec![self];
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|node| node.children.iter())
                .filter(|child| segment == "*" || child.tag == segment)
                .collect();
        }
        current
    }

    pub fn find(&self, path: &str) -> Option<&Node> {
        self.find_all(path).into_iter().next()
    }

    /// Text of the first node at `path`.
    pub fn text_at(&self, path: &str) -> Option<&str> {
        self.find(path).and_then(|node| node.text.as_deref())
    }

    /// Every node strictly below `self`, depth first in document order.
    pub fn descendants(&self) -> Vec<&Node> {
        let mut found = Vec::new();
        for child in &self.children {
            found.push(child);
            found.extend(child.descendants());
        }
        found
    }

    /// Remove and return every direct child with `tag`.
    pub fn take_children(&mut self, tag: &str) -> Vec<Node> {
        let (taken, kept) = std::mem::take(&mut self.children)
            .into_iter()
            .partition(|child| child.tag == tag);
        self.children = kept;
        taken
    }

    pub fn retain_children(&mut self, keep: impl FnMut(&Node) -> bool) {
        self.children.retain(keep);
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.is_none()
    }
}
