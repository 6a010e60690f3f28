//! Cut a compiled document into smaller import fragments.
//!
//! Importing a large document in one request can fail on the remote side;
//! fragments are meant to be imported in the order they are produced.

use serde::Serialize;

use crate::compiler::tree::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Host,
    HostItems,
    Template,
    Graph,
    Screen,
    HostScreen,
    TemplateScreen,
    Trigger,
}

impl FragmentKind {
    /// Document path of the fragment's payload.
    pub fn path(&self) -> &'static str {
        match self {
            FragmentKind::Host => "hosts/host",
            FragmentKind::HostItems => "hosts/host/items",
            FragmentKind::Template => "templates/template",
            FragmentKind::Graph => "graphs/graph",
            FragmentKind::Screen => "screens/screen",
            FragmentKind::HostScreen => "hosts/host/screens/screen",
            FragmentKind::TemplateScreen => "templates/template/screens/screen",
            FragmentKind::Trigger => "triggers/trigger",
        }
    }
}

/// A standalone document carrying one piece of a larger one.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub name: String,
    pub document: Node,
}

struct Splitter<'a> {
    root: &'a Node,
    fragments: Vec<Fragment>,
}

impl<'a> Splitter<'a> {
    /// A document with the source header, `body` and the root groups.
    fn emit(&mut self, kind: FragmentKind, name: Option<&str>, body: Node) {
        let mut document = Node::new(self.root.tag.as_str());
        for tag in ["version", "date"] {
            if let Some(header) = self.root.child(tag) {
                document.push(header.clone());
            }
        }
        document.push(body);
        if let Some(groups) = self.root.child("groups") {
            document.push(groups.clone());
        }
        self.fragments.push(Fragment {
            kind,
            name: name.unwrap_or_default().to_string(),
            document,
        });
    }

    fn scopes(&mut self, container: &str, member: &str, kind: FragmentKind, stripped: &[&str]) {
        let root = self.root;
        for scope in root.find_all(&format!("{container}/{member}")) {
            let mut copy = scope.clone();
            copy.retain_children(|child| !stripped.contains(&child.tag.as_str()));
            self.emit(kind, scope.text_at("name"), Node::new(container).with_child(copy));

            if kind == FragmentKind::Host {
                let items = scope.find_all("items/item");
                if !items.is_empty() {
                    let mut items_node = Node::new("items");
                    items_node.children = items.into_iter().cloned().collect();
                    let host = skeleton(scope, member).with_child(items_node);
                    self.emit(FragmentKind::HostItems, scope.text_at("name"), Node::new(container).with_child(host));
                }
            }
        }
    }

    fn members(&mut self, container: &str, member: &str, kind: FragmentKind) {
        let root = self.root;
        for node in root.find_all(&format!("{container}/{member}")) {
            self.emit(kind, node.text_at("name"), Node::new(container).with_child(node.clone()));
        }
    }

    fn scope_screens(&mut self, container: &str, member: &str, kind: FragmentKind) {
        let root = self.root;
        for scope in root.find_all(&format!("{container}/{member}")) {
            for screen in scope.find_all("screens/screen") {
                let host = skeleton(scope, member).with_child(Node::new("screens").with_child(screen.clone()));
                self.emit(kind, screen.text_at("name"), Node::new(container).with_child(host));
            }
        }
    }
}

/// A copy of a host or template holding only its naming fields.
fn skeleton(scope: &Node, member: &str) -> Node {
    let mut copy = Node::new(scope.tag.as_str());
    copy.children = scope
        .children
        .iter()
        .filter(|child| child.tag == "name" || child.tag == member)
        .cloned()
        .collect();
    copy
}

/// Hosts (without items and screens), host items, templates (without
/// screens), graphs, screens, host screens, template screens, triggers.
pub fn split(root: &Node) -> Vec<Fragment> {
    let mut splitter = Splitter {
        root,
        fragments: Vec::new(),
    };
    splitter.scopes("hosts", "host", FragmentKind::Host, &["screens", "items"]);
    splitter.scopes("templates", "template", FragmentKind::Template, &["screens"]);
    splitter.members("graphs", "graph", FragmentKind::Graph);
    splitter.members("screens", "screen", FragmentKind::Screen);
    splitter.scope_screens("hosts", "host", FragmentKind::HostScreen);
    splitter.scope_screens("templates", "template", FragmentKind::TemplateScreen);
    splitter.members("triggers", "trigger", FragmentKind::Trigger);
    splitter.fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(tag: &str, name: &str) -> Node {
        Node::new(tag).with_child(Node::leaf("name", name))
    }

    #[test]
    fn templates_lose_screens_and_screens_come_later() {
        let root = Node::new("zabbix_export")
            .with_child(Node::leaf("version", "2.0"))
            .with_child(Node::leaf("date", "2024-01-01T00:00:00.000000"))
            .with_child(
                Node::new("templates").with_child(
                    named("template", "T")
                        .with_child(Node::leaf("template", "T"))
                        .with_child(Node::new("items").with_child(Node::new("item")))
                        .with_child(Node::new("screens").with_child(named("screen", "S"))),
                ),
            )
            .with_child(Node::new("graphs").with_child(named("graph", "G")))
            .with_child(Node::new("groups").with_child(named("group", "Templates")));

        let fragments = split(&root);
        let kinds: Vec<_> = fragments.iter().map(|fragment| fragment.kind).collect();
        assert_eq!(
            kinds,
            vec![FragmentKind::Template, FragmentKind::Graph, FragmentKind::TemplateScreen]
        );

        let template = &fragments[0].document;
        assert!(template.find("templates/template/screens").is_none());
        assert!(template.find("templates/template/items").is_some());
        assert_eq!(template.text_at("groups/group/name"), Some("Templates"));
        assert_eq!(template.text_at("version"), Some("2.0"));

        let screen = &fragments[2];
        assert_eq!(screen.name, "S");
        let names: Vec<_> = screen.document.find_all("templates/template/*").into_iter().map(|n| n.tag.as_str()).collect();
        assert_eq!(names, vec!["name", "template", "screens"]);
    }

    #[test]
    fn hosts_split_their_items_out() {
        let root = Node::new("zabbix_export").with_child(
            Node::new("hosts").with_child(
                named("host", "web1")
                    .with_child(Node::leaf("host", "web1"))
                    .with_child(Node::new("items").with_child(Node::new("item").with_child(Node::leaf("key", "a")))),
            ),
        );
        let fragments = split(&root);
        assert_eq!(fragments.len(), 2);
        assert!(fragments[0].document.find("hosts/host/items").is_none());
        assert_eq!(fragments[1].kind, FragmentKind::HostItems);
        assert_eq!(fragments[1].document.text_at("hosts/host/items/item/key"), Some("a"));
    }
}
