//! Whole-document rewrites applied after pruning.

use crate::compiler::tree::Node;

/// Containers that hold host scopes at the document root.
const HOST_SCOPES: [(&str, &str); 2] = [("hosts", "host"), ("templates", "template")];

/// Final order of the document root's children.
const ROOT_ORDER: [&str; 8] = [
    "version",
    "date",
    "templates",
    "graphs",
    "hosts",
    "screens",
    "triggers",
    "groups",
];

fn for_each_scope(root: &mut Node, mut apply: impl FnMut(&mut Node)) {
    for (container, member) in HOST_SCOPES {
        for scopes in root.children.iter_mut().filter(|child| child.tag == container) {
            for scope in scopes.children.iter_mut().filter(|child| child.tag == member) {
                apply(scope);
            }
        }
    }
}

/// Move every `container` nested in a root-level host or template into a
/// single root `container`, appending after any existing root members.
pub fn hoist(root: &mut Node, container: &str) {
    let mut moved = Vec::new();
    for_each_scope(root, |scope| {
        for nested in scope.take_children(container) {
            moved.extend(nested.children);
        }
    });
    if moved.is_empty() {
        return;
    }
    match root.child_mut(container) {
        Some(existing) => existing.children.extend(moved),
        None => {
            let mut target = Node::new(container);
            target.children = moved;
            root.push(target);
        }
    }
}

fn push_unique(names: &mut Vec<String>, name: Option<&str>) {
    if let Some(name) = name {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
}

/// `container/member/name` texts found anywhere strictly below `node`.
fn nested_names(node: &Node, container: &str, member: &str, names: &mut Vec<String>) {
    let path = format!("{member}/name");
    for found in node.descendants().into_iter().filter(|found| found.tag == container) {
        for name in found.find_all(&path) {
            push_unique(names, name.text.as_deref());
        }
    }
}

fn name_container(container: &str, member: &str, names: Vec<String>) -> Node {
    let mut node = Node::new(container);
    for name in names {
        node.push(Node::new(member).with_child(Node::leaf("name", name)));
    }
    node
}

/// Rebuild the root `groups` as the union of every nested group name.
pub fn rollup_groups(root: &mut Node) {
    let mut names = Vec::new();
    for child in root.children.iter().filter(|child| child.tag != "groups") {
        nested_names(child, "groups", "group", &mut names);
    }
    root.take_children("groups");
    if !names.is_empty() {
        root.push(name_container("groups", "group", names));
    }
}

/// Rebuild each host's and template's `applications` as the union of its own
/// and every nested application name.
pub fn rollup_applications(root: &mut Node) {
    for_each_scope(root, |scope| {
        let mut names = Vec::new();
        nested_names(scope, "applications", "application", &mut names);
        if names.is_empty() {
            return;
        }
        let rebuilt = name_container("applications", "application", names);
        match scope.child_mut("applications") {
            Some(existing) => *existing = rebuilt,
            None => {
                scope.push(rebuilt);
            }
        }
    });
}

/// Drop empty aggregate containers and order the root's children.
pub fn order_root(root: &mut Node) {
    root.retain_children(|child| !(ROOT_ORDER[2..].contains(&child.tag.as_str()) && child.children.is_empty()));
    root.children.sort_by_key(|child| {
        ROOT_ORDER
            .iter()
            .position(|tag| *tag == child.tag)
            .unwrap_or(ROOT_ORDER.len())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(tag: &str, name: &str) -> Node {
        Node::new(tag).with_child(Node::leaf("name", name))
    }

    #[test]
    fn graphs_move_to_the_root() {
        let mut root = Node::new("zabbix_export").with_child(
            Node::new("hosts").with_child(
                named("host", "web1").with_child(Node::new("graphs").with_child(named("graph", "CPU"))),
            ),
        );
        hoist(&mut root, "graphs");
        assert!(root.find("hosts/host/graphs").is_none());
        assert_eq!(root.text_at("graphs/graph/name"), Some("CPU"));
    }

    #[test]
    fn applications_include_own_and_nested_names() {
        let mut root = Node::new("zabbix_export").with_child(
            Node::new("templates").with_child(
                named("template", "base")
                    .with_child(Node::new("applications").with_child(named("application", "Own")))
                    .with_child(Node::new("items").with_child(
                        Node::new("item").with_child(
                            Node::new("applications")
                                .with_child(named("application", "Nested"))
                                .with_child(named("application", "Own")),
                        ),
                    )),
            ),
        );
        rollup_applications(&mut root);
        let names: Vec<_> = root
            .find_all("templates/template/applications/application/name")
            .into_iter()
            .filter_map(|node| node.text.as_deref())
            .collect();
        assert_eq!(names, vec!["Own", "Nested"]);
    }

    #[test]
    fn root_is_ordered_and_empty_containers_dropped() {
        let mut root = Node::new("zabbix_export")
            .with_child(Node::new("groups"))
            .with_child(Node::new("hosts").with_child(named("host", "a")))
            .with_child(Node::leaf("date", "now"))
            .with_child(Node::new("templates").with_child(named("template", "t")))
            .with_child(Node::leaf("version", "2.0"));
        order_root(&mut root);
        let tags: Vec<_> = root.children.iter().map(|child| child.tag.as_str()).collect();
        assert_eq!(tags, vec!["version", "date", "templates", "hosts"]);
    }
}
