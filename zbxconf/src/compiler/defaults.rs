//! Default-pruning rules.
//!
//! A rule names a node by its tag path and the value the import format
//! already assumes for it. Pruning removes such nodes from compiled output so
//! documents only carry what differs from the defaults. Rules are plain data:
//! they can be built in code with nested [`scope`]s, or loaded from TOML.

use serde::{Deserialize, Serialize};

use crate::compiler::tree::Node;
use crate::types::Value;

/// One `(path, value)` pruning rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultRule {
    pub path: String,
    pub value: Value,
}

impl DefaultRule {
    pub fn new(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Path segments; both `/` and `.` separate tags.
    fn segments(&self) -> Vec<&str> {
        self.path
            .split(['/', '.'])
            .filter(|segment| !segment.is_empty())
            .collect()
    }
}

/// A rule or a nested group of rules sharing a path prefix.
#[derive(Debug, Clone)]
pub enum RuleEntry {
    Rule(String, Value),
    Scope(String, Vec<RuleEntry>),
}

pub fn rule(path: &str, value: impl Into<Value>) -> RuleEntry {
    RuleEntry::Rule(path.to_string(), value.into())
}

pub fn scope(path: &str, entries: Vec<RuleEntry>) -> RuleEntry {
    RuleEntry::Scope(path.to_string(), entries)
}

/// An ordered table of pruning rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultRules {
    rules: Vec<DefaultRule>,
}

impl DefaultRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten nested scopes into `prefix/path` rules.
    pub fn from_entries(entries: Vec<RuleEntry>) -> Self {
        let mut rules = Self::new();
        for entry in entries {
            rules.flatten(None, entry);
        }
        rules
    }

    fn flatten(&mut self, prefix: Option<&str>, entry: RuleEntry) {
        let join = |path: &str| match prefix {
            Some(prefix) => format!("{prefix}/{path}"),
            None => path.to_string(),
        };
        match entry {
            RuleEntry::Rule(path, value) => self.rules.push(DefaultRule { path: join(&path), value }),
            RuleEntry::Scope(path, entries) => {
                let nested = join(&path);
                for entry in entries {
                    self.flatten(Some(&nested), entry);
                }
            }
        }
    }

    /// The rule table for the 2.0 import format.
    pub fn standard() -> Self {
        Self::from_entries(vec![
            scope(
                "host",
                vec![
                    rule("ipmi_authtype", -1),
                    rule("ipmi_available", 0),
                    rule("ipmi_privilege", 2),
                    rule("ipmi_username", ""),
                    rule("ipmi_password", ""),
                    rule("maintenance_status", 0),
                    rule("snmp_available", 0),
                    rule("status", 0),
                    scope("inventory", vec![rule("inventory_mode", 0)]),
                ],
            ),
            scope(
                "host_prototype",
                vec![
                    rule("ipmi_authtype", -1),
                    rule("ipmi_available", 0),
                    rule("ipmi_privilege", 2),
                    rule("maintenance_status", 0),
                    rule("snmp_available", 0),
                    rule("status", 0),
                    scope("inventory", vec![rule("inventory_mode", 0)]),
                ],
            ),
            scope(
                "item",
                vec![
                    rule("authtype", 0),
                    rule("data_type", 0),
                    rule("delta", 0),
                    rule("formula", 1),
                    rule("history", 7),
                    rule("inventory_link", 0),
                    rule("state", 0),
                    rule("status", 0),
                    rule("trends", 365),
                    rule("units", ""),
                    rule("snmpv3_authprotocol", 0),
                    rule("snmpv3_privprotocol", 0),
                    rule("multiplier", 0),
                ],
            ),
            scope("screen", vec![rule("vsize", 1)]),
            scope(
                "screen_item",
                vec![
                    rule("dynamic", 0),
                    rule("elements", 25),
                    rule("halign", 0),
                    rule("height", 200),
                    rule("sort_triggers", 0),
                    rule("style", 0),
                    rule("valign", 0),
                    rule("width", 320),
                    rule("colspan", 1),
                    rule("rowspan", 1),
                ],
            ),
            scope(
                "action",
                vec![
                    rule("recovery_msg", 0),
                    rule("status", 0),
                    scope("condition", vec![rule("operator", 0)]),
                    scope(
                        "operation",
                        vec![
                            rule("esc_period", 0),
                            rule("esc_step_from", 1),
                            rule("esc_step_to", 1),
                            rule("evaltype", 0),
                            rule("operator", 0),
                        ],
                    ),
                    scope("message", vec![rule("default_msg", 0)]),
                ],
            ),
            scope(
                "graph",
                vec![
                    rule("type", 0),
                    rule("percent_left", 0.0),
                    rule("percent_right", 0.0),
                    rule("show_3d", 0),
                    rule("show_legend", 1),
                    rule("show_work_period", 1),
                    rule("show_triggers", 1),
                    rule("yaxismax", 100.0),
                    rule("yaxismin", 0.0),
                    rule("ymax_type", 0),
                    rule("ymin_type", 0),
                    rule("ymin_item_1", 0),
                    rule("ymax_item_1", 0),
                ],
            ),
            scope(
                "graph_item",
                vec![
                    rule("calc_fnc", 2),
                    rule("drawtype", 0),
                    rule("sortorder", 0),
                    rule("type", 0),
                    rule("yaxisside", 0),
                ],
            ),
            scope(
                "trigger",
                vec![
                    rule("priority", 0),
                    rule("state", 0),
                    rule("status", 0),
                    rule("type", 0),
                    rule("value", 0),
                ],
            ),
            scope(
                "discovery_rule",
                vec![
                    rule("authtype", 0),
                    rule("lifetime", 30),
                    rule("snmpv3_authprotocol", 0),
                    rule("snmpv3_privprotocol", 0),
                    rule("state", 0),
                    rule("status", 0),
                ],
            ),
        ])
    }

    pub fn push(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        self.rules.push(DefaultRule::new(path, value));
    }

    pub fn extend(&mut self, rules: impl IntoIterator<Item = DefaultRule>) {
        self.rules.extend(rules);
    }

    pub fn iter(&self) -> impl Iterator<Item = &DefaultRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Remove every node matched by a rule whose text equals the rule's value.
    ///
    /// For a path `a/b/c` every `a` node in the tree, the root included, is a
    /// starting point; `c` children of the `a/b` nodes below it are removed.
    pub fn prune(&self, root: &mut Node) {
        for rule in &self.rules {
            let segments = rule.segments();
            let Some((leaf, parents)) = segments.split_last() else {
                continue;
            };
            prune_from(root, parents, leaf, &rule.value.render());
        }
    }
}

impl FromIterator<DefaultRule> for DefaultRules {
    fn from_iter<I: IntoIterator<Item = DefaultRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

fn prune_from(node: &mut Node, parents: &[&str], leaf: &str, text: &str) {
    match parents.split_first() {
        None => remove_matching(node, leaf, text),
        Some((first, rest)) if node.tag == *first => walk(node, rest, leaf, text),
        Some(_) => {}
    }
    for child in &mut node.children {
        prune_from(child, parents, leaf, text);
    }
}

fn walk(node: &mut Node, rest: &[&str], leaf: &str, text: &str) {
    match rest.split_first() {
        None => remove_matching(node, leaf, text),
        Some((next, rest)) => {
            for child in node.children.iter_mut().filter(|child| child.tag == *next) {
                walk(child, rest, leaf, text);
            }
        }
    }
}

fn remove_matching(node: &mut Node, leaf: &str, text: &str) {
    node.retain_children(|child| !(child.tag == leaf && child.children.is_empty() && child.text.as_deref() == Some(text)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_flatten_into_paths() {
        let rules = DefaultRules::from_entries(vec![scope(
            "host",
            vec![rule("status", 0), scope("inventory", vec![rule("inventory_mode", 0)])],
        )]);
        let paths: Vec<_> = rules.iter().map(|rule| rule.path.as_str()).collect();
        assert_eq!(paths, vec!["host/status", "host/inventory/inventory_mode"]);
    }

    #[test]
    fn prune_only_removes_matching_text() {
        let mut root = Node::new("items")
            .with_child(Node::new("item").with_child(Node::leaf("history", "7")))
            .with_child(Node::new("item").with_child(Node::leaf("history", "30")));
        DefaultRules::standard().prune(&mut root);
        assert!(root.children[0].child("history").is_none());
        assert_eq!(root.children[1].text_at("history"), Some("30"));
    }

    #[test]
    fn prune_matches_the_root_and_nested_scopes() {
        let mut root = Node::new("host")
            .with_child(Node::leaf("status", "0"))
            .with_child(Node::new("inventory").with_child(Node::leaf("inventory_mode", "0")));
        DefaultRules::standard().prune(&mut root);
        assert!(root.child("status").is_none());
        assert!(root.find("inventory/inventory_mode").is_none());
    }

    #[test]
    fn dotted_paths_are_accepted() {
        let mut rules = DefaultRules::new();
        rules.push("graph.width", 900);
        let mut root = Node::new("graph").with_child(Node::leaf("width", "900"));
        rules.prune(&mut root);
        assert!(root.children.is_empty());
    }
}
