//! Compile an entity graph into the export tree.
//!
//! Compilation runs in three phases: every field is mapped to a node in table
//! order, nodes equal to a default rule are pruned, and document roots get
//! their cross-cutting rewrites (hoisting graphs and triggers, rolling up
//! groups and applications).

pub mod defaults;
pub mod rewrite;
pub mod split;
pub mod tree;
pub mod xml;

use chrono::{Local, NaiveDateTime, Timelike};
use log::debug;

use crate::collection::Collection;
use crate::errors::ConfigResult;
use crate::fields::FieldKind;
use crate::model::{Entity, Slot};
use crate::palette::ColorPalette;
use crate::registry::{Arrangement, FieldSchema};
use crate::types::Value;

pub use defaults::{DefaultRule, DefaultRules};
pub use split::{Fragment, FragmentKind, split};
pub use tree::Node;

/// Version string written into document headers.
pub const EXPORT_VERSION: &str = "2.0";

/// Tag of a compiled document root.
pub const ROOT_TAG: &str = "zabbix_export";

/// `YYYY-MM-DDTHH:MM:SS`, followed by `.ffffff` only when there are microseconds.
fn isoformat(captured: &NaiveDateTime) -> String {
    let seconds = captured.format("%Y-%m-%dT%H:%M:%S");
    match captured.nanosecond() / 1_000 {
        0 => seconds.to_string(),
        micros => format!("{seconds}.{micros:06}"),
    }
}

/// Turns entities into [`Node`] trees and XML text.
#[derive(Debug, Clone)]
pub struct Compiler {
    rules: DefaultRules,
    palette: ColorPalette,
    version: String,
    timestamp: Option<NaiveDateTime>,
    indent: usize,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            rules: DefaultRules::standard(),
            palette: ColorPalette::default(),
            version: EXPORT_VERSION.to_string(),
            timestamp: None,
            indent: xml::DEFAULT_INDENT,
        }
    }

    pub fn with_rules(mut self, rules: DefaultRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_palette(mut self, palette: ColorPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Pin the header timestamp for reproducible output.
    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn rules(&self) -> &DefaultRules {
        &self.rules
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    /// Header nodes of a document: version and capture time.
    pub fn header(&self) -> Vec<Node> {
        let captured = self.timestamp.unwrap_or_else(|| Local::now().naive_local());
        vec![
            Node::leaf("version", self.version.clone()),
            Node::leaf("date", isoformat(&captured)),
        ]
    }

    /// Compile `entity` into a tree. Document roots get the header and the
    /// document rewrites; any other entity compiles to its own element.
    /// Unset colours are drawn from the start of the palette on every call.
    pub fn compile(&mut self, entity: &Entity) -> ConfigResult<Node> {
        self.palette.reset();
        let document = entity.is_document();
        let mut root = Node::new(if document { ROOT_TAG.to_string() } else { entity.model().tag().to_string() });
        if document {
            root.children.extend(self.header());
        }

        self.map_entity(entity, &mut root, &[])?;
        self.rules.prune(&mut root);

        if document {
            rewrite::hoist(&mut root, "graphs");
            rewrite::hoist(&mut root, "triggers");
            rewrite::rollup_groups(&mut root);
            rewrite::rollup_applications(&mut root);
            rewrite::order_root(&mut root);
        }
        debug!("compiled {entity:?} into {} root nodes", root.children.len());
        Ok(root)
    }

    /// Compile and serialize to XML text.
    pub fn render(&mut self, entity: &Entity) -> ConfigResult<String> {
        let root = self.compile(entity)?;
        xml::dumps_with_indent(&root, self.indent)
    }

    /// Compile a document and cut it into import fragments.
    pub fn fragments(&mut self, entity: &Entity) -> ConfigResult<Vec<Fragment>> {
        let root = self.compile(entity)?;
        Ok(split(&root))
    }

    pub fn dumps(&self, node: &Node) -> ConfigResult<String> {
        xml::dumps_with_indent(node, self.indent)
    }

    fn map_entity(&mut self, entity: &Entity, node: &mut Node, overrides: &[(&str, Value)]) -> ConfigResult<()> {
        let model = entity.model();
        let schema = model.schema();
        let arrangement = schema.arrangement.as_ref();
        let mut arranged = None;

        for (index, field) in schema.fields.iter().enumerate() {
            if arrangement.is_some_and(|arrangement| arrangement.items() == field.name) {
                arranged = Some(index);
                continue;
            }
            self.map_field(entity, index, field, node, overrides)?;
        }

        if let (Some(index), Some(arrangement)) = (arranged, arrangement) {
            if let Slot::Set(collection) = entity.slot(index) {
                let overrides = self.arrange(entity, arrangement, &collection)?;
                self.map_collection(&schema.fields[index], &collection, node, &overrides)?;
            }
        }
        Ok(())
    }

    fn map_field(
        &mut self,
        entity: &Entity,
        index: usize,
        field: &FieldSchema,
        node: &mut Node,
        overrides: &[(&str, Value)],
    ) -> ConfigResult<()> {
        match entity.slot(index) {
            Slot::Reference(reference) => {
                let mut child = Node::new(field.name.as_str());
                for (key, value) in reference.resolve()?.iter() {
                    child.push(Node::leaf(key, value.render()));
                }
                node.push(child);
            }
            Slot::Set(collection) => self.map_collection(field, &collection, node, &[])?,
            Slot::Scalar(_) => {
                let value = match overrides.iter().find(|(name, _)| *name == field.name) {
                    Some((_, value)) => Some(value.clone()),
                    None => entity.read(index, Some(&mut self.palette))?,
                };
                if let Some(value) = value {
                    node.push(Node::leaf(field.name.as_str(), value.render()));
                }
            }
        }
        Ok(())
    }

    fn map_collection(
        &mut self,
        field: &FieldSchema,
        collection: &Collection,
        node: &mut Node,
        overrides: &[Vec<(&str, Value)>],
    ) -> ConfigResult<()> {
        if collection.is_empty() && !collection.allow_empty() {
            return Ok(());
        }
        let element_tag = match &field.kind {
            FieldKind::Set { tag, .. } => tag.clone(),
            _ => None,
        };
        let mut container = Node::new(field.name.as_str());
        for (position, member) in collection.members().iter().enumerate() {
            let tag = element_tag.clone().unwrap_or_else(|| member.model().tag().to_string());
            let mut child = Node::new(tag);
            let member_overrides = overrides.get(position).map(Vec::as_slice).unwrap_or(&[]);
            self.map_entity(member, &mut child, member_overrides)?;
            container.push(child);
        }
        node.push(container);
        Ok(())
    }

    /// Per-member field overrides produced by an arrangement.
    fn arrange<'a>(
        &self,
        entity: &Entity,
        arrangement: &'a Arrangement,
        collection: &Collection,
    ) -> ConfigResult<Vec<Vec<(&'a str, Value)>>> {
        let count = collection.len();
        match arrangement {
            Arrangement::Sequence { position, .. } => Ok((0..count)
                .map(|index| vec![(position.as_str(), Value::from(index))])
                .collect()),
            Arrangement::Grid { columns, x, y, .. } => {
                let per_row = entity
                    .get(columns)?
                    .and_then(|value| value.as_i64())
                    .unwrap_or(1)
                    .max(1) as usize;
                Ok((0..count)
                    .map(|index| {
                        vec![
                            (x.as_str(), Value::from(index % per_row)),
                            (y.as_str(), Value::from(index / per_row)),
                        ]
                    })
                    .collect())
            }
        }
    }
}
