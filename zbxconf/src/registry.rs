//! Model declarations and the resolved schema registry.
//!
//! Models are declared with symbolic type names through [`SchemaBuilder`].
//! [`SchemaBuilder::build`] resolves every name to an index, merges inherited
//! fields, validates declared defaults and produces an immutable [`Registry`]
//! shared behind an [`Arc`]. [`ModelRef`] is a cheap handle to one model.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::errors::{ConfigError, ConfigResult, SchemaError};
use crate::fields::{Field, FieldKind};
use crate::model::Entity;
use crate::types::{Fields, Input, Value};
use crate::validators::{Choice, ChoiceValidator, Validator, run_chain};

/// Hook run on the raw field mapping before an entity is hydrated.
pub type Prepare = fn(&mut Fields) -> ConfigResult<()>;

/// Which attribute identifies an entity when it is the target of a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceShape {
    /// Field read from the target.
    pub field: String,
    /// Key written into the resolved identity.
    pub key: String,
}

/// A layout the compiler applies to a collection while mapping it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arrangement {
    /// Number members by position: `position = index`.
    Sequence { items: String, position: String },
    /// Lay members out row by row, `columns` per row.
    Grid {
        items: String,
        columns: String,
        x: String,
        y: String,
    },
}

impl Arrangement {
    pub fn items(&self) -> &str {
        match self {
            Arrangement::Sequence { items, .. } | Arrangement::Grid { items, .. } => items,
        }
    }
}

/// A model declaration.
#[derive(Debug, Clone)]
pub struct ModelDecl {
    name: String,
    tag: Option<String>,
    extends: Option<String>,
    fields: Vec<(String, Field)>,
    identity: Option<Vec<String>>,
    positional: Option<String>,
    reference: Option<ReferenceShape>,
    host_scope: Option<bool>,
    document: bool,
    prepare: Option<Prepare>,
    arrangement: Option<Arrangement>,
}

impl ModelDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            extends: None,
            fields: Vec::new(),
            identity: None,
            positional: None,
            reference: None,
            host_scope: None,
            document: false,
            prepare: None,
            arrangement: None,
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    /// Fields whose values define equality between instances.
    pub fn identity(mut self, fields: &[&str]) -> Self {
        self.identity = Some(fields.iter().map(|field| field.to_string()).collect());
        self
    }

    /// Field filled by a bare positional constructor argument.
    pub fn positional(mut self, field: impl Into<String>) -> Self {
        self.positional = Some(field.into());
        self
    }

    /// Make instances referenceable, identified by `field`.
    pub fn referenced_by(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.reference = Some(ReferenceShape {
            key: field.clone(),
            field,
        });
        self
    }

    /// Mark the model as a host scope (hosts and templates).
    pub fn host_scope(mut self) -> Self {
        self.host_scope = Some(true);
        self
    }

    /// Mark the model as a document root.
    pub fn document(mut self) -> Self {
        self.document = true;
        self
    }

    pub fn prepare(mut self, hook: Prepare) -> Self {
        self.prepare = Some(hook);
        self
    }

    pub fn arrange(mut self, arrangement: Arrangement) -> Self {
        self.arrangement = Some(arrangement);
        self
    }
}

/// A resolved field of a model.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: String,
    pub position: u64,
    pub kind: FieldKind,
    /// Target model index for set and reference fields.
    pub(crate) target: Option<usize>,
    pub default: Option<Value>,
    pub choices: Vec<Choice>,
    pub description: Option<String>,
    /// Declared validators followed by the choice validator, if any.
    pub(crate) validators: Vec<Validator>,
}

impl FieldSchema {
    pub fn validate(&self, value: Value) -> Result<Value, crate::errors::ValidationError> {
        run_chain(&self.validators, value)
    }

    pub fn validator_names(&self) -> Vec<&'static str> {
        self.validators.iter().map(Validator::name).collect()
    }
}

/// A resolved model: merged, ordered field table plus model-level behaviour.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    pub name: String,
    pub tag: String,
    pub fields: Vec<FieldSchema>,
    pub identity: Vec<String>,
    pub positional: Option<String>,
    pub reference: Option<ReferenceShape>,
    pub host_scope: bool,
    pub document: bool,
    pub arrangement: Option<Arrangement>,
    pub(crate) prepare: Vec<Prepare>,
    /// This model first, then its ancestors.
    pub(crate) lineage: Vec<usize>,
    index: HashMap<String, usize>,
}

impl ModelSchema {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.field_index(name).map(|index| &self.fields[index])
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}

/// An immutable set of resolved models.
#[derive(Debug)]
pub struct Registry {
    models: Vec<ModelSchema>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    /// Look up a model by name.
    pub fn model(self: &Arc<Self>, name: &str) -> ConfigResult<ModelRef> {
        let index = *self
            .by_name
            .get(name)
            .ok_or_else(|| ConfigError::UnknownModel(name.to_string()))?;
        Ok(ModelRef {
            registry: Arc::clone(self),
            index,
        })
    }

    /// Every model in declaration order.
    pub fn models(self: &Arc<Self>) -> Vec<ModelRef> {
        (0..self.models.len())
            .map(|index| ModelRef {
                registry: Arc::clone(self),
                index,
            })
            .collect()
    }

    /// A default-initialised entity of the named model.
    pub fn instantiate(self: &Arc<Self>, name: &str) -> ConfigResult<Entity> {
        Ok(Entity::new(&self.model(name)?))
    }

    /// Construct and hydrate an entity of the named model.
    pub fn build(self: &Arc<Self>, name: &str, fields: Fields) -> ConfigResult<Entity> {
        Entity::build(&self.model(name)?, Input::Null, fields)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// A handle to one model of a registry.
#[derive(Clone)]
pub struct ModelRef {
    registry: Arc<Registry>,
    index: usize,
}

impl ModelRef {
    pub fn schema(&self) -> &ModelSchema {
        &self.registry.models[self.index]
    }

    pub fn name(&self) -> &str {
        &self.schema().name
    }

    pub fn tag(&self) -> &str {
        &self.schema().tag
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// True when `self` is `other` or one of its subtypes.
    pub fn is_a(&self, other: &ModelRef) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry) && self.schema().lineage.contains(&other.index)
    }

    pub(crate) fn related(&self, index: usize) -> ModelRef {
        ModelRef {
            registry: Arc::clone(&self.registry),
            index,
        }
    }
}

impl PartialEq for ModelRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry) && self.index == other.index
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collects declarations and resolves them into a [`Registry`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    decls: Vec<ModelDecl>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, decl: ModelDecl) -> Self {
        self.decls.push(decl);
        self
    }

    pub fn extend(mut self, decls: impl IntoIterator<Item = ModelDecl>) -> Self {
        self.decls.extend(decls);
        self
    }

    pub fn build(self) -> Result<Arc<Registry>, SchemaError> {
        let mut by_name = HashMap::new();
        for (index, decl) in self.decls.iter().enumerate() {
            if by_name.insert(decl.name.clone(), index).is_some() {
                return Err(SchemaError::DuplicateModel(decl.name.clone()));
            }
        }

        let mut models = Vec::with_capacity(self.decls.len());
        for (index, decl) in self.decls.iter().enumerate() {
            let lineage = self.lineage(index, &by_name)?;
            models.push(self.resolve(decl, lineage, &by_name)?);
        }
        debug!("built schema registry with {} models", models.len());

        Ok(Arc::new(Registry { models, by_name }))
    }

    fn lineage(&self, index: usize, by_name: &HashMap<String, usize>) -> Result<Vec<usize>, SchemaError> {
        let mut lineage = vec![index];
        let mut seen = HashSet::from([index]);
        let mut current = &self.decls[index];
        while let Some(parent) = &current.extends {
            let parent_index = *by_name.get(parent).ok_or_else(|| SchemaError::UnresolvedParent {
                model: current.name.clone(),
                parent: parent.clone(),
            })?;
            if !seen.insert(parent_index) {
                return Err(SchemaError::InheritanceCycle(self.decls[index].name.clone()));
            }
            lineage.push(parent_index);
            current = &self.decls[parent_index];
        }
        Ok(lineage)
    }

    /// First value of a model-level attribute along the lineage.
    fn inherited<T: Clone>(&self, lineage: &[usize], pick: impl Fn(&ModelDecl) -> Option<T>) -> Option<T> {
        lineage.iter().find_map(|index| pick(&self.decls[*index]))
    }

    fn resolve(
        &self,
        decl: &ModelDecl,
        lineage: Vec<usize>,
        by_name: &HashMap<String, usize>,
    ) -> Result<ModelSchema, SchemaError> {
        // Root ancestor first so overrides replace inherited entries in place.
        let mut merged: Vec<(String, Field)> = Vec::new();
        for index in lineage.iter().rev() {
            for (name, field) in &self.decls[*index].fields {
                match merged.iter_mut().find(|(existing, _)| existing == name) {
                    Some(entry) => entry.1 = field.clone().override_of(&entry.1),
                    None => merged.push((name.clone(), field.clone())),
                }
            }
        }
        merged.sort_by_key(|(_, field)| field.position);

        let names: HashSet<&str> = merged.iter().map(|(name, _)| name.as_str()).collect();
        let mut fields = Vec::with_capacity(merged.len());
        for (name, field) in &merged {
            fields.push(self.resolve_field(decl, name, field, &names, by_name)?);
        }
        let index = fields
            .iter()
            .enumerate()
            .map(|(position, field)| (field.name.clone(), position))
            .collect();

        let prepare = lineage
            .iter()
            .rev()
            .filter_map(|index| self.decls[*index].prepare)
            .collect();

        Ok(ModelSchema {
            name: decl.name.clone(),
            tag: self
                .inherited(&lineage, |decl| decl.tag.clone())
                .unwrap_or_else(|| decl.name.to_lowercase()),
            fields,
            identity: self.inherited(&lineage, |decl| decl.identity.clone()).unwrap_or_default(),
            positional: self.inherited(&lineage, |decl| decl.positional.clone()),
            reference: self.inherited(&lineage, |decl| decl.reference.clone()),
            host_scope: self.inherited(&lineage, |decl| decl.host_scope).unwrap_or(false),
            document: decl.document,
            arrangement: self.inherited(&lineage, |decl| decl.arrangement.clone()),
            prepare,
            lineage,
            index,
        })
    }

    fn resolve_field(
        &self,
        decl: &ModelDecl,
        name: &str,
        field: &Field,
        siblings: &HashSet<&str>,
        by_name: &HashMap<String, usize>,
    ) -> Result<FieldSchema, SchemaError> {
        let unresolved = |target: &str| SchemaError::UnresolvedType {
            model: decl.name.clone(),
            field: name.to_string(),
            target: target.to_string(),
        };
        let target = match &field.kind {
            FieldKind::Set { model, .. } | FieldKind::Reference { model, .. } => {
                Some(*by_name.get(model).ok_or_else(|| unresolved(model))?)
            }
            FieldKind::Elastic {
                size_field,
                items_field,
            } => {
                for sibling in [size_field, items_field] {
                    if !siblings.contains(sibling.as_str()) {
                        return Err(SchemaError::UnknownSibling {
                            model: decl.name.clone(),
                            field: name.to_string(),
                            target: sibling.clone(),
                        });
                    }
                }
                None
            }
            _ => None,
        };

        let mut validators = field.validators.clone();
        if !field.choices.is_empty() {
            validators.push(Validator::Choice(ChoiceValidator::new(field.choices.clone())));
        }

        let default = match &field.default {
            Some(value) => Some(run_chain(&validators, value.clone()).map_err(|source| {
                SchemaError::InvalidDefault {
                    model: decl.name.clone(),
                    field: name.to_string(),
                    source,
                }
            })?),
            None => None,
        };

        Ok(FieldSchema {
            name: name.to_string(),
            position: field.position,
            kind: field.kind.clone(),
            target,
            default,
            choices: field.choices.clone(),
            description: field.description.clone(),
            validators,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_keep_inherited_position() {
        let registry = SchemaBuilder::new()
            .model(
                ModelDecl::new("Base")
                    .field("a", Field::new())
                    .field("b", Field::new())
                    .field("c", Field::new()),
            )
            .model(
                ModelDecl::new("Derived")
                    .extends("Base")
                    .field("d", Field::new())
                    .field("a", Field::new().default(1)),
            )
            .build()
            .expect("schema builds");
        let derived = registry.model("Derived").expect("declared");
        assert_eq!(derived.schema().field_names().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
        assert_eq!(derived.schema().fields[0].default, Some(Value::Int(1)));
        assert_eq!(derived.tag(), "derived");
        assert!(derived.is_a(&registry.model("Base").expect("declared")));
    }

    #[test]
    fn overridden_defaults_go_through_inherited_choices() {
        let registry = SchemaBuilder::new()
            .model(ModelDecl::new("Item").field(
                "type",
                Field::new().default(2).choices(&[(2, "Trapper"), (4, "SNMPv2")]),
            ))
            .model(ModelDecl::new("SnmpItem").extends("Item").field("type", Field::new().default("SNMPv2")))
            .build()
            .expect("schema builds");
        let snmp = registry.model("SnmpItem").expect("declared");
        let field = snmp.schema().field("type").expect("inherited field");
        assert_eq!(field.default, Some(Value::Int(4)));
        assert_eq!(field.choices.len(), 2);

        let err = SchemaBuilder::new()
            .model(ModelDecl::new("Item").field("type", Field::new().choices(&[(2, "Trapper")])))
            .model(ModelDecl::new("SnmpItem").extends("Item").field("type", Field::new().default("SNMPv9")))
            .build()
            .expect_err("not a choice");
        assert!(matches!(err, SchemaError::InvalidDefault { ref model, .. } if model == "SnmpItem"));
    }

    #[test]
    fn unresolved_names_fail_the_build() {
        let err = SchemaBuilder::new()
            .model(ModelDecl::new("Host").field("items", Field::set("Item")))
            .build()
            .expect_err("Item is missing");
        assert!(matches!(err, SchemaError::UnresolvedType { ref target, .. } if target == "Item"));

        let err = SchemaBuilder::new()
            .model(ModelDecl::new("Host").extends("Entity"))
            .build()
            .expect_err("Entity is missing");
        assert!(matches!(err, SchemaError::UnresolvedParent { .. }));
    }

    #[test]
    fn cycles_and_duplicates_are_rejected() {
        let err = SchemaBuilder::new()
            .model(ModelDecl::new("A").extends("B"))
            .model(ModelDecl::new("B").extends("A"))
            .build()
            .expect_err("cycle");
        assert!(matches!(err, SchemaError::InheritanceCycle(_)));

        let err = SchemaBuilder::new()
            .model(ModelDecl::new("A"))
            .model(ModelDecl::new("A"))
            .build()
            .expect_err("duplicate");
        assert!(matches!(err, SchemaError::DuplicateModel(name) if name == "A"));
    }

    #[test]
    fn defaults_are_validated_and_normalized() {
        let registry = SchemaBuilder::new()
            .model(ModelDecl::new("Item").field(
                "status",
                Field::new().default("disabled").choices(&[(0, "enabled"), (1, "disabled")]),
            ))
            .build()
            .expect("schema builds");
        let item = registry.model("Item").expect("declared");
        assert_eq!(item.schema().fields[0].default, Some(Value::Int(1)));

        let err = SchemaBuilder::new()
            .model(ModelDecl::new("Screen").field("hsize", Field::fixed_size(1).default(0)))
            .build()
            .expect_err("below minimum");
        assert!(matches!(err, SchemaError::InvalidDefault { .. }));
    }

    #[test]
    fn elastic_fields_need_siblings() {
        let err = SchemaBuilder::new()
            .model(ModelDecl::new("Screen").field("vsize", Field::elastic("hsize", "screen_items")))
            .build()
            .expect_err("siblings missing");
        assert!(matches!(err, SchemaError::UnknownSibling { .. }));
    }
}
