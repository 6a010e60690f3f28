//! Field declarations.
//!
//! A [`Field`] is what a model declares for each attribute: its kind, default,
//! allowed choices and validator chain. Declarations name related models by
//! string; the [`crate::registry::SchemaBuilder`] resolves those names once
//! the whole catalogue is known.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::Value;
use crate::validators::{Choice, MinValidator, Validator};

/// Process-wide declaration counter. Attribute tables are ordered by it.
static DECLARATION_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_position() -> u64 {
    DECLARATION_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// What kind of attribute a field backs.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A plain scalar value.
    Scalar,
    /// A scalar with a lower bound, e.g. a grid's column count.
    FixedSize { min: i64 },
    /// A derived size: `ceil(count(items_field) / size_field)` when not set explicitly.
    Elastic { size_field: String, items_field: String },
    /// A colour drawn from the compiler's palette when unset.
    Color,
    /// A collection of `model` entities.
    Set {
        model: String,
        allow_empty: bool,
        tag: Option<String>,
    },
    /// A pointer to one `model` entity or a literal identity.
    Reference { model: String, append_host: bool },
}

impl FieldKind {
    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldKind::Set { .. } | FieldKind::Reference { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Scalar => "scalar",
            FieldKind::FixedSize { .. } => "fixed-size",
            FieldKind::Elastic { .. } => "elastic",
            FieldKind::Color => "color",
            FieldKind::Set { .. } => "set",
            FieldKind::Reference { .. } => "reference",
        }
    }
}

/// A field declaration.
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) position: u64,
    pub(crate) kind: FieldKind,
    pub(crate) default: Option<Value>,
    pub(crate) choices: Vec<Choice>,
    pub(crate) validators: Vec<Validator>,
    pub(crate) description: Option<String>,
}

impl Field {
    fn with_kind(kind: FieldKind) -> Self {
        Self {
            position: next_position(),
            kind,
            default: None,
            choices: Vec::new(),
            validators: Vec::new(),
            description: None,
        }
    }

    /// A plain scalar field with no default.
    pub fn new() -> Self {
        Self::with_kind(FieldKind::Scalar)
    }

    /// A scalar field validated with a lower bound. Defaults to `min`.
    pub fn fixed_size(min: i64) -> Self {
        let mut field = Self::with_kind(FieldKind::FixedSize { min });
        field.validators.push(Validator::Min(MinValidator::new(min)));
        field.default = Some(Value::Int(min));
        field
    }

    /// A size derived from the number of entries in `items_field` laid out
    /// `size_field` per row.
    pub fn elastic(size_field: impl Into<String>, items_field: impl Into<String>) -> Self {
        Self::with_kind(FieldKind::Elastic {
            size_field: size_field.into(),
            items_field: items_field.into(),
        })
    }

    pub fn color() -> Self {
        Self::with_kind(FieldKind::Color)
    }

    /// A collection of entities of the named model.
    pub fn set(model: impl Into<String>) -> Self {
        Self::with_kind(FieldKind::Set {
            model: model.into(),
            allow_empty: false,
            tag: None,
        })
    }

    /// A reference to one entity of the named model.
    pub fn reference(model: impl Into<String>) -> Self {
        Self::with_kind(FieldKind::Reference {
            model: model.into(),
            append_host: false,
        })
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn choices<C: Into<Value> + Copy>(mut self, pairs: &[(C, &str)]) -> Self {
        self.choices = pairs.iter().map(|(code, label)| Choice::new(*code, *label)).collect();
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Emit the collection even when it has no members.
    pub fn allow_empty(mut self) -> Self {
        if let FieldKind::Set { allow_empty, .. } = &mut self.kind {
            *allow_empty = true;
        }
        self
    }

    /// Override the element tag used for collection members.
    pub fn tag(mut self, element_tag: impl Into<String>) -> Self {
        if let FieldKind::Set { tag, .. } = &mut self.kind {
            *tag = Some(element_tag.into());
        }
        self
    }

    /// Stamp the referencing entity's host into resolved identities.
    pub fn append_host(mut self) -> Self {
        if let FieldKind::Reference { append_host, .. } = &mut self.kind {
            *append_host = true;
        }
        self
    }

    /// This declaration as an override of `inherited`: it takes the inherited
    /// position and, for the same kind, any default, choices or validators it
    /// does not declare itself.
    pub(crate) fn override_of(mut self, inherited: &Field) -> Self {
        self.position = inherited.position;
        if self.kind == inherited.kind {
            if self.default.is_none() {
                self.default = inherited.default.clone();
            }
            if self.choices.is_empty() {
                self.choices = inherited.choices.clone();
            }
            if self.validators.is_empty() {
                self.validators = inherited.validators.clone();
            }
        }
        if self.description.is_none() {
            self.description = inherited.description.clone();
        }
        self
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn position(&self) -> u64 {
        self.position
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_are_numbered_in_order() {
        let first = Field::new();
        let second = Field::set("Item");
        let third = Field::color();
        assert!(first.position() < second.position());
        assert!(second.position() < third.position());
    }

    #[test]
    fn overrides_inherit_what_they_leave_out() {
        let parent = Field::new()
            .default(2)
            .choices(&[(2, "Trapper"), (4, "SNMPv2")])
            .describe("Item type");
        let child = Field::new().default("SNMPv2").override_of(&parent);
        assert_eq!(child.position(), parent.position());
        assert_eq!(child.default, Some(Value::from("SNMPv2")));
        assert_eq!(child.choices.len(), 2);
        assert_eq!(child.description.as_deref(), Some("Item type"));

        let replaced = Field::set("Item").override_of(&parent);
        assert!(replaced.choices.is_empty());
        assert_eq!(replaced.default, None);
    }

    #[test]
    fn fixed_size_defaults_to_minimum() {
        let field = Field::fixed_size(1);
        assert_eq!(field.default, Some(Value::Int(1)));
        assert_eq!(field.validators.len(), 1);
        let field = Field::fixed_size(1).default(3);
        assert_eq!(field.default, Some(Value::Int(3)));
    }

    #[test]
    fn modifiers_only_touch_matching_kinds() {
        let field = Field::new().allow_empty().append_host();
        assert_eq!(field.kind(), &FieldKind::Scalar);
        let field = Field::set("Item").allow_empty().tag("item_prototype");
        assert_eq!(
            field.kind(),
            &FieldKind::Set {
                model: "Item".into(),
                allow_empty: true,
                tag: Some("item_prototype".into()),
            }
        );
    }
}
