use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::errors::{ConfigError, ConfigResult, ValidationError};
use crate::model::{Entity, WeakEntity};
use crate::registry::ModelRef;
use crate::types::{Identity, Input};

/// What a reference currently points at.
#[derive(Debug, Clone, Default)]
pub enum Binding {
    #[default]
    Unbound,
    Entity(Entity),
    Literal(Identity),
}

struct ReferenceInner {
    target: ModelRef,
    owner: WeakEntity,
    field: String,
    append_host: bool,
    binding: Binding,
}

/// A pointer to one entity of the target model, or a literal identity.
#[derive(Clone)]
pub struct Reference(Rc<RefCell<ReferenceInner>>);

impl Reference {
    pub(crate) fn attached(target: ModelRef, owner: WeakEntity, field: &str, append_host: bool) -> Self {
        Reference(Rc::new(RefCell::new(ReferenceInner {
            target,
            owner,
            field: field.to_string(),
            append_host,
            binding: Binding::Unbound,
        })))
    }

    pub fn target(&self) -> ModelRef {
        self.0.borrow().target.clone()
    }

    pub fn append_host(&self) -> bool {
        self.0.borrow().append_host
    }

    pub fn binding(&self) -> Binding {
        self.0.borrow().binding.clone()
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self.0.borrow().binding, Binding::Unbound)
    }

    /// Check an input and turn it into a binding without applying it.
    pub(crate) fn coerce(&self, input: Input) -> ConfigResult<Binding> {
        let target = self.target();
        match input {
            Input::Null => Ok(Binding::Unbound),
            Input::Entity(entity) if entity.model().is_a(&target) => Ok(Binding::Entity(entity)),
            Input::Map(fields) => {
                let mut identity = Identity::new();
                for (key, value) in fields {
                    match value {
                        Input::Value(value) => identity.insert(key, value),
                        other => return Err(self.rejected(&format!("{key} = {}", other.describe()))),
                    }
                }
                Ok(Binding::Literal(identity))
            }
            other => Err(self.rejected(&other.describe())),
        }
    }

    fn rejected(&self, value: &str) -> ConfigError {
        let inner = self.0.borrow();
        let owner = Entity::from_weak(&inner.owner).map_or_else(|| inner.target.name().to_string(), |owner| owner.model_name());
        ConfigError::invalid_value(
            &owner,
            &inner.field,
            ValidationError::new(
                "reference",
                format!("{value} is neither a {} nor a literal identity", inner.target.name()),
            ),
        )
    }

    /// Point at an entity or a literal identity; `Input::Null` unbinds.
    pub fn bind(&self, input: impl Into<Input>) -> ConfigResult<()> {
        let binding = self.coerce(input.into())?;
        self.rebind(binding);
        Ok(())
    }

    pub(crate) fn rebind(&self, binding: Binding) {
        self.0.borrow_mut().binding = binding;
    }

    pub fn clear(&self) {
        self.rebind(Binding::Unbound);
    }

    /// Serialized identity of the target. Literal identities are returned as
    /// given; append-host references fill a missing `host` from the owner.
    pub fn resolve(&self) -> ConfigResult<Identity> {
        let (binding, owner, field, append_host) = {
            let inner = self.0.borrow();
            (inner.binding.clone(), inner.owner.clone(), inner.field.clone(), inner.append_host)
        };
        let owner = Entity::from_weak(&owner);
        let mut identity = match binding {
            Binding::Entity(entity) => entity.identity()?,
            Binding::Literal(identity) => identity,
            Binding::Unbound => {
                return Err(ConfigError::DanglingReference {
                    model: owner.map_or_else(|| self.target().name().to_string(), |owner| owner.model_name()),
                    field,
                });
            }
        };
        if append_host && !identity.contains_key("host") {
            if let Some(host) = owner.as_ref().and_then(Entity::stamping_host) {
                if let Some(name) = host.get("name")? {
                    identity.insert("host", name);
                }
            }
        }
        Ok(identity)
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("Reference")
            .field("field", &inner.field)
            .field("target", &inner.target)
            .field("binding", &inner.binding)
            .finish()
    }
}
