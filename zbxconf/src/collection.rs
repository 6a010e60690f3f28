use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::debug;

use crate::errors::{ConfigError, ConfigResult};
use crate::model::{Entity, WeakEntity};
use crate::registry::ModelRef;
use crate::types::{Fields, Input};

struct CollectionInner {
    element: ModelRef,
    owner: WeakEntity,
    field: String,
    allow_empty: bool,
    tag: Option<String>,
    members: Vec<Entity>,
}

/// An ordered, duplicate-rejecting set of entities of one element model.
///
/// Members point back at the collection, and the collection at its owning
/// entity, which is what [`Entity::ancestors`] walks.
#[derive(Clone)]
pub struct Collection(Rc<RefCell<CollectionInner>>);

#[derive(Clone)]
pub(crate) struct WeakCollection(Weak<RefCell<CollectionInner>>);

impl WeakCollection {
    pub(crate) fn upgrade(&self) -> Option<Collection> {
        self.0.upgrade().map(Collection)
    }
}

impl Collection {
    pub(crate) fn attached(
        element: ModelRef,
        owner: WeakEntity,
        field: &str,
        allow_empty: bool,
        tag: Option<String>,
    ) -> Self {
        Collection(Rc::new(RefCell::new(CollectionInner {
            element,
            owner,
            field: field.to_string(),
            allow_empty,
            tag,
            members: Vec::new(),
        })))
    }

    pub(crate) fn downgrade(&self) -> WeakCollection {
        WeakCollection(Rc::downgrade(&self.0))
    }

    pub fn element(&self) -> ModelRef {
        self.0.borrow().element.clone()
    }

    pub fn owner(&self) -> Option<Entity> {
        Entity::from_weak(&self.0.borrow().owner)
    }

    pub fn field(&self) -> String {
        self.0.borrow().field.clone()
    }

    pub fn allow_empty(&self) -> bool {
        self.0.borrow().allow_empty
    }

    /// Tag override for members, if the field declares one.
    pub fn tag(&self) -> Option<String> {
        self.0.borrow().tag.clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().members.is_empty()
    }

    /// Members in insertion order.
    pub fn members(&self) -> Vec<Entity> {
        self.0.borrow().members.clone()
    }

    pub fn get(&self, index: usize) -> Option<Entity> {
        self.0.borrow().members.get(index).cloned()
    }

    pub fn contains(&self, entity: &Entity) -> bool {
        self.0.borrow().members.iter().any(|member| member.same_identity(entity))
    }

    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Turn an input into an entity of the element model without attaching it.
    ///
    /// Mappings hydrate a new entity, bare values go through the positional
    /// constructor, and entities are type-checked.
    pub(crate) fn coerce(&self, input: Input) -> ConfigResult<Entity> {
        let element = self.element();
        let reject = |value: String, reason: String| ConfigError::invalid_element(element.name(), value, reason);
        match input {
            Input::Entity(entity) => {
                if entity.model().is_a(&element) {
                    Ok(entity)
                } else {
                    Err(reject(format!("{entity:?}"), format!("{} is not a {}", entity.model_name(), element.name())))
                }
            }
            Input::Map(fields) => {
                let described = Input::Map(fields.clone()).describe();
                Entity::build(&element, Input::Null, fields).map_err(|err| reject(described, err.to_string()))
            }
            Input::Value(value) => {
                let described = format!("{value:?}");
                Entity::build(&element, Input::Value(value), Fields::new()).map_err(|err| reject(described, err.to_string()))
            }
            other => Err(reject(other.describe(), "expected an entity, a mapping or a value".to_string())),
        }
    }

    /// Attach an already coerced entity. Returns the stored member.
    pub(crate) fn insert(&self, entity: Entity) -> Entity {
        let entity = match entity.parent() {
            Some(parent) if !parent.ptr_eq(self) => entity.duplicate(),
            _ => entity,
        };
        let existing = self
            .0
            .borrow()
            .members
            .iter()
            .find(|member| member.same_identity(&entity))
            .cloned();
        if let Some(existing) = existing {
            return existing;
        }
        entity.set_parent(Some(self));
        self.0.borrow_mut().members.push(entity.clone());
        entity
    }

    /// Coerce `candidate` and add it, unless an equal member exists. Returns
    /// the stored member, which is the existing one on a duplicate.
    pub fn add(&self, candidate: impl Into<Input>) -> ConfigResult<Entity> {
        let entity = self.coerce(candidate.into())?;
        let stored = self.insert(entity);
        debug!("{} holds {} members after adding {stored:?}", self.field(), self.len());
        Ok(stored)
    }

    /// Add every input in order. Nothing is added if any input is invalid.
    pub fn extend<I, T>(&self, candidates: I) -> ConfigResult<Vec<Entity>>
    where
        I: IntoIterator<Item = T>,
        T: Into<Input>,
    {
        let entities = candidates
            .into_iter()
            .map(|candidate| self.coerce(candidate.into()))
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(entities.into_iter().map(|entity| self.insert(entity)).collect())
    }

    /// Construct a member from a positional value plus fields and add it.
    pub fn new(&self, positional: impl Into<Input>, fields: Fields) -> ConfigResult<Entity> {
        let element = self.element();
        let entity = Entity::build(&element, positional, fields)?;
        Ok(self.insert(entity))
    }

    /// Construct a member from fields only and add it.
    pub fn create(&self, fields: Fields) -> ConfigResult<Entity> {
        self.new(Input::Null, fields)
    }

    /// Remove the member equal to `candidate`. Returns whether one was removed.
    pub fn discard(&self, candidate: impl Into<Input>) -> ConfigResult<bool> {
        let entity = self.coerce(candidate.into())?;
        let removed = {
            let mut inner = self.0.borrow_mut();
            let index = inner.members.iter().position(|member| member.same_identity(&entity));
            index.map(|index| inner.members.remove(index))
        };
        match removed {
            Some(member) => {
                member.set_parent(None);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove every member.
    pub fn clear(&self) {
        let members = std::mem::take(&mut self.0.borrow_mut().members);
        for member in members {
            member.set_parent(None);
        }
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("Collection")
            .field("field", &inner.field)
            .field("element", &inner.element)
            .field("members", &inner.members)
            .finish()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.members().into_iter()
    }
}
