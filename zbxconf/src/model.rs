//! Entities: instances of a resolved model.
//!
//! An [`Entity`] is a shared handle (`Rc<RefCell<..>>`) holding one slot per
//! field of its model's table, in table order. Set fields own a
//! [`Collection`], reference fields own a [`Reference`]; both keep a weak
//! link back to the entity so the owner chain can be walked upwards.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, warn};

use crate::collection::{Collection, WeakCollection};
use crate::errors::{ConfigError, ConfigResult, ValidationError};
use crate::fields::FieldKind;
use crate::palette::ColorPalette;
use crate::reference::{Binding, Reference};
use crate::registry::ModelRef;
use crate::types::{Fields, Identity, Input, Value};

/// Name field read from hosts and templates when stamping identities.
const HOST_NAME_FIELD: &str = "name";

#[derive(Clone)]
pub(crate) enum Slot {
    Scalar(Option<Value>),
    Set(Collection),
    Reference(Reference),
}

pub(crate) struct EntityInner {
    model: ModelRef,
    slots: Vec<Slot>,
    parent: Option<WeakCollection>,
}

pub(crate) type WeakEntity = Weak<RefCell<EntityInner>>;

/// A staged write, produced only after validation succeeded.
enum Change {
    Scalar(usize, Option<Value>),
    Members {
        collection: Collection,
        members: Vec<Entity>,
        replace: bool,
    },
    Bind(Reference, Binding),
}

/// A modeled object.
#[derive(Clone)]
pub struct Entity(Rc<RefCell<EntityInner>>);

impl Entity {
    /// A default-initialised entity with fresh collections and unbound references.
    pub fn new(model: &ModelRef) -> Self {
        let inner = Rc::new_cyclic(|owner: &WeakEntity| {
            let slots = model
                .schema()
                .fields
                .iter()
                .map(|field| match (&field.kind, field.target) {
                    (FieldKind::Set { allow_empty, tag, .. }, Some(target)) => Slot::Set(Collection::attached(
                        model.related(target),
                        owner.clone(),
                        &field.name,
                        *allow_empty,
                        tag.clone(),
                    )),
                    (FieldKind::Reference { append_host, .. }, Some(target)) => Slot::Reference(
                        Reference::attached(model.related(target), owner.clone(), &field.name, *append_host),
                    ),
                    _ => Slot::Scalar(field.default.clone()),
                })
                .collect();
            RefCell::new(EntityInner {
                model: model.clone(),
                slots,
                parent: None,
            })
        });
        Entity(inner)
    }

    /// Construct through the model's positional argument and preparation
    /// hooks, then hydrate with `fields`.
    pub fn build(model: &ModelRef, positional: impl Into<Input>, mut fields: Fields) -> ConfigResult<Self> {
        let schema = model.schema();
        let positional = positional.into();
        if !positional.is_null() {
            match &schema.positional {
                Some(name) => fields.insert(name.clone(), positional),
                None => {
                    return Err(ConfigError::invalid_element(
                        &schema.name,
                        positional.describe(),
                        "model takes no positional value",
                    ));
                }
            }
        }
        for hook in &schema.prepare {
            hook(&mut fields)?;
        }
        let entity = Entity::new(model);
        entity.update(fields)?;
        Ok(entity)
    }

    pub(crate) fn from_weak(weak: &WeakEntity) -> Option<Self> {
        weak.upgrade().map(Entity)
    }

    pub(crate) fn downgrade(&self) -> WeakEntity {
        Rc::downgrade(&self.0)
    }

    pub fn model(&self) -> ModelRef {
        self.0.borrow().model.clone()
    }

    pub fn model_name(&self) -> String {
        self.model().name().to_string()
    }

    pub fn is_document(&self) -> bool {
        self.model().schema().document
    }

    pub(crate) fn slot(&self, index: usize) -> Slot {
        self.0.borrow().slots[index].clone()
    }

    fn field_index(&self, model: &ModelRef, field: &str) -> ConfigResult<usize> {
        model
            .schema()
            .field_index(field)
            .ok_or_else(|| ConfigError::unknown_field(model.name(), field))
    }

    fn kind_mismatch(model: &ModelRef, index: usize, wanted: &str) -> ConfigError {
        let field = &model.schema().fields[index];
        ConfigError::invalid_value(
            model.name(),
            &field.name,
            ValidationError::new("kind", format!("{} is a {} field, not {wanted}", field.name, field.kind.label())),
        )
    }

    /// Current value of a scalar field. Elastic fields are computed; unset
    /// colour fields read as `None` outside of a compilation.
    pub fn get(&self, field: &str) -> ConfigResult<Option<Value>> {
        let model = self.model();
        let index = self.field_index(&model, field)?;
        self.read(index, None)
    }

    /// Like [`Entity::get`], drawing unset colours from `palette`.
    pub fn get_with(&self, field: &str, palette: &mut ColorPalette) -> ConfigResult<Option<Value>> {
        let model = self.model();
        let index = self.field_index(&model, field)?;
        self.read(index, Some(palette))
    }

    /// Rendered text of a scalar field, if set.
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).ok().flatten().map(|value| value.render())
    }

    pub(crate) fn read(&self, index: usize, palette: Option<&mut ColorPalette>) -> ConfigResult<Option<Value>> {
        let model = self.model();
        let stored = match self.slot(index) {
            Slot::Scalar(value) => value,
            _ => return Err(Self::kind_mismatch(&model, index, "a scalar")),
        };
        match &model.schema().fields[index].kind {
            FieldKind::Elastic {
                size_field,
                items_field,
            } => {
                if stored.as_ref().and_then(Value::as_i64).is_some_and(|size| size > 0) {
                    return Ok(stored);
                }
                let count = self.collection(items_field)?.len() as i64;
                let per_row = self
                    .get(size_field)?
                    .and_then(|value| value.as_i64())
                    .unwrap_or(1)
                    .max(1);
                Ok(Some(Value::Int(((count + per_row - 1) / per_row).max(1))))
            }
            FieldKind::Color if stored.is_none() => Ok(palette.map(|palette| Value::Text(palette.next_color()))),
            _ => Ok(stored),
        }
    }

    pub fn collection(&self, field: &str) -> ConfigResult<Collection> {
        let model = self.model();
        let index = self.field_index(&model, field)?;
        match self.slot(index) {
            Slot::Set(collection) => Ok(collection),
            _ => Err(Self::kind_mismatch(&model, index, "a set")),
        }
    }

    pub fn reference(&self, field: &str) -> ConfigResult<Reference> {
        let model = self.model();
        let index = self.field_index(&model, field)?;
        match self.slot(index) {
            Slot::Reference(reference) => Ok(reference),
            _ => Err(Self::kind_mismatch(&model, index, "a reference")),
        }
    }

    /// Assign one field. Set fields are cleared and refilled, references rebound.
    pub fn set(&self, field: &str, input: impl Into<Input>) -> ConfigResult<()> {
        let model = self.model();
        let index = self.field_index(&model, field)?;
        let change = self.stage(&model, index, input.into(), false)?;
        self.commit(change);
        Ok(())
    }

    /// Batch hydration. Every key is checked and every value validated
    /// before anything is written; set fields merge by adding.
    pub fn update(&self, fields: Fields) -> ConfigResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let model = self.model();
        for key in fields.keys() {
            self.field_index(&model, key)?;
        }
        let mut changes = Vec::with_capacity(fields.len());
        for (key, input) in fields {
            let index = self.field_index(&model, &key)?;
            changes.push(self.stage(&model, index, input, true)?);
        }
        debug!("hydrating {:?} with {} fields", self, changes.len());
        for change in changes {
            self.commit(change);
        }
        Ok(())
    }

    fn stage(&self, model: &ModelRef, index: usize, input: Input, merge: bool) -> ConfigResult<Change> {
        let field = &model.schema().fields[index];
        match self.slot(index) {
            Slot::Scalar(_) => match input {
                Input::Null => Ok(Change::Scalar(index, None)),
                Input::Value(value) => field
                    .validate(value)
                    .map(|value| Change::Scalar(index, Some(value)))
                    .map_err(|source| ConfigError::invalid_value(model.name(), &field.name, source)),
                other => Err(ConfigError::invalid_value(
                    model.name(),
                    &field.name,
                    ValidationError::new("type", format!("expected a scalar, got {}", other.describe())),
                )),
            },
            Slot::Set(collection) => {
                let items = match input {
                    Input::Null => Vec::new(),
                    Input::List(items) => items,
                    single => vec![single],
                };
                let members = items
                    .into_iter()
                    .map(|item| collection.coerce(item))
                    .collect::<ConfigResult<Vec<_>>>()?;
                Ok(Change::Members {
                    collection,
                    members,
                    replace: !merge,
                })
            }
            Slot::Reference(reference) => {
                let binding = reference.coerce(input)?;
                Ok(Change::Bind(reference, binding))
            }
        }
    }

    fn commit(&self, change: Change) {
        match change {
            Change::Scalar(index, value) => self.0.borrow_mut().slots[index] = Slot::Scalar(value),
            Change::Members {
                collection,
                members,
                replace,
            } => {
                if replace {
                    collection.clear();
                }
                for member in members {
                    collection.insert(member);
                }
            }
            Change::Bind(reference, binding) => reference.rebind(binding),
        }
    }

    /// The collection this entity belongs to.
    pub fn parent(&self) -> Option<Collection> {
        self.0.borrow().parent.as_ref().and_then(WeakCollection::upgrade)
    }

    pub(crate) fn set_parent(&self, parent: Option<&Collection>) {
        self.0.borrow_mut().parent = parent.map(Collection::downgrade);
    }

    /// The entity owning this entity's collection.
    pub fn owner(&self) -> Option<Entity> {
        self.parent().and_then(|collection| collection.owner())
    }

    /// Owning entities from the nearest outwards, excluding a document root.
    pub fn ancestors(&self) -> Vec<Entity> {
        let mut ancestors = Vec::new();
        let mut current = self.owner();
        while let Some(entity) = current {
            if entity.is_document() {
                break;
            }
            current = entity.owner();
            ancestors.push(entity);
        }
        ancestors
    }

    /// The ancestor directly owned by the document root.
    pub fn document_host(&self) -> Option<Entity> {
        self.ancestors()
            .into_iter()
            .find(|ancestor| ancestor.owner().is_some_and(|owner| owner.is_document()))
    }

    /// The nearest enclosing host or template.
    pub fn host_scope(&self) -> Option<Entity> {
        self.ancestors()
            .into_iter()
            .find(|ancestor| ancestor.model().schema().host_scope)
    }

    /// Host used to complete append-host references: the document host, or
    /// the nearest host scope when the entity is not inside a document.
    pub(crate) fn stamping_host(&self) -> Option<Entity> {
        let host = self.document_host().or_else(|| self.host_scope());
        if host.is_none() {
            warn!("{self:?} is not nested under a host or template");
        }
        host
    }

    /// Serialized identity used when this entity is the target of a reference.
    pub fn identity(&self) -> ConfigResult<Identity> {
        let model = self.model();
        let shape = model.schema().reference.as_ref().ok_or_else(|| ConfigError::Unreferenceable {
            model: model.name().to_string(),
            reason: "model declares no reference identity".to_string(),
        })?;
        let value = self.get(&shape.field)?.ok_or_else(|| ConfigError::Unreferenceable {
            model: model.name().to_string(),
            reason: format!("{} is not set", shape.field),
        })?;
        let mut identity = Identity::new().with(shape.key.clone(), value);
        if let Some(host) = self.host_scope() {
            if let Some(name) = host.get(HOST_NAME_FIELD)? {
                identity.insert("host", name);
            }
        }
        Ok(identity)
    }

    /// Every entity of `model` (subtypes included) at or below this one, in
    /// first-seen order without duplicates.
    pub fn extract(&self, model: &ModelRef) -> Vec<Entity> {
        let mut found = Vec::new();
        self.collect_into(model, &mut found);
        found
    }

    fn collect_into(&self, model: &ModelRef, found: &mut Vec<Entity>) {
        if self.model().is_a(model) && !found.iter().any(|entity| entity.same_identity(self)) {
            found.push(self.clone());
        }
        let slots = self.0.borrow().slots.clone();
        for slot in slots {
            if let Slot::Set(collection) = slot {
                for member in collection.members() {
                    member.collect_into(model, found);
                }
            }
        }
    }

    /// Equality used by collections: the same instance, or equal identity
    /// fields when the model declares them.
    pub fn same_identity(&self, other: &Entity) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (mine, theirs) = (self.model(), other.model());
        let identity = &mine.schema().identity;
        if identity.is_empty() || *identity != theirs.schema().identity || !(mine.is_a(&theirs) || theirs.is_a(&mine)) {
            return false;
        }
        identity.iter().all(|field| match (self.get(field), other.get(field)) {
            (Ok(Some(a)), Ok(Some(b))) => a.loose_eq(&b),
            (Ok(None), Ok(None)) => true,
            _ => false,
        })
    }

    pub fn ptr_eq(&self, other: &Entity) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A detached deep copy sharing no collection state with `self`.
    pub fn duplicate(&self) -> Entity {
        let model = self.model();
        let copy = Entity::new(&model);
        let slots = self.0.borrow().slots.clone();
        for (index, slot) in slots.into_iter().enumerate() {
            match (slot, copy.slot(index)) {
                (Slot::Scalar(value), _) => copy.0.borrow_mut().slots[index] = Slot::Scalar(value),
                (Slot::Set(source), Slot::Set(target)) => {
                    for member in source.members() {
                        target.insert(member.duplicate());
                    }
                }
                (Slot::Reference(source), Slot::Reference(target)) => target.rebind(source.binding()),
                _ => {}
            }
        }
        copy
    }

    fn label(&self) -> Option<String> {
        let model = self.model();
        let schema = model.schema();
        let field = schema
            .positional
            .as_deref()
            .or_else(|| schema.identity.first().map(String::as_str))?;
        self.text(field)
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.model();
        match self.label() {
            Some(label) => write!(f, "{}({label:?})", model.name()),
            None => write!(f, "{}({:p})", model.name(), Rc::as_ptr(&self.0)),
        }
    }
}
