use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::Entity;

/// A scalar attribute value.
///
/// Values compare loosely when matched against choices: booleans count as
/// `0`/`1` and integers equal floats of the same magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Loose equality used by choice validation and identity comparison.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => match (self, other) {
                (Value::Text(a), Value::Text(b)) => a == b,
                _ => false,
            },
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            Value::Int(number) => Some(*number as f64),
            Value::Float(number) => Some(*number),
            Value::Text(_) => None,
        }
    }

    /// Integer view of the value; digit strings are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(flag) => Some(i64::from(*flag)),
            Value::Int(number) => Some(*number),
            Value::Float(number) if number.fract() == 0.0 => Some(*number as i64),
            Value::Float(_) => None,
            Value::Text(text) => text.trim().parse().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Text used for compiled output and for default-rule matching.
    pub fn render(&self) -> String {
        match self {
            Value::Bool(flag) => i64::from(*flag).to_string(),
            Value::Int(number) => number.to_string(),
            // Debug keeps the trailing `.0` on whole floats ("0.0", "100.0").
            Value::Float(number) => format!("{number:?}"),
            Value::Text(text) => text.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Anything that can be fed to a field: a scalar, a live entity, a list of
/// inputs (for collections) or a nested field mapping.
#[derive(Debug, Clone)]
pub enum Input {
    Null,
    Value(Value),
    Entity(Entity),
    List(Vec<Input>),
    Map(Fields),
}

impl Input {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Input::Null => "null".to_string(),
            Input::Value(value) => format!("{value:?}"),
            Input::Entity(entity) => format!("{entity:?}"),
            Input::List(items) => format!("list of {} inputs", items.len()),
            Input::Map(fields) => format!("mapping with keys {:?}", fields.keys().collect::<Vec<_>>()),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Input::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Input::Null)
    }
}

macro_rules! scalar_input {
    ($($ty:ty),+) => {
        $(impl From<$ty> for Input {
            fn from(value: $ty) -> Self {
                Input::Value(value.into())
            }
        })+
    };
}

scalar_input!(Value, bool, i64, i32, u32, usize, f64, &str, String);

impl From<Entity> for Input {
    fn from(entity: Entity) -> Self {
        Input::Entity(entity)
    }
}

impl From<&Entity> for Input {
    fn from(entity: &Entity) -> Self {
        Input::Entity(entity.clone())
    }
}

impl From<Fields> for Input {
    fn from(fields: Fields) -> Self {
        Input::Map(fields)
    }
}

impl From<Identity> for Input {
    fn from(identity: Identity) -> Self {
        let mut fields = Fields::new();
        for (key, value) in identity.into_pairs() {
            fields.insert(key, value);
        }
        Input::Map(fields)
    }
}

impl<T: Into<Input>> From<Vec<T>> for Input {
    fn from(items: Vec<T>) -> Self {
        Input::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Input>, const N: usize> From<[T; N]> for Input {
    fn from(items: [T; N]) -> Self {
        Input::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Input>> From<Option<T>> for Input {
    fn from(value: Option<T>) -> Self {
        value.map_or(Input::Null, Into::into)
    }
}

/// An ordered field-name → input mapping used to hydrate entities.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: Vec<(String, Input)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Input>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace `key`, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Input>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert only when `key` is absent. Returns true if inserted.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<Input>) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.entries.push((key, value.into()));
        true
    }

    pub fn get(&self, key: &str) -> Option<&Input> {
        self.entries.iter().find(|(existing, _)| existing == key).map(|(_, value)| value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Input> {
        let index = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Input)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Fields {
    type Item = (String, Input);
    type IntoIter = std::vec::IntoIter<(String, Input)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Build a [`Fields`] mapping inline.
///
/// ```
/// use zbxconf::fields;
///
/// let fields = fields! { "key" => "agent.ping", "history" => 30 };
/// assert_eq!(fields.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => { $crate::types::Fields::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::types::Fields::new()$(.with($key, $value))+
    };
}

/// The serialized identity of a referenced entity, e.g. `{ key, host }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identity {
    pairs: Vec<(String, Value)>,
}

impl Identity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(existing, _)| *existing == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.pairs.iter().find(|(existing, _)| existing == key).map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(existing, _)| existing == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pairs.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_equality_spans_numeric_kinds() {
        assert!(Value::Int(0).loose_eq(&Value::Float(0.0)));
        assert!(Value::Bool(true).loose_eq(&Value::Int(1)));
        assert!(!Value::Text("0".into()).loose_eq(&Value::Int(0)));
        assert!(Value::from("normal").loose_eq(&Value::from("normal")));
    }

    #[test]
    fn floats_render_with_fraction() {
        assert_eq!(Value::Float(0.0).render(), "0.0");
        assert_eq!(Value::Float(100.0).render(), "100.0");
        assert_eq!(Value::Int(7).render(), "7");
        assert_eq!(Value::Bool(false).render(), "0");
    }

    #[test]
    fn fields_replace_in_place() {
        let mut fields = fields! { "a" => 1, "b" => 2 };
        fields.insert("a", 3);
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(fields.get("a").and_then(Input::as_value), Some(&Value::Int(3)));
        assert!(!fields.set_default("b", 9));
        assert!(fields.set_default("c", 9));
    }
}
