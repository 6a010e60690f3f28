//! zbxconf core library.
//!
//! Declarative monitoring configuration: models are declared once, resolved
//! into a [`Registry`], instantiated as [`Entity`] trees and compiled into the
//! XML import format.

pub mod api;
pub mod catalogue;
pub mod collection;
pub mod compiler;
pub mod errors;
pub mod examples;
pub mod fields;
pub mod model;
pub mod palette;
pub mod reference;
pub mod registry;
pub mod sender;
pub mod types;
pub mod util;
pub mod validators;

pub use collection::Collection;
pub use compiler::{Compiler, DefaultRule, DefaultRules, Fragment, FragmentKind, Node};
pub use errors::*;
pub use fields::{Field, FieldKind};
pub use model::Entity;
pub use palette::ColorPalette;
pub use reference::{Binding, Reference};
pub use registry::{Arrangement, FieldSchema, ModelDecl, ModelRef, ModelSchema, Registry, SchemaBuilder};
pub use types::{Fields, Identity, Input, Value};
pub use validators::{Choice, Validator};
