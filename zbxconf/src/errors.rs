use thiserror::Error;

/// Top-level error type returned by the model framework and the compiler.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field's validator chain rejected a value. Nothing was stored.
    #[error("{model}.{field} does not validate: {source}")]
    InvalidValue {
        model: String,
        field: String,
        #[source]
        source: ValidationError,
    },

    /// Hydration supplied a key with no declared field.
    #[error("field {field} for {model} is not defined")]
    UnknownField { model: String, field: String },

    /// A collection was asked to hold something that is not (and cannot become) its element type.
    #[error("unable to add {value} to a collection of {expected}: {reason}")]
    InvalidElement {
        expected: String,
        value: String,
        reason: String,
    },

    /// A reference was resolved while bound to neither an entity nor a literal identity.
    #[error("reference {model}.{field} is not bound to anything")]
    DanglingReference { model: String, field: String },

    /// An entity was asked for its identity but its model does not define one.
    #[error("{model} cannot be referenced: {reason}")]
    Unreferenceable { model: String, reason: String },

    /// A model name was looked up in a registry that does not declare it.
    #[error("model {0} is not declared")]
    UnknownModel(String),

    /// The schema catalogue itself is malformed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Rendering the compiled tree to text failed.
    #[error("serialization failed: {message}")]
    Serialize { message: String },
}

impl ConfigError {
    pub(crate) fn invalid_value(model: &str, field: &str, source: ValidationError) -> Self {
        Self::InvalidValue {
            model: model.to_string(),
            field: field.to_string(),
            source,
        }
    }

    pub(crate) fn unknown_field(model: &str, field: &str) -> Self {
        Self::UnknownField {
            model: model.to_string(),
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid_element(expected: &str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidElement {
            expected: expected.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Failures raised while building a schema registry from declarations.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    #[error("model {0} is declared twice")]
    DuplicateModel(String),

    #[error("{model}.{field} points at undeclared model {target}")]
    UnresolvedType {
        model: String,
        field: String,
        target: String,
    },

    #[error("{model} extends undeclared model {parent}")]
    UnresolvedParent { model: String, parent: String },

    #[error("inheritance cycle through {0}")]
    InheritanceCycle(String),

    #[error("default of {model}.{field} does not validate: {source}")]
    InvalidDefault {
        model: String,
        field: String,
        #[source]
        source: ValidationError,
    },

    #[error("{model}.{field} refers to {target}, which is not a field of the same model")]
    UnknownSibling {
        model: String,
        field: String,
        target: String,
    },
}

/// A single validator failure.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    pub code: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type ConfigResult<T> = Result<T, ConfigError>;
