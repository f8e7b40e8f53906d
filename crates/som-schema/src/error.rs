use thiserror::Error;

/// Errors raised while building or loading a schema repository.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate type name: {name}")]
    DuplicateType { name: String },

    #[error("duplicate member {member} in class {class}")]
    DuplicateMember { class: String, member: String },

    #[error("unknown type {name} referenced by {referrer}")]
    UnknownType { name: String, referrer: String },

    #[error("array member {member} in class {class} has zero length")]
    EmptyArray { class: String, member: String },

    #[error("class {class} contains itself by value")]
    CompositionCycle { class: String },

    #[error("schema source error: {0}")]
    Source(String),
}

/// Convenience alias for schema results.
pub type SchemaResult<T> = Result<T, SchemaError>;
