use thiserror::Error;

use som_schema::TypeId;

/// Errors for expected, routinely handled access failures: reads of null
/// fields, bad indexes, missing keys, kind violations.
///
/// These are the recoverable tier of the error taxonomy. Merge protocol
/// violations live in `som-merge` and are not recoverable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("value is null")]
    NullValue,

    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("class mismatch: expected {expected}, got {actual}")]
    ClassMismatch { expected: TypeId, actual: TypeId },

    #[error("class {class} has no member {member}")]
    UnknownMember { class: String, member: String },

    #[error("unknown class {0}")]
    UnknownClass(TypeId),

    #[error("slots do not match the declared shape of {class}")]
    ShapeMismatch { class: String },
}

/// Convenience alias for access results.
pub type AccessResult<T> = Result<T, AccessError>;
