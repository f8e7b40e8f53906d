use thiserror::Error;

use som_schema::TypeId;

/// Protocol violations raised while applying a delta.
///
/// Every variant means the delta is inconsistent with the target state or
/// with the schema, which a correct publisher never produces. They are
/// fatal to the merge call and never retried; member updates applied
/// before the violation are left in place, so callers that need
/// all-or-nothing behavior merge into a clone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("class mismatch: cannot merge {from} into {into}")]
    ClassMismatch { into: TypeId, from: TypeId },

    #[error("slot shapes disagree at {path}")]
    ShapeMismatch { path: String },

    #[error("cannot merge member changes into null object at {path}")]
    NullTarget { path: String },

    #[error("length mismatch at {path}: target has {into_len}, delta has {from_len}")]
    LengthMismatch {
        path: String,
        into_len: usize,
        from_len: usize,
    },

    #[error("delta updates key {key} missing from target dictionary {path}")]
    MissingKey { path: String, key: String },
}

impl MergeError {
    /// Prefix the violation path with the enclosing member or element.
    pub(crate) fn nest(self, parent: &str) -> Self {
        match self {
            err @ Self::ClassMismatch { .. } => err,
            Self::ShapeMismatch { path } => Self::ShapeMismatch {
                path: join_path(parent, &path),
            },
            Self::NullTarget { path } => Self::NullTarget {
                path: join_path(parent, &path),
            },
            Self::LengthMismatch {
                path,
                into_len,
                from_len,
            } => Self::LengthMismatch {
                path: join_path(parent, &path),
                into_len,
                from_len,
            },
            Self::MissingKey { path, key } => Self::MissingKey {
                path: join_path(parent, &path),
                key,
            },
        }
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if child.is_empty() {
        parent.to_string()
    } else if child.starts_with('[') {
        format!("{parent}{child}")
    } else {
        format!("{parent}.{child}")
    }
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
