use som_schema::TypeId;
use som_wire::WireError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    #[error("cannot diff {target} against {base}: classes differ")]
    ClassMismatch { target: TypeId, base: TypeId },

    #[error(transparent)]
    Wire(#[from] WireError),
}

pub type DiffResult<T> = Result<T, DiffError>;
