use std::cmp::Ordering;

use som_schema::{ScalarKind, TypeId};

use crate::error::{AccessError, AccessResult};

/// A concrete scalar payload held by a value slot.
///
/// Floats compare by bit pattern, so equality is a real equivalence and
/// survives codec round trips unchanged (NaN payloads included). Enum
/// values carry their enumeration's type id so values of different
/// enumerations never compare equal or pass each other's kind checks.
#[derive(Debug, Clone)]
pub enum ScalarValue {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Str(String),
    Binary(Vec<u8>),
    Enum { enum_id: TypeId, ordinal: i32 },
}

impl ScalarValue {
    /// Kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::Str(_) => "str",
            Self::Binary(_) => "binary",
            Self::Enum { .. } => "enum",
        }
    }

    /// Returns `true` if this value satisfies the declared kind.
    pub fn matches(&self, kind: ScalarKind) -> bool {
        match (self, kind) {
            (Self::Bool(_), ScalarKind::Bool)
            | (Self::Int32(_), ScalarKind::Int32)
            | (Self::Int64(_), ScalarKind::Int64)
            | (Self::Float32(_), ScalarKind::Float32)
            | (Self::Float64(_), ScalarKind::Float64)
            | (Self::Str(_), ScalarKind::Str)
            | (Self::Binary(_), ScalarKind::Binary) => true,
            (Self::Enum { enum_id, .. }, ScalarKind::Enum(id)) => *enum_id == id,
            _ => false,
        }
    }

    pub fn as_bool(&self) -> AccessResult<bool> {
        match self {
            Self::Bool(v) => Ok(*v),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn as_i32(&self) -> AccessResult<i32> {
        match self {
            Self::Int32(v) => Ok(*v),
            other => Err(other.mismatch("int32")),
        }
    }

    pub fn as_i64(&self) -> AccessResult<i64> {
        match self {
            Self::Int64(v) => Ok(*v),
            other => Err(other.mismatch("int64")),
        }
    }

    pub fn as_f32(&self) -> AccessResult<f32> {
        match self {
            Self::Float32(v) => Ok(*v),
            other => Err(other.mismatch("float32")),
        }
    }

    pub fn as_f64(&self) -> AccessResult<f64> {
        match self {
            Self::Float64(v) => Ok(*v),
            other => Err(other.mismatch("float64")),
        }
    }

    pub fn as_str(&self) -> AccessResult<&str> {
        match self {
            Self::Str(v) => Ok(v),
            other => Err(other.mismatch("str")),
        }
    }

    pub fn as_bytes(&self) -> AccessResult<&[u8]> {
        match self {
            Self::Binary(v) => Ok(v),
            other => Err(other.mismatch("binary")),
        }
    }

    pub fn as_enum(&self) -> AccessResult<(TypeId, i32)> {
        match self {
            Self::Enum { enum_id, ordinal } => Ok((*enum_id, *ordinal)),
            other => Err(other.mismatch("enum")),
        }
    }

    /// Equality between values of the same kind. A kind mismatch is an
    /// error rather than `false`, so schema violations never read as
    /// inequality.
    pub fn try_eq(&self, other: &Self) -> AccessResult<bool> {
        self.require_same_kind(other)?;
        Ok(self == other)
    }

    /// Ordering between values of the same kind. Floats use total order.
    pub fn try_cmp(&self, other: &Self) -> AccessResult<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Ok(a.cmp(b)),
            (Self::Int32(a), Self::Int32(b)) => Ok(a.cmp(b)),
            (Self::Int64(a), Self::Int64(b)) => Ok(a.cmp(b)),
            (Self::Float32(a), Self::Float32(b)) => Ok(a.total_cmp(b)),
            (Self::Float64(a), Self::Float64(b)) => Ok(a.total_cmp(b)),
            (Self::Str(a), Self::Str(b)) => Ok(a.cmp(b)),
            (Self::Binary(a), Self::Binary(b)) => Ok(a.cmp(b)),
            (
                Self::Enum {
                    enum_id: a,
                    ordinal: x,
                },
                Self::Enum {
                    enum_id: b,
                    ordinal: y,
                },
            ) if a == b => Ok(x.cmp(y)),
            _ => Err(self.mismatch(other.kind_name())),
        }
    }

    fn require_same_kind(&self, other: &Self) -> AccessResult<()> {
        let compatible = match (self, other) {
            (Self::Enum { enum_id: a, .. }, Self::Enum { enum_id: b, .. }) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        };
        if compatible {
            Ok(())
        } else {
            Err(self.mismatch(other.kind_name()))
        }
    }

    fn mismatch(&self, expected: &'static str) -> AccessError {
        AccessError::TypeMismatch {
            expected,
            actual: self.kind_name(),
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int32(a), Self::Int32(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::Float32(a), Self::Float32(b)) => a.to_bits() == b.to_bits(),
            (Self::Float64(a), Self::Float64(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (
                Self::Enum {
                    enum_id: a,
                    ordinal: x,
                },
                Self::Enum {
                    enum_id: b,
                    ordinal: y,
                },
            ) => a == b && x == y,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}
