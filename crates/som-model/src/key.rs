use std::fmt;

use som_schema::{KeyKind, TypeId};

/// A dictionary key.
///
/// Dictionaries keep insertion order, so `Hash`/`Eq` are what the map uses;
/// `Ord` exists only for deterministic diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DictKey {
    Int32(i32),
    Int64(i64),
    Str(String),
    Enum { enum_id: TypeId, ordinal: i32 },
}

impl DictKey {
    /// Kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Str(_) => "str",
            Self::Enum { .. } => "enum",
        }
    }

    /// Returns `true` if this key satisfies the declared key kind.
    pub fn matches(&self, kind: KeyKind) -> bool {
        match (self, kind) {
            (Self::Int32(_), KeyKind::Int32)
            | (Self::Int64(_), KeyKind::Int64)
            | (Self::Str(_), KeyKind::Str) => true,
            (Self::Enum { enum_id, .. }, KeyKind::Enum(id)) => *enum_id == id,
            _ => false,
        }
    }
}

impl fmt::Display for DictKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Enum { ordinal, .. } => write!(f, "#{ordinal}"),
        }
    }
}

impl From<&str> for DictKey {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for DictKey {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_declared_kind() {
        assert!(DictKey::Int32(3).matches(KeyKind::Int32));
        assert!(!DictKey::Int32(3).matches(KeyKind::Int64));
        assert!(DictKey::from("alpha").matches(KeyKind::Str));
    }

    #[test]
    fn enum_keys_distinguish_enum_types() {
        let quality = TypeId::derive("Quality");
        let color = TypeId::derive("Color");
        let key = DictKey::Enum {
            enum_id: quality,
            ordinal: 2,
        };
        assert!(key.matches(KeyKind::Enum(quality)));
        assert!(!key.matches(KeyKind::Enum(color)));
    }

    #[test]
    fn display_forms() {
        assert_eq!(DictKey::Int32(-4).to_string(), "-4");
        assert_eq!(DictKey::from("alpha").to_string(), "alpha");
        let key = DictKey::Enum {
            enum_id: TypeId::derive("Quality"),
            ordinal: 1,
        };
        assert_eq!(key.to_string(), "#1");
    }

    #[test]
    fn keys_of_same_value_are_equal() {
        assert_eq!(DictKey::Int64(9), DictKey::Int64(9));
        assert_ne!(DictKey::Int32(9), DictKey::Int64(9));
    }
}
