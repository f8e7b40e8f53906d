use crate::type_id::TypeId;

/// The scalar payloads a value container can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    Str,
    Binary,
    /// Ordinal-valued enumeration of the given type.
    Enum(TypeId),
}

impl ScalarKind {
    /// Kind name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Str => "str",
            Self::Binary => "binary",
            Self::Enum(_) => "enum",
        }
    }
}

/// The key types a dictionary member can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Int32,
    Int64,
    Str,
    Enum(TypeId),
}

impl KeyKind {
    /// Kind name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Str => "str",
            Self::Enum(_) => "enum",
        }
    }
}

/// What one element of a member holds: a scalar value or a nested object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Scalar(ScalarKind),
    Object(TypeId),
}

impl ElementType {
    /// Element name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar(kind) => kind.name(),
            Self::Object(_) => "object",
        }
    }
}

/// How a member is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Exactly one element.
    Single,
    /// Fixed-length array. The length is part of the schema and never
    /// changes at runtime.
    Array(usize),
    /// Growable ordered list with its own structural change flag.
    Sequence,
    /// Insertion-ordered map with its own structural change flag.
    Dictionary(KeyKind),
}

impl Collection {
    /// Collection name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Array(_) => "array",
            Self::Sequence => "sequence",
            Self::Dictionary(_) => "dictionary",
        }
    }
}

/// One declared member of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    pub name: String,
    pub element: ElementType,
    pub collection: Collection,
}

/// A class: an ordered list of typed members.
///
/// Member order is part of the type's identity. Ordinals index into it and
/// the wire format writes members in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub type_id: TypeId,
    pub name: String,
    pub members: Vec<MemberDescriptor>,
}

impl ClassDescriptor {
    /// Look up a member by name, returning its ordinal and descriptor.
    pub fn member(&self, name: &str) -> Option<(usize, &MemberDescriptor)> {
        self.members
            .iter()
            .enumerate()
            .find(|(_, m)| m.name == name)
    }

    /// Look up a member by ordinal.
    pub fn member_at(&self, ordinal: usize) -> Option<&MemberDescriptor> {
        self.members.get(ordinal)
    }

    /// Number of declared members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// An enumeration type. Values are ordinals; name tables are not modeled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub type_id: TypeId,
    pub name: String,
}
