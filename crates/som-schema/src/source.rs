//! Source form of a schema: the serde types a repository is built from.
//!
//! The source format references other types by name rather than by id, so
//! schemas can be written by hand as JSON and checked into a project. Name
//! resolution and validation happen in [`crate::repository::RepositoryBuilder`].

use serde::{Deserialize, Serialize};

/// A whole schema: enumeration names plus class definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSource {
    #[serde(default)]
    pub enums: Vec<String>,
    #[serde(default)]
    pub classes: Vec<ClassSpec>,
}

/// One class definition in source form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSpec {
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberSpec>,
}

impl ClassSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, member: MemberSpec) -> Self {
        self.members.push(member);
        self
    }
}

/// One member definition in source form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub name: String,
    pub element: ElementSpec,
    #[serde(default)]
    pub collection: CollectionSpec,
}

impl MemberSpec {
    pub fn single(name: impl Into<String>, element: ElementSpec) -> Self {
        Self {
            name: name.into(),
            element,
            collection: CollectionSpec::Single,
        }
    }

    pub fn array(name: impl Into<String>, element: ElementSpec, len: usize) -> Self {
        Self {
            name: name.into(),
            element,
            collection: CollectionSpec::Array(len),
        }
    }

    pub fn sequence(name: impl Into<String>, element: ElementSpec) -> Self {
        Self {
            name: name.into(),
            element,
            collection: CollectionSpec::Sequence,
        }
    }

    pub fn dictionary(name: impl Into<String>, key: KeySpec, element: ElementSpec) -> Self {
        Self {
            name: name.into(),
            element,
            collection: CollectionSpec::Dictionary(key),
        }
    }
}

/// Element type in source form. Object and enum references are by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementSpec {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    Str,
    Binary,
    Enum(String),
    Object(String),
}

/// Collection shape in source form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionSpec {
    Single,
    Array(usize),
    Sequence,
    Dictionary(KeySpec),
}

impl Default for CollectionSpec {
    fn default() -> Self {
        Self::Single
    }
}

/// Dictionary key type in source form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySpec {
    Int32,
    Int64,
    Str,
    Enum(String),
}
