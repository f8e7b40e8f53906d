//! Schema metadata for the Structured Object Model (SOM).
//!
//! A schema is a validated, immutable set of class and enumeration
//! descriptors. Classes declare ordered member lists; each member has an
//! element type (scalar or nested object) and a collection shape (single
//! slot, fixed array, sequence, or dictionary). Every other som crate
//! depends on `som-schema`.
//!
//! # Key Types
//!
//! - [`TypeId`] - Stable type identifier derived from the qualified name
//! - [`ClassDescriptor`] - Ordered member list of a class
//! - [`Repository`] - Validated descriptor set shared via `Arc`
//! - [`SchemaSource`] - Name-based source format, loadable from JSON

pub mod descriptor;
pub mod error;
pub mod repository;
pub mod source;
pub mod type_id;

pub use descriptor::{
    ClassDescriptor, Collection, ElementType, EnumDescriptor, KeyKind, MemberDescriptor,
    ScalarKind,
};
pub use error::{SchemaError, SchemaResult};
pub use repository::{Repository, RepositoryBuilder};
pub use source::{ClassSpec, CollectionSpec, ElementSpec, KeySpec, MemberSpec, SchemaSource};
pub use type_id::TypeId;
