//! Change-tracked object containers for the Structured Object Model (SOM).
//!
//! Every field of an object carries two independent pieces of state on top
//! of its payload: whether it is null and whether it has changed. Writes
//! set the changed flag implicitly; `set_changed(false)` resets a graph to
//! a clean baseline so subsequent edits record a minimal delta. Containers
//! that own structure (single object slots, sequences, dictionaries) also
//! carry a structural "changed here" flag that records assignments to the
//! container itself, separately from changes inside its elements.
//!
//! # Key Types
//!
//! - [`ValueSlot`] - A scalar field: declared kind, optional value, flag
//! - [`ObjectSlot`] - A nested-object field with a structural flag
//! - [`ArraySlot`] - Fixed-length array, no structural flag
//! - [`SequenceSlot`] - Growable list with a structural flag
//! - [`DictionarySlot`] - Insertion-ordered map with a structural flag
//! - [`ObjectNode`] - A typed instance: one [`MemberSlot`] per member
//! - [`ObjectFactory`] - Creates all-null instances from a repository
//!
//! # Invariants
//!
//! - Null and changed are independent: "changed to null" is representable.
//! - Aggregate change state is always computed from the tree on demand,
//!   never cached, so it cannot go stale.
//! - An object graph is a strict ownership tree. `Clone` deep-copies it
//!   with all flags intact, and `PartialEq` compares full state, flags
//!   included.

pub mod collection;
pub mod error;
pub mod factory;
pub mod key;
pub mod node;
pub mod scalar;
pub mod slot;

pub use collection::{ArraySlot, DictionarySlot, SequenceSlot};
pub use error::{AccessError, AccessResult};
pub use factory::ObjectFactory;
pub use key::DictKey;
pub use node::{MemberSlot, ObjectNode};
pub use scalar::ScalarValue;
pub use slot::{ItemSlot, ObjectSlot, ValueSlot};
