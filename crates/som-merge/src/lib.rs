//! Delta application for the Structured Object Model (SOM).
//!
//! [`merge_changes`] takes a target graph and a delta graph of the same
//! class and applies exactly the state the delta's change flags mark,
//! leaving everything else untouched. Containers distinguish structural
//! replacement (the container itself was assigned) from content merge
//! (only elements changed); the two follow different rules.
//!
//! A delta that disagrees with the target's shape, a change aimed at a
//! null object, a sequence length mismatch during content merge, or a
//! dictionary key the target lacks is a protocol violation: the merge
//! aborts with a [`MergeError`] carrying the dotted path to the offending
//! member. Earlier member updates are not rolled back; callers that need
//! atomicity merge into a clone and swap on success.

pub mod error;
pub mod merge;

pub use error::{MergeError, MergeResult};
pub use merge::merge_changes;
