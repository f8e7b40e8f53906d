//! Delta derivation for the Structured Object Model (SOM).
//!
//! [`diff_nodes`] compares two graphs of the same class and produces the
//! delta that turns the second into the first: the target's content with
//! every change flag recomputed from value comparison. [`diff_blobs`] is
//! the same operation over encoded blobs. A delta derived this way always
//! merges cleanly onto the base it was computed against.

pub mod blob_diff;
pub mod error;
pub mod node_diff;

pub use blob_diff::diff_blobs;
pub use error::{DiffError, DiffResult};
pub use node_diff::diff_nodes;
