use som_schema::Repository;
use som_wire::{from_binary, to_binary};

use crate::error::DiffResult;
use crate::node_diff::diff_nodes;

/// Derive a delta blob from two encoded graphs of the same class.
///
/// Both blobs are decoded against `repo`, compared, and the delta is
/// re-encoded. Change flags embedded in the inputs do not influence the
/// output; only value comparison does.
pub fn diff_blobs(repo: &Repository, target: &[u8], base: &[u8]) -> DiffResult<Vec<u8>> {
    let target_node = from_binary(repo, target)?;
    let base_node = from_binary(repo, base)?;
    let delta = diff_nodes(&target_node, &base_node)?;
    Ok(to_binary(&delta))
}
