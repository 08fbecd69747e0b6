//! Connected-component labelling of the surviving hit graph.
//!
//! Every hit receives exactly one [`TrackId`]. Hits joined by a path of
//! surviving edges share a label, and labels are numbered in increasing order
//! of the smallest hit index in each component. The numbering therefore does
//! not depend on edge order.

use std::collections::HashMap;

use tracing::trace;

use crate::{
    error::LabelError,
    graph::Edge,
    labels::{TrackId, TrackLabels},
    union_find::DisjointSet,
};

/// Labels the connected components of the undirected graph formed by
/// `node_count` hits and `edges`.
///
/// Self-loops and duplicate edges have no effect. With no edges every hit is
/// its own candidate and the labels are `0..node_count`.
///
/// # Errors
/// Returns [`LabelError::IndexOutOfRange`] when any edge references a hit
/// `>= node_count`. Every edge is checked before any merge, so no partial
/// labelling is produced.
///
/// # Examples
/// ```
/// use trackbuild_core::{Edge, label_components};
///
/// let labels = label_components(4, &[Edge::new(3, 2), Edge::new(1, 0)])?;
/// let raw: Vec<u64> = labels.labels().iter().map(|id| id.get()).collect();
/// assert_eq!(raw, vec![0, 0, 1, 1]);
/// assert_eq!(labels.candidate_count(), 2);
/// # Ok::<(), trackbuild_core::LabelError>(())
/// ```
pub fn label_components(node_count: usize, edges: &[Edge]) -> Result<TrackLabels, LabelError> {
    validate_edges(node_count, edges)?;

    let mut set = DisjointSet::new(node_count);
    for edge in edges {
        set.union(edge.source(), edge.target());
    }

    let candidate_count = set.components();
    let mut by_root: HashMap<usize, TrackId> = HashMap::with_capacity(candidate_count);
    let mut next = 0u64;
    let labels = (0..node_count)
        .map(|node| {
            let root = set.find(node);
            *by_root.entry(root).or_insert_with(|| {
                let id = TrackId::new(next);
                next += 1;
                id
            })
        })
        .collect();

    trace!(
        nodes = node_count,
        edges = edges.len(),
        candidates = candidate_count,
        "labelled connected components"
    );
    Ok(TrackLabels::from_canonical(labels, candidate_count))
}

fn validate_edges(node_count: usize, edges: &[Edge]) -> Result<(), LabelError> {
    for (position, edge) in edges.iter().enumerate() {
        for node in [edge.source(), edge.target()] {
            if node >= node_count {
                return Err(LabelError::IndexOutOfRange {
                    edge: position,
                    node: i64::try_from(node).unwrap_or(i64::MAX),
                    node_count,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod property;
#[cfg(test)]
mod tests;
