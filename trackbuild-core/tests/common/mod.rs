//! Fixture builders shared by the integration tests.

use trackbuild_core::{Edge, ScoredGraph, TrackLabels};

#[must_use]
pub fn graph(identifier: &str, node_count: usize, edges: &[(usize, usize)], scores: &[f32]) -> ScoredGraph {
    ScoredGraph::new(
        identifier,
        node_count,
        edges.iter().copied().map(Edge::from).collect(),
        scores.to_vec(),
    )
    .expect("fixture graph must be well formed")
}

#[must_use]
pub fn raw(labels: &TrackLabels) -> Vec<u64> {
    labels.labels().iter().map(|id| id.get()).collect()
}
