//! Scored hit graphs consumed by the labelling core.
//!
//! A [`ScoredGraph`] pairs an edge list with one score per edge. Nodes are the
//! detector hits `0..node_count`; the graph does not store hit features.

use std::sync::Arc;

use crate::{error::LabelError, labels::TrackLabels};

/// Largest node count accepted from signed graph records.
///
/// Labelling allocates a few words per hit, so larger counts in a stored
/// record are treated as corruption rather than allocated.
pub const MAX_NODE_COUNT: usize = 1 << 28;

/// A directed pair of hit indices.
///
/// Labelling treats edges as undirected, so `(a, b)` and `(b, a)` connect the
/// same hits.
///
/// # Examples
/// ```
/// use trackbuild_core::Edge;
///
/// let edge = Edge::new(3, 1);
/// assert_eq!((edge.source(), edge.target()), (3, 1));
/// assert!(!edge.is_self_loop());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    source: usize,
    target: usize,
}

impl Edge {
    /// Creates an edge from `source` to `target`.
    #[must_use]
    pub const fn new(source: usize, target: usize) -> Self {
        Self { source, target }
    }

    /// Returns the source hit index.
    #[must_use]
    #[rustfmt::skip]
    pub const fn source(&self) -> usize { self.source }

    /// Returns the target hit index.
    #[must_use]
    #[rustfmt::skip]
    pub const fn target(&self) -> usize { self.target }

    /// Returns `true` when both endpoints are the same hit.
    #[must_use]
    pub const fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl From<(usize, usize)> for Edge {
    fn from((source, target): (usize, usize)) -> Self {
        Self::new(source, target)
    }
}

/// A graph of detector hits whose edges carry a learned connection score.
///
/// Construction guarantees that `edges` and `scores` have the same length.
/// Node indices are not checked here; the labeller rejects edges that point
/// outside `0..node_count` when they survive the score cut.
///
/// # Examples
/// ```
/// use trackbuild_core::{Edge, ScoredGraph};
///
/// let graph = ScoredGraph::new(
///     "event0001",
///     3,
///     vec![Edge::new(0, 1), Edge::new(1, 2)],
///     vec![0.9, 0.2],
/// )?;
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.edge_count(), 2);
/// assert!(graph.labels().is_none());
/// # Ok::<(), trackbuild_core::LabelError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredGraph {
    identifier: Arc<str>,
    node_count: usize,
    edges: Vec<Edge>,
    scores: Vec<f32>,
    labels: Option<TrackLabels>,
}

impl ScoredGraph {
    /// Creates an unlabelled graph.
    ///
    /// # Errors
    /// Returns [`LabelError::ShapeMismatch`] when `edges` and `scores` differ
    /// in length.
    pub fn new(
        identifier: impl Into<Arc<str>>,
        node_count: usize,
        edges: Vec<Edge>,
        scores: Vec<f32>,
    ) -> Result<Self, LabelError> {
        if edges.len() != scores.len() {
            return Err(LabelError::ShapeMismatch {
                edges: edges.len(),
                scores: scores.len(),
            });
        }
        Ok(Self {
            identifier: identifier.into(),
            node_count,
            edges,
            scores,
            labels: None,
        })
    }

    /// Creates a graph from the signed integer layout used by stored graph
    /// records: a node count and a two-row edge index.
    ///
    /// # Errors
    /// Returns [`LabelError::InvalidArgument`] for a negative `node_count`,
    /// [`LabelError::NodeCountTooLarge`] when it exceeds [`MAX_NODE_COUNT`],
    /// [`LabelError::MalformedEdgeIndex`] when the rows differ in length,
    /// [`LabelError::IndexOutOfRange`] for a negative (or unaddressable) node
    /// index, and [`LabelError::ShapeMismatch`] when the score count differs
    /// from the edge count.
    ///
    /// # Examples
    /// ```
    /// use trackbuild_core::{LabelError, ScoredGraph};
    ///
    /// let graph = ScoredGraph::from_signed_parts("event0001", 2, &[0], &[1], vec![0.5])?;
    /// assert_eq!(graph.edges()[0].target(), 1);
    ///
    /// let err = ScoredGraph::from_signed_parts("event0002", -1, &[], &[], vec![])
    ///     .expect_err("negative node counts are rejected");
    /// assert!(matches!(err, LabelError::InvalidArgument { argument: "node_count", .. }));
    /// # Ok::<(), LabelError>(())
    /// ```
    pub fn from_signed_parts(
        identifier: impl Into<Arc<str>>,
        node_count: i64,
        sources: &[i64],
        targets: &[i64],
        scores: Vec<f32>,
    ) -> Result<Self, LabelError> {
        let node_count = signed_node_count(node_count)?;
        if sources.len() != targets.len() {
            return Err(LabelError::MalformedEdgeIndex {
                sources: sources.len(),
                targets: targets.len(),
            });
        }

        let edges = sources
            .iter()
            .zip(targets)
            .enumerate()
            .map(|(edge, (&source, &target))| {
                let source = signed_index(edge, source, node_count)?;
                let target = signed_index(edge, target, node_count)?;
                Ok(Edge::new(source, target))
            })
            .collect::<Result<Vec<_>, LabelError>>()?;

        Self::new(identifier, node_count, edges, scores)
    }

    /// Returns the opaque identifier naming this graph's artefact.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns a shared handle to the identifier.
    #[must_use]
    pub fn shared_identifier(&self) -> Arc<str> {
        Arc::clone(&self.identifier)
    }

    /// Returns the number of hits in the graph.
    #[must_use]
    #[rustfmt::skip]
    pub fn node_count(&self) -> usize { self.node_count }

    /// Returns the number of scored edges.
    #[must_use]
    #[rustfmt::skip]
    pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Returns the edges in input order.
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &[Edge] { &self.edges }

    /// Returns the edge scores, aligned with [`Self::edges`].
    #[must_use]
    #[rustfmt::skip]
    pub fn scores(&self) -> &[f32] { &self.scores }

    /// Returns the track labels once the graph has been labelled.
    #[must_use]
    pub fn labels(&self) -> Option<&TrackLabels> {
        self.labels.as_ref()
    }

    /// Removes and returns the labels, leaving the graph unlabelled.
    pub fn take_labels(&mut self) -> Option<TrackLabels> {
        self.labels.take()
    }

    pub(crate) fn attach_labels(&mut self, labels: TrackLabels) {
        debug_assert_eq!(labels.len(), self.node_count);
        self.labels = Some(labels);
    }
}

fn signed_node_count(node_count: i64) -> Result<usize, LabelError> {
    let count = usize::try_from(node_count).map_err(|_| LabelError::InvalidArgument {
        argument: "node_count",
        value: node_count.to_string(),
    })?;
    if count > MAX_NODE_COUNT {
        return Err(LabelError::NodeCountTooLarge {
            node_count: count,
            limit: MAX_NODE_COUNT,
        });
    }
    Ok(count)
}

fn signed_index(edge: usize, node: i64, node_count: usize) -> Result<usize, LabelError> {
    usize::try_from(node).map_err(|_| LabelError::IndexOutOfRange {
        edge,
        node,
        node_count,
    })
}
