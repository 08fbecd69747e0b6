//! Track-candidate building for scored hit graphs.
//!
//! Provides the [`TrackBuilder`] entry point, which filters each graph's
//! edges by score and labels the connected components of what survives.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::{
    Result,
    builder::ExecutionStrategy,
    error::{LabelError, TrackBuildError},
    filter::{ScoreCut, filter_edges},
    graph::ScoredGraph,
    labeler::label_components,
    labels::TrackLabels,
};

/// Entry point for labelling scored graphs with track candidates.
///
/// Graphs are independent: no state is shared between calls, and a failure
/// on one graph leaves every other graph untouched.
///
/// # Examples
/// ```
/// use trackbuild_core::{Edge, ScoredGraph, TrackBuilderConfig};
///
/// let builder = TrackBuilderConfig::new()
///     .with_score_cut(0.8)
///     .build()
///     .expect("builder must succeed");
/// let mut graph = ScoredGraph::new(
///     "event0001",
///     4,
///     vec![Edge::new(0, 1), Edge::new(1, 2), Edge::new(2, 3)],
///     vec![0.9, 0.3, 0.9],
/// )?;
/// builder.label_in_place(&mut graph)?;
/// let labels: Vec<u64> = graph
///     .labels()
///     .map(|labels| labels.labels().iter().map(|id| id.get()).collect())
///     .unwrap_or_default();
/// assert_eq!(labels, vec![0, 0, 1, 1]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct TrackBuilder {
    score_cut: ScoreCut,
    execution_strategy: ExecutionStrategy,
    parallel: bool,
}

impl TrackBuilder {
    pub(crate) fn new(
        score_cut: ScoreCut,
        execution_strategy: ExecutionStrategy,
        parallel: bool,
    ) -> Self {
        Self {
            score_cut,
            execution_strategy,
            parallel,
        }
    }

    /// Returns the score cut applied to every graph.
    #[must_use]
    pub fn score_cut(&self) -> ScoreCut {
        self.score_cut
    }

    /// Returns the execution strategy that was requested.
    #[must_use]
    pub fn execution_strategy(&self) -> ExecutionStrategy {
        self.execution_strategy
    }

    /// Returns `true` when batches are distributed over the rayon pool.
    #[must_use]
    pub fn runs_parallel(&self) -> bool {
        self.parallel
    }

    /// Filters `graph`'s edges and labels its connected components.
    ///
    /// # Errors
    /// Returns [`TrackBuildError::Graph`] wrapping
    /// [`LabelError::ShapeMismatch`] or [`LabelError::IndexOutOfRange`].
    #[instrument(
        name = "core.label",
        err,
        skip(self, graph),
        fields(
            graph = %graph.identifier(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            score_cut = %self.score_cut,
        ),
    )]
    pub fn label(&self, graph: &ScoredGraph) -> Result<TrackLabels> {
        let kept = filter_edges(graph.edges(), graph.scores(), self.score_cut)
            .map_err(|error| wrap_graph_error(graph, error))?;
        let labels = label_components(graph.node_count(), &kept)
            .map_err(|error| wrap_graph_error(graph, error))?;
        debug!(
            surviving_edges = kept.len(),
            candidates = labels.candidate_count(),
            "graph labelled"
        );
        Ok(labels)
    }

    /// Labels `graph` and attaches the labels to it.
    ///
    /// On error the graph is left exactly as it was.
    ///
    /// # Errors
    /// Returns the same errors as [`Self::label`].
    pub fn label_in_place(&self, graph: &mut ScoredGraph) -> Result<()> {
        let labels = self.label(graph)?;
        graph.attach_labels(labels);
        Ok(())
    }

    /// Labels every graph in `graphs`, returning one result per graph in input
    /// order.
    ///
    /// The batch never stops early; deciding what a failure means for the run
    /// is left to the caller (see [`TrackBuildError::is_batch_fatal`]).
    ///
    /// # Examples
    /// ```
    /// use trackbuild_core::{Edge, ScoredGraph, TrackBuilderConfig};
    ///
    /// let builder = TrackBuilderConfig::new().build().expect("defaults are valid");
    /// let mut graphs = vec![
    ///     ScoredGraph::new("ok", 2, vec![Edge::new(0, 1)], vec![0.9])?,
    ///     ScoredGraph::new("bad", 2, vec![Edge::new(0, 5)], vec![0.9])?,
    /// ];
    /// let outcomes = builder.label_batch(&mut graphs);
    /// assert!(outcomes[0].is_ok());
    /// assert!(outcomes[1].is_err());
    /// assert!(graphs[1].labels().is_none());
    /// # Ok::<(), trackbuild_core::LabelError>(())
    /// ```
    #[instrument(
        name = "core.label_batch",
        skip(self, graphs),
        fields(graphs = graphs.len(), parallel = self.parallel),
    )]
    pub fn label_batch(&self, graphs: &mut [ScoredGraph]) -> Vec<Result<()>> {
        let outcomes = self.dispatch(graphs);
        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        info!(
            labelled = outcomes.len() - failed,
            failed, "batch labelling completed"
        );
        outcomes
    }

    fn dispatch(&self, graphs: &mut [ScoredGraph]) -> Vec<Result<()>> {
        #[cfg(feature = "parallel")]
        {
            if self.parallel {
                return graphs
                    .par_iter_mut()
                    .map(|graph| self.label_in_place(graph))
                    .collect();
            }
        }
        graphs
            .iter_mut()
            .map(|graph| self.label_in_place(graph))
            .collect()
    }
}

fn wrap_graph_error(graph: &ScoredGraph, error: LabelError) -> TrackBuildError {
    TrackBuildError::Graph {
        identifier: graph.shared_identifier(),
        error,
    }
}
