//! Edge filtering by learned connection score.

use std::fmt;

use tracing::debug;

use crate::{error::LabelError, graph::Edge};

/// Score threshold above which an edge is trusted to join its endpoints.
///
/// The cut must be finite. Values outside `[0, 1]` are accepted; a cut below
/// every score keeps all edges and a cut above every score keeps none.
///
/// # Examples
/// ```
/// use trackbuild_core::ScoreCut;
///
/// let cut = ScoreCut::new(0.8)?;
/// assert_eq!(cut.get(), 0.8);
/// assert!(ScoreCut::new(f32::NAN).is_err());
/// # Ok::<(), trackbuild_core::LabelError>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct ScoreCut(f32);

impl ScoreCut {
    /// Validates and wraps a raw threshold.
    ///
    /// # Errors
    /// Returns [`LabelError::InvalidArgument`] when `value` is NaN or infinite.
    pub fn new(value: f32) -> Result<Self, LabelError> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(LabelError::InvalidArgument {
                argument: "score_cut",
                value: value.to_string(),
            })
        }
    }

    /// Returns the raw threshold.
    #[must_use]
    #[rustfmt::skip]
    pub const fn get(self) -> f32 { self.0 }

    /// Returns `true` when `score` is strictly greater than the cut.
    ///
    /// NaN scores never pass.
    #[must_use]
    pub fn admits(self, score: f32) -> bool {
        score > self.0
    }
}

impl fmt::Display for ScoreCut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Returns the edges whose score is strictly greater than `cut`, in input
/// order.
///
/// # Errors
/// Returns [`LabelError::ShapeMismatch`] when `edges` and `scores` differ in
/// length.
///
/// # Examples
/// ```
/// use trackbuild_core::{Edge, ScoreCut, filter_edges};
///
/// let edges = [Edge::new(0, 1), Edge::new(1, 2), Edge::new(2, 3)];
/// let kept = filter_edges(&edges, &[0.9, 0.3, 0.9], ScoreCut::new(0.8)?)?;
/// assert_eq!(kept, vec![Edge::new(0, 1), Edge::new(2, 3)]);
/// # Ok::<(), trackbuild_core::LabelError>(())
/// ```
pub fn filter_edges(edges: &[Edge], scores: &[f32], cut: ScoreCut) -> Result<Vec<Edge>, LabelError> {
    if edges.len() != scores.len() {
        return Err(LabelError::ShapeMismatch {
            edges: edges.len(),
            scores: scores.len(),
        });
    }

    let kept: Vec<Edge> = edges
        .iter()
        .zip(scores)
        .filter_map(|(edge, &score)| cut.admits(score).then_some(*edge))
        .collect();

    debug!(
        kept = kept.len(),
        dropped = edges.len() - kept.len(),
        score_cut = %cut,
        "filtered edges by score"
    );
    Ok(kept)
}
