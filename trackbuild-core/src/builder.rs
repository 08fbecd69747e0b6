//! Builder utilities for configuring track building.
//!
//! Exposes the execution strategy selection surface and builder validation used before constructing [`TrackBuilder`] instances.

use crate::{Result, error::TrackBuildError, filter::ScoreCut, track_builder::TrackBuilder};

/// Score cut applied when none is configured.
pub const DEFAULT_SCORE_CUT: f32 = 0.8;

/// Indicates how [`TrackBuilder::label_batch`] distributes graphs.
///
/// `Auto` resolves deterministically: it selects `Parallel` when the
/// `parallel` feature is compiled in and `Sequential` otherwise. A single
/// graph is always labelled on the calling thread.
///
/// # Examples
/// ```
/// use trackbuild_core::ExecutionStrategy;
///
/// let strategy = ExecutionStrategy::Auto;
/// assert!(matches!(strategy, ExecutionStrategy::Auto));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Allow the library to select an appropriate strategy automatically.
    Auto,
    /// Label graphs one after another on the calling thread.
    Sequential,
    /// Label graphs concurrently on the rayon thread pool.
    Parallel,
}

/// Configures and constructs [`TrackBuilder`] instances.
///
/// # Examples
/// ```
/// use trackbuild_core::{ExecutionStrategy, TrackBuilderConfig};
///
/// let builder = TrackBuilderConfig::new()
///     .with_score_cut(0.5)
///     .with_execution_strategy(ExecutionStrategy::Sequential)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(builder.score_cut().get(), 0.5);
/// assert_eq!(builder.execution_strategy(), ExecutionStrategy::Sequential);
/// ```
#[derive(Debug, Clone)]
pub struct TrackBuilderConfig {
    score_cut: f32,
    execution_strategy: ExecutionStrategy,
}

impl Default for TrackBuilderConfig {
    fn default() -> Self {
        Self {
            score_cut: DEFAULT_SCORE_CUT,
            execution_strategy: ExecutionStrategy::Auto,
        }
    }
}

impl TrackBuilderConfig {
    /// Creates a builder populated with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the score cut.
    #[must_use]
    pub fn with_score_cut(mut self, score_cut: f32) -> Self {
        self.score_cut = score_cut;
        self
    }

    /// Returns the configured score cut.
    #[must_use]
    pub fn score_cut(&self) -> f32 {
        self.score_cut
    }

    /// Sets the execution strategy to use for batches.
    #[must_use]
    pub fn with_execution_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.execution_strategy = strategy;
        self
    }

    /// Returns the currently configured execution strategy.
    #[must_use]
    pub fn execution_strategy(&self) -> ExecutionStrategy {
        self.execution_strategy
    }

    /// Validates the configuration and constructs a [`TrackBuilder`].
    ///
    /// # Errors
    /// Returns [`TrackBuildError::InvalidScoreCut`] when the score cut is not
    /// finite and [`TrackBuildError::BackendUnavailable`] when `Parallel` is
    /// requested without the `parallel` feature.
    ///
    /// # Examples
    /// ```
    /// use trackbuild_core::{TrackBuildError, TrackBuilderConfig};
    ///
    /// let err = TrackBuilderConfig::new()
    ///     .with_score_cut(f32::NAN)
    ///     .build()
    ///     .expect_err("NaN is not a usable cut");
    /// assert!(matches!(err, TrackBuildError::InvalidScoreCut { .. }));
    /// ```
    pub fn build(self) -> Result<TrackBuilder> {
        let score_cut =
            ScoreCut::new(self.score_cut).map_err(|_| TrackBuildError::InvalidScoreCut {
                got: self.score_cut.to_string(),
            })?;
        let parallel = resolve_parallelism(self.execution_strategy)?;
        Ok(TrackBuilder::new(score_cut, self.execution_strategy, parallel))
    }
}

fn resolve_parallelism(strategy: ExecutionStrategy) -> Result<bool> {
    match strategy {
        ExecutionStrategy::Sequential => Ok(false),
        ExecutionStrategy::Auto => Ok(cfg!(feature = "parallel")),
        #[cfg(feature = "parallel")]
        ExecutionStrategy::Parallel => Ok(true),
        #[cfg(not(feature = "parallel"))]
        ExecutionStrategy::Parallel => Err(TrackBuildError::BackendUnavailable {
            requested: ExecutionStrategy::Parallel,
        }),
    }
}
