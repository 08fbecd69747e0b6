//! Error types for the trackbuild core library.
//!
//! Defines error enums exposed by the public API and a convenient result alias.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::builder::ExecutionStrategy;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced while filtering or labelling a single graph.
///
/// Labelling is all-or-nothing: when any of these is returned no labels are
/// attached to the graph.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum LabelError {
    /// Edge and score sequences have different lengths.
    #[error("graph has {edges} edges but {scores} scores")]
    ShapeMismatch {
        /// Number of edges supplied.
        edges: usize,
        /// Number of scores supplied.
        scores: usize,
    },
    /// The two rows of a signed edge index have different lengths.
    #[error("edge index has {sources} sources but {targets} targets")]
    MalformedEdgeIndex {
        /// Length of the source row.
        sources: usize,
        /// Length of the target row.
        targets: usize,
    },
    /// An edge referenced a node outside `0..node_count`.
    #[error("edge {edge} references node {node}, but node_count is {node_count}")]
    IndexOutOfRange {
        /// Position of the offending edge in the list handed to the labeller.
        edge: usize,
        /// The node index as supplied; negative values come from signed inputs.
        node: i64,
        /// The number of nodes in the graph.
        node_count: usize,
    },
    /// A stored graph declares more nodes than the labeller accepts.
    #[error("node_count {node_count} exceeds the limit of {limit}")]
    NodeCountTooLarge {
        /// Node count declared by the graph.
        node_count: usize,
        /// Largest accepted node count.
        limit: usize,
    },
    /// A scalar argument was outside its domain.
    #[error("invalid {argument}: {value}")]
    InvalidArgument {
        /// Name of the rejected argument.
        argument: &'static str,
        /// Rendered value that was rejected.
        value: String,
    },
}

define_error_codes! {
    /// Stable codes describing [`LabelError`] variants.
    enum LabelErrorCode for LabelError {
        /// Edge and score sequences have different lengths.
        ShapeMismatch => ShapeMismatch { .. } => "LABEL_SHAPE_MISMATCH",
        /// The two rows of a signed edge index have different lengths.
        MalformedEdgeIndex => MalformedEdgeIndex { .. } => "LABEL_MALFORMED_EDGE_INDEX",
        /// An edge referenced a node outside `0..node_count`.
        IndexOutOfRange => IndexOutOfRange { .. } => "LABEL_INDEX_OUT_OF_RANGE",
        /// A stored graph declares more nodes than the labeller accepts.
        NodeCountTooLarge => NodeCountTooLarge { .. } => "LABEL_NODE_COUNT_TOO_LARGE",
        /// A scalar argument was outside its domain.
        InvalidArgument => InvalidArgument { .. } => "LABEL_INVALID_ARGUMENT",
    }
}

/// Error type produced when constructing or running [`crate::TrackBuilder`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TrackBuildError {
    /// The configured score cut is not a finite number.
    #[error("score_cut must be finite (got {got})")]
    InvalidScoreCut {
        /// Rendered score cut supplied by the caller.
        got: String,
    },
    /// The requested execution strategy is unavailable in the current build.
    #[error("the requested execution strategy {requested:?} is not available in this build")]
    BackendUnavailable {
        /// Strategy that could not be satisfied by the current build.
        requested: ExecutionStrategy,
    },
    /// Filtering or labelling a graph failed.
    #[error("graph `{identifier}` failed: {error}")]
    Graph {
        /// Identifier of the graph that failed.
        identifier: Arc<str>,
        #[source]
        /// Underlying labelling error.
        error: LabelError,
    },
}

define_error_codes! {
    /// Stable codes describing [`TrackBuildError`] variants.
    enum TrackBuildErrorCode for TrackBuildError {
        /// The configured score cut is not a finite number.
        InvalidScoreCut => InvalidScoreCut { .. } => "TRACKBUILD_INVALID_SCORE_CUT",
        /// The requested execution strategy is unavailable in the current build.
        BackendUnavailable => BackendUnavailable { .. } => "TRACKBUILD_BACKEND_UNAVAILABLE",
        /// Filtering or labelling a graph failed.
        GraphFailure => Graph { .. } => "TRACKBUILD_GRAPH_FAILURE",
    }
}

impl TrackBuildError {
    /// Retrieve the inner [`LabelErrorCode`] when the error originated in a graph.
    pub const fn label_code(&self) -> Option<LabelErrorCode> {
        match self {
            Self::Graph { error, .. } => Some(error.code()),
            _ => None,
        }
    }

    /// Reports whether a batch should stop rather than skip the failing graph.
    ///
    /// Configuration problems and invalid arguments are programming or setup
    /// errors and abort the batch. Shape and index failures only affect the
    /// graph that produced them.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use trackbuild_core::{LabelError, TrackBuildError};
    ///
    /// let skippable = TrackBuildError::Graph {
    ///     identifier: Arc::from("event0001"),
    ///     error: LabelError::ShapeMismatch { edges: 2, scores: 1 },
    /// };
    /// assert!(!skippable.is_batch_fatal());
    /// ```
    #[must_use]
    pub const fn is_batch_fatal(&self) -> bool {
        match self {
            Self::InvalidScoreCut { .. } | Self::BackendUnavailable { .. } => true,
            Self::Graph { error, .. } => matches!(error, LabelError::InvalidArgument { .. }),
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, TrackBuildError>;
