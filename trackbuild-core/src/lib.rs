//! Trackbuild core library.
//!
//! Turns scored hit graphs into track candidates: edges scoring above a cut
//! survive, and each connected component of the surviving graph becomes one
//! candidate. Candidates are numbered in increasing order of their smallest
//! hit index, so the output does not depend on edge order.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod error;
mod filter;
mod graph;
mod labeler;
mod labels;
#[cfg(test)]
mod test_utils;
mod track_builder;
mod union_find;

pub use crate::{
    builder::{DEFAULT_SCORE_CUT, ExecutionStrategy, TrackBuilderConfig},
    error::{LabelError, LabelErrorCode, Result, TrackBuildError, TrackBuildErrorCode},
    filter::{ScoreCut, filter_edges},
    graph::{Edge, MAX_NODE_COUNT, ScoredGraph},
    labeler::label_components,
    labels::{NonContiguousTrackIds, TrackId, TrackLabels},
    track_builder::TrackBuilder,
};
