//! Track-candidate labels produced by the component labeller.
//!
//! Provides the per-hit label vector and validation of the contiguity
//! constraint on track identifiers.

use std::collections::HashSet;
use thiserror::Error;

/// Per-hit track-candidate assignment for one graph.
///
/// Labels are contiguous in `0..candidate_count`. Labels produced by the
/// labeller are also canonical: candidates are numbered in increasing order of
/// their smallest hit index.
///
/// # Examples
/// ```
/// use trackbuild_core::{TrackId, TrackLabels};
///
/// let labels = TrackLabels::try_from_labels(vec![TrackId::new(0), TrackId::new(1), TrackId::new(0)])
///     .expect("labels are contiguous");
/// assert_eq!(labels.len(), 3);
/// assert_eq!(labels.candidate_count(), 2);
/// assert_eq!(labels.candidate_sizes(), vec![2, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackLabels {
    labels: Vec<TrackId>,
    candidate_count: usize,
}

/// Error returned when track identifiers are not contiguous starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NonContiguousTrackIds {
    /// The labels do not include track `0`.
    #[error("track identifiers must include 0")]
    MissingZero,
    /// The labels skip identifiers.
    #[error("track identifiers must be contiguous without gaps")]
    Gap,
    /// The labels require identifiers beyond the host pointer width.
    #[error("track identifiers exceed the host pointer-width limit")]
    Overflow,
}

impl TrackLabels {
    pub(crate) fn from_canonical(labels: Vec<TrackId>, candidate_count: usize) -> Self {
        Self {
            labels,
            candidate_count,
        }
    }

    /// Attempts to build labels from an arbitrary identifier vector, such as
    /// labels read back from storage.
    ///
    /// An empty vector is accepted and yields `candidate_count == 0`.
    ///
    /// # Errors
    /// Returns [`NonContiguousTrackIds::MissingZero`] when track `0` is absent,
    /// [`NonContiguousTrackIds::Gap`] when identifiers skip values, and
    /// [`NonContiguousTrackIds::Overflow`] when an identifier does not fit the
    /// host pointer width.
    ///
    /// # Examples
    /// ```
    /// use trackbuild_core::{NonContiguousTrackIds, TrackId, TrackLabels};
    ///
    /// let err = TrackLabels::try_from_labels(vec![TrackId::new(0), TrackId::new(2)])
    ///     .expect_err("track 1 is missing");
    /// assert_eq!(err, NonContiguousTrackIds::Gap);
    /// ```
    pub fn try_from_labels(labels: Vec<TrackId>) -> Result<Self, NonContiguousTrackIds> {
        if labels.is_empty() {
            return Ok(Self {
                labels,
                candidate_count: 0,
            });
        }

        let mut seen = HashSet::new();
        let mut max_id = 0usize;
        for id in &labels {
            let value = usize::try_from(id.get()).map_err(|_| NonContiguousTrackIds::Overflow)?;
            seen.insert(value);
            max_id = max_id.max(value);
        }

        if !seen.contains(&0) {
            return Err(NonContiguousTrackIds::MissingZero);
        }

        let expected = max_id
            .checked_add(1)
            .ok_or(NonContiguousTrackIds::Overflow)?;
        if seen.len() != expected {
            return Err(NonContiguousTrackIds::Gap);
        }

        Ok(Self {
            labels,
            candidate_count: expected,
        })
    }

    /// Returns the label of every hit, indexed by hit.
    #[must_use]
    pub fn labels(&self) -> &[TrackId] {
        &self.labels
    }

    /// Returns the label of `hit`, if it exists.
    #[must_use]
    pub fn get(&self, hit: usize) -> Option<TrackId> {
        self.labels.get(hit).copied()
    }

    /// Returns the number of labelled hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` when no hits were labelled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Counts how many distinct track candidates exist.
    #[must_use]
    #[rustfmt::skip]
    pub fn candidate_count(&self) -> usize { self.candidate_count }

    /// Returns the number of hits in each candidate, indexed by track id.
    #[must_use]
    pub fn candidate_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.candidate_count];
        for id in &self.labels {
            if let Some(size) = usize::try_from(id.get())
                .ok()
                .and_then(|index| sizes.get_mut(index))
            {
                *size += 1;
            }
        }
        sizes
    }

    /// Reports whether candidates are numbered by first appearance, which is
    /// the ordering the labeller guarantees.
    ///
    /// # Examples
    /// ```
    /// use trackbuild_core::{TrackId, TrackLabels};
    ///
    /// let ids = |raw: &[u64]| raw.iter().copied().map(TrackId::new).collect::<Vec<_>>();
    /// let canonical = TrackLabels::try_from_labels(ids(&[0, 0, 1])).expect("contiguous");
    /// let shuffled = TrackLabels::try_from_labels(ids(&[1, 1, 0])).expect("contiguous");
    /// assert!(canonical.is_canonical());
    /// assert!(!shuffled.is_canonical());
    /// ```
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        let mut next = 0u64;
        for id in &self.labels {
            if id.get() == next {
                next += 1;
            } else if id.get() > next {
                return false;
            }
        }
        true
    }
}

/// Identifier assigned to a track candidate.
///
/// # Examples
/// ```
/// use trackbuild_core::TrackId;
///
/// let id = TrackId::new(4);
/// assert_eq!(id.get(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(u64);

impl TrackId {
    /// Creates a new track identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Returns the underlying numeric identifier.
    #[rustfmt::skip]
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ids(raw: &[u64]) -> Vec<TrackId> {
        raw.iter().copied().map(TrackId::new).collect()
    }

    #[rstest]
    #[case::empty(&[], 0)]
    #[case::single(&[0], 1)]
    #[case::shared(&[0, 0, 0], 1)]
    #[case::interleaved(&[0, 1, 0, 2, 1], 3)]
    fn try_from_labels_counts_candidates(#[case] raw: &[u64], #[case] expected: usize) {
        let labels = TrackLabels::try_from_labels(ids(raw)).expect("labels are contiguous");
        assert_eq!(labels.candidate_count(), expected);
        assert_eq!(labels.len(), raw.len());
    }

    #[rstest]
    #[case::missing_zero(&[1, 2], NonContiguousTrackIds::MissingZero)]
    #[case::gap(&[0, 0, 3], NonContiguousTrackIds::Gap)]
    #[case::overflow(&[0, u64::MAX], NonContiguousTrackIds::Overflow)]
    fn try_from_labels_rejects_invalid_ids(
        #[case] raw: &[u64],
        #[case] expected: NonContiguousTrackIds,
    ) {
        let err = TrackLabels::try_from_labels(ids(raw)).expect_err("labels must be rejected");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn candidate_sizes_counts_hits_per_track() {
        let labels = TrackLabels::try_from_labels(ids(&[0, 1, 1, 2, 1])).expect("contiguous");
        assert_eq!(labels.candidate_sizes(), vec![1, 3, 1]);
        assert_eq!(labels.get(2), Some(TrackId::new(1)));
        assert_eq!(labels.get(5), None);
    }
}
