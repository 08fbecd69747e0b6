//! Unit tests for connected-component labelling.

use rstest::rstest;

use super::label_components;
use crate::{Edge, LabelError};

fn edges(pairs: &[(usize, usize)]) -> Vec<Edge> {
    pairs.iter().copied().map(Edge::from).collect()
}

fn raw_labels(node_count: usize, pairs: &[(usize, usize)]) -> Vec<u64> {
    label_components(node_count, &edges(pairs))
        .expect("edges are in range")
        .labels()
        .iter()
        .map(|id| id.get())
        .collect()
}

#[rstest]
#[case::empty_graph(0, &[], &[])]
#[case::isolated_hits(3, &[], &[0, 1, 2])]
#[case::chain(4, &[(0, 1), (1, 2), (2, 3)], &[0, 0, 0, 0])]
#[case::two_pairs(4, &[(0, 1), (2, 3)], &[0, 0, 1, 1])]
#[case::self_loop(2, &[(0, 0)], &[0, 1])]
#[case::duplicate_edge(2, &[(0, 1), (0, 1)], &[0, 0])]
#[case::reversed_edge(3, &[(2, 0)], &[0, 1, 0])]
#[case::interleaved(6, &[(5, 1), (4, 0), (3, 1)], &[0, 1, 2, 1, 0, 1])]
fn labels_components_canonically(
    #[case] node_count: usize,
    #[case] pairs: &[(usize, usize)],
    #[case] expected: &[u64],
) {
    assert_eq!(raw_labels(node_count, pairs), expected);
}

#[rstest]
fn numbering_ignores_edge_order() {
    let forward = raw_labels(7, &[(6, 5), (0, 3), (2, 4), (3, 1)]);
    let backward = raw_labels(7, &[(3, 1), (2, 4), (0, 3), (6, 5)]);
    assert_eq!(forward, backward);
    assert_eq!(forward, vec![0, 0, 1, 0, 1, 2, 2]);
}

#[rstest]
fn candidate_count_matches_distinct_labels() {
    let labels = label_components(5, &edges(&[(0, 4), (1, 2)])).expect("edges are in range");
    assert_eq!(labels.candidate_count(), 3);
    assert_eq!(labels.candidate_sizes(), vec![2, 2, 1]);
    assert!(labels.is_canonical());
}

#[rstest]
#[case::source(3, &[(0, 1), (3, 1)], 1, 3)]
#[case::target(3, &[(0, 7)], 0, 7)]
#[case::empty_graph(0, &[(0, 0)], 0, 0)]
fn rejects_out_of_range_hits(
    #[case] node_count: usize,
    #[case] pairs: &[(usize, usize)],
    #[case] edge: usize,
    #[case] node: i64,
) {
    let err = label_components(node_count, &edges(pairs)).expect_err("edge is out of range");
    assert_eq!(
        err,
        LabelError::IndexOutOfRange {
            edge,
            node,
            node_count
        }
    );
}

#[rstest]
fn large_chain_is_one_candidate() {
    let pairs: Vec<(usize, usize)> = (1..50_000).map(|node| (node, node - 1)).collect();
    let labels = label_components(50_000, &edges(&pairs)).expect("edges are in range");
    assert_eq!(labels.candidate_count(), 1);
    assert!(labels.labels().iter().all(|id| id.get() == 0));
}
