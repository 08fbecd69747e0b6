//! Property-based checks for edge filtering and component labelling.
//!
//! Labels are compared against a breadth-first reachability oracle, which
//! numbers components by their smallest hit exactly as the labeller does, so
//! equivalence reduces to equality of the two label vectors.

use std::collections::VecDeque;

use proptest::prelude::*;
use proptest::test_runner::TestCaseResult;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::label_components;
use crate::test_utils::suite_proptest_config;
use crate::{Edge, ScoreCut, filter_edges};

#[derive(Clone, Debug)]
struct Fixture {
    node_count: usize,
    edges: Vec<Edge>,
    scores: Vec<f32>,
}

fn fixture_strategy() -> impl Strategy<Value = Fixture> {
    (0usize..48)
        .prop_flat_map(|node_count| {
            let edges = if node_count == 0 {
                Just(Vec::new()).boxed()
            } else {
                prop::collection::vec((0..node_count, 0..node_count, 0.0f32..1.0), 0..160).boxed()
            };
            (Just(node_count), edges)
        })
        .prop_map(|(node_count, raw)| Fixture {
            node_count,
            edges: raw
                .iter()
                .map(|&(source, target, _)| Edge::new(source, target))
                .collect(),
            scores: raw.iter().map(|&(_, _, score)| score).collect(),
        })
}

fn random_fixture(rng: &mut SmallRng, node_count: usize, edge_count: usize) -> Fixture {
    let edges = (0..edge_count)
        .map(|_| Edge::new(rng.gen_range(0..node_count), rng.gen_range(0..node_count)))
        .collect();
    let scores = (0..edge_count).map(|_| rng.r#gen::<f32>()).collect();
    Fixture {
        node_count,
        edges,
        scores,
    }
}

fn reachability_oracle(node_count: usize, edges: &[Edge]) -> Vec<u64> {
    let mut adjacency = vec![Vec::new(); node_count];
    for edge in edges {
        adjacency[edge.source()].push(edge.target());
        adjacency[edge.target()].push(edge.source());
    }

    let mut labels: Vec<Option<u64>> = vec![None; node_count];
    let mut next = 0u64;
    for start in 0..node_count {
        if labels[start].is_some() {
            continue;
        }
        labels[start] = Some(next);
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for &neighbour in &adjacency[node] {
                if labels[neighbour].is_none() {
                    labels[neighbour] = Some(next);
                    queue.push_back(neighbour);
                }
            }
        }
        next += 1;
    }
    labels.into_iter().flatten().collect()
}

fn labels_at(fixture: &Fixture, cut: f32) -> Vec<u64> {
    let cut = ScoreCut::new(cut).expect("finite cut");
    let kept = filter_edges(&fixture.edges, &fixture.scores, cut).expect("aligned fixture");
    label_components(fixture.node_count, &kept)
        .expect("fixture edges are in range")
        .labels()
        .iter()
        .map(|id| id.get())
        .collect()
}

fn run_oracle_equivalence(fixture: &Fixture, cut: f32) -> TestCaseResult {
    let score_cut = ScoreCut::new(cut).expect("finite cut");
    let kept = filter_edges(&fixture.edges, &fixture.scores, score_cut).expect("aligned fixture");
    let labels = label_components(fixture.node_count, &kept).expect("fixture edges are in range");

    prop_assert_eq!(labels.len(), fixture.node_count);
    prop_assert!(labels.is_canonical());
    prop_assert!(
        labels
            .labels()
            .iter()
            .all(|id| usize::try_from(id.get()).is_ok_and(|value| value < labels.candidate_count()))
    );
    let raw: Vec<u64> = labels.labels().iter().map(|id| id.get()).collect();
    prop_assert_eq!(raw, reachability_oracle(fixture.node_count, &kept));
    Ok(())
}

fn run_threshold_monotonicity(fixture: &Fixture, low: f32, high: f32) -> TestCaseResult {
    let (low, high) = if low <= high { (low, high) } else { (high, low) };
    let coarse = labels_at(fixture, low);
    let fine = labels_at(fixture, high);
    for left in 0..fixture.node_count {
        for right in (left + 1)..fixture.node_count {
            if fine[left] == fine[right] {
                prop_assert_eq!(
                    coarse[left],
                    coarse[right],
                    "hits {} and {} joined at cut {} but split at cut {}",
                    left,
                    right,
                    high,
                    low
                );
            }
        }
    }
    Ok(())
}

fn run_order_independence(fixture: &Fixture, cut: f32, seed: u64) -> TestCaseResult {
    let mut paired: Vec<(Edge, f32)> = fixture
        .edges
        .iter()
        .copied()
        .zip(fixture.scores.iter().copied())
        .collect();
    paired.shuffle(&mut SmallRng::seed_from_u64(seed));
    let shuffled = Fixture {
        node_count: fixture.node_count,
        edges: paired.iter().map(|(edge, _)| *edge).collect(),
        scores: paired.iter().map(|(_, score)| *score).collect(),
    };

    let first = labels_at(fixture, cut);
    prop_assert_eq!(&first, &labels_at(fixture, cut));
    prop_assert_eq!(first, labels_at(&shuffled, cut));
    Ok(())
}

proptest! {
    #![proptest_config(suite_proptest_config(256))]

    #[test]
    fn labels_match_reachability_oracle(fixture in fixture_strategy(), cut in 0.0f32..1.0) {
        run_oracle_equivalence(&fixture, cut)?;
    }

    #[test]
    fn raising_the_cut_never_merges(
        fixture in fixture_strategy(),
        low in 0.0f32..1.0,
        high in 0.0f32..1.0,
    ) {
        run_threshold_monotonicity(&fixture, low, high)?;
    }

    #[test]
    fn labels_are_deterministic_under_edge_shuffles(
        fixture in fixture_strategy(),
        cut in 0.0f32..1.0,
        seed in any::<u64>(),
    ) {
        run_order_independence(&fixture, cut, seed)?;
    }
}

#[rstest::rstest]
#[case::sparse(42, 200, 150)]
#[case::dense(999, 64, 2_000)]
#[case::near_tree(7777, 500, 499)]
fn seeded_fixtures_hold_all_properties(
    #[case] seed: u64,
    #[case] node_count: usize,
    #[case] edge_count: usize,
) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let fixture = random_fixture(&mut rng, node_count, edge_count);
    for cut in [0.0, 0.5, 0.8, 0.95] {
        run_oracle_equivalence(&fixture, cut).expect("oracle equivalence must hold");
        run_order_independence(&fixture, cut, seed).expect("order independence must hold");
    }
    run_threshold_monotonicity(&fixture, 0.3, 0.9).expect("monotonicity must hold");
}
