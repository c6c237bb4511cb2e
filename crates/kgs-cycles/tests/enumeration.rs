use std::collections::BTreeSet;

use kgs_core::{KgsError, RngHandle, VertexId};
use kgs_cycles::{CycleConfig, CycleFinder};
use kgs_graph::{gen_directed_cycle, gen_random_kgraph, ColorFilter, ColoredMultigraph};
use proptest::prelude::*;

fn v(raw: u64) -> VertexId {
    VertexId::from_raw(raw)
}

fn graph(edges: &[(u64, u64)]) -> ColoredMultigraph {
    let vertices: BTreeSet<u64> = edges.iter().flat_map(|(a, b)| [*a, *b]).collect();
    ColoredMultigraph::from_edges(
        vertices.into_iter().map(v),
        edges.iter().map(|(a, b)| (v(*a), v(*b), 0)),
        1,
    )
    .unwrap()
}

fn vertex_sets(finder: &CycleFinder) -> BTreeSet<BTreeSet<VertexId>> {
    finder
        .cycles()
        .iter()
        .map(|cycle| cycle.iter().copied().collect())
        .collect()
}

#[test]
fn triangle_has_one_cycle() {
    let finder = CycleFinder::new(&graph(&[(1, 2), (2, 3), (3, 1)])).unwrap();
    assert_eq!(finder.len(), 1);
    assert_eq!(finder.cycle(0).unwrap(), &[v(1), v(2), v(3)]);
    for raw in 1..=3 {
        assert_eq!(finder.cycles_at(v(raw)).unwrap(), &BTreeSet::from([0]));
    }
}

#[test]
fn disjoint_triangles_have_two_cycles() {
    let finder =
        CycleFinder::new(&graph(&[(1, 2), (2, 3), (3, 1), (4, 5), (5, 6), (6, 4)])).unwrap();
    assert_eq!(finder.len(), 2);
    let expected: BTreeSet<BTreeSet<VertexId>> = [
        [v(1), v(2), v(3)].into_iter().collect(),
        [v(4), v(5), v(6)].into_iter().collect(),
    ]
    .into_iter()
    .collect();
    assert_eq!(vertex_sets(&finder), expected);
}

#[test]
fn loops_and_parallel_edges_count_once() {
    let finder = CycleFinder::new(&graph(&[(1, 1), (1, 1), (1, 2), (1, 2), (2, 1)])).unwrap();
    assert_eq!(finder.len(), 2);
    let expected: BTreeSet<BTreeSet<VertexId>> = [
        [v(1)].into_iter().collect(),
        [v(1), v(2)].into_iter().collect(),
    ]
    .into_iter()
    .collect();
    assert_eq!(vertex_sets(&finder), expected);
    assert_eq!(finder.cycles_at(v(1)).unwrap().len(), 2);
    assert_eq!(finder.cycles_at(v(2)).unwrap().len(), 1);
}

#[test]
fn complete_digraph_cycle_count() {
    // K4 with both directions: 6 two-cycles, 8 triangles, 6 four-cycles
    let mut edges = Vec::new();
    for a in 0..4 {
        for b in 0..4 {
            if a != b {
                edges.push((a, b));
            }
        }
    }
    let finder = CycleFinder::new(&graph(&edges)).unwrap();
    assert_eq!(finder.len(), 20);
}

#[test]
fn acyclic_graph_is_empty() {
    let finder = CycleFinder::new(&graph(&[(1, 2), (1, 3), (3, 2)])).unwrap();
    assert!(finder.is_empty());
    assert!(finder.cycles_at(v(2)).unwrap().is_empty());
    assert_eq!(finder.cycles_at(v(9)).unwrap_err().code(), "unknown-vertex");
    assert_eq!(finder.cycle(0).unwrap_err().code(), "unknown-cycle");
}

#[test]
fn rejects_graphs_with_several_colors() {
    let graph = ColoredMultigraph::from_edges([v(0)], [(v(0), v(0), 1)], 2).unwrap();
    let err = CycleFinder::new(&graph).unwrap_err();
    assert!(matches!(&err, KgsError::PreconditionFailed(info) if info.code == "non-rank-one-graph"));
}

#[test]
fn detects_stale_enumerations() {
    let mut cycle = gen_directed_cycle(4).unwrap();
    let finder = CycleFinder::new(&cycle).unwrap();
    assert!(finder.is_current(&cycle));
    finder.ensure_current(&cycle).unwrap();

    cycle.add_edge(v(0), v(2), 0).unwrap();
    assert!(!finder.is_current(&cycle));
    let err = finder.ensure_current(&cycle).unwrap_err();
    assert_eq!(err.code(), "stale-cycles");
    assert!(!err.is_fatal());
}

#[test]
fn bounded_enumeration_fails_past_the_limit() {
    let graph = graph(&[(1, 1), (2, 2), (3, 3)]);
    assert_eq!(
        CycleFinder::with_config(&graph, &CycleConfig::bounded(3)).unwrap().len(),
        3
    );
    let err = CycleFinder::with_config(&graph, &CycleConfig::bounded(2)).unwrap_err();
    assert_eq!(err.code(), "cycle-limit-exceeded");
}

#[test]
fn config_defaults_to_unbounded() {
    let config: CycleConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, CycleConfig::default());
    assert_eq!(config.max_cycles, None);
}

/// Exhaustive search: every simple path from `start` through larger vertices
/// that closes back at `start`.
fn brute_force(graph: &ColoredMultigraph) -> BTreeSet<Vec<VertexId>> {
    fn extend(
        graph: &ColoredMultigraph,
        start: VertexId,
        path: &mut Vec<VertexId>,
        found: &mut BTreeSet<Vec<VertexId>>,
    ) {
        let last = path[path.len() - 1];
        let targets: BTreeSet<VertexId> = graph
            .out_neighbors(last, ColorFilter::All)
            .unwrap()
            .into_iter()
            .collect();
        for next in targets {
            if next == start {
                found.insert(path.clone());
            } else if next > start && !path.contains(&next) {
                path.push(next);
                extend(graph, start, path, found);
                path.pop();
            }
        }
    }

    let mut found = BTreeSet::new();
    for start in graph.vertices() {
        extend(graph, *start, &mut vec![*start], &mut found);
    }
    found
}

proptest! {
    #[test]
    fn matches_exhaustive_search(seed in any::<u64>(), vertices in 1usize..7, edges in 0usize..16) {
        let mut rng = RngHandle::from_seed(seed);
        let graph = gen_random_kgraph(vertices, edges, 1, &mut rng).unwrap();
        let finder = CycleFinder::new(&graph).unwrap();
        let enumerated: Vec<Vec<VertexId>> = finder.cycles().to_vec();
        let distinct: BTreeSet<Vec<VertexId>> = enumerated.iter().cloned().collect();
        prop_assert_eq!(distinct.len(), enumerated.len());
        prop_assert_eq!(distinct, brute_force(&graph));

        for vertex in graph.vertices() {
            for c in finder.cycles_at(*vertex).unwrap() {
                prop_assert!(finder.cycle(*c).unwrap().contains(vertex));
            }
        }
    }
}
