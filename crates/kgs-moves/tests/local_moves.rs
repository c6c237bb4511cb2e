use std::collections::BTreeSet;

use kgs_core::{KgsError, VertexId};
use kgs_graph::{invariant_hash, ColorFilter, ColoredMultigraph};
use kgs_moves::{
    EdgeBundle, InSplit, InSplitInverse, Move, OutSplit, OutSplitInverse, Reduction,
    ReductionInverse, SinkDelete, SinkDeleteInverse, VertexPair, VertexPartition,
};

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

fn set(raws: &[u64]) -> BTreeSet<VertexId> {
    raws.iter().map(|raw| v(*raw)).collect()
}

fn sorted_out(graph: &ColoredMultigraph, vertex: VertexId) -> Vec<VertexId> {
    let mut out = graph.out_neighbors(vertex, ColorFilter::All).unwrap();
    out.sort();
    out
}

fn sorted_in(graph: &ColoredMultigraph, vertex: VertexId) -> Vec<VertexId> {
    let mut incoming = graph.in_neighbors(vertex, ColorFilter::All).unwrap();
    incoming.sort();
    incoming
}

#[test]
fn sink_delete_finds_only_true_sinks() {
    let mut g = graph(&[(1, 2), (1, 3), (3, 2)]);
    let before = invariant_hash(&g);

    let mut sinks = SinkDelete::new(&mut g).unwrap();
    assert_eq!(sinks.viable_components(), &[v(2)]);
    assert!(sinks.is_active());
    let sources = sinks.apply(&v(2)).unwrap();
    assert_eq!(sources, vec![v(1), v(3)]);
    assert_eq!(g.vertex_count(), 2);
    assert_eq!(g.edge_count(), 1);

    let sink = SinkDeleteInverse::new(&mut g).unwrap().apply(&sources).unwrap();
    assert_eq!(sink, v(4), "fresh ids are never reused");
    assert_eq!(invariant_hash(&g), before);
}

#[test]
fn sink_delete_rejects_isolated_vertices_and_empty_sources() {
    let mut g = graph(&[(1, 2)]);
    g.add_vertex(Some(v(7))).unwrap();

    let sinks = SinkDelete::new(&mut g).unwrap();
    assert_eq!(sinks.viable_components(), &[v(2)]);
    assert!(!sinks.is_viable(&v(7)).unwrap());
    let err = sinks.is_viable(&v(9)).unwrap_err();
    assert!(matches!(&err, KgsError::NotFound(info) if info.code == "unknown-vertex"));

    let inverse = SinkDeleteInverse::new(&mut g).unwrap();
    assert_eq!(inverse.viable_components().len(), 3);
    let err = inverse.is_viable(&Vec::new()).unwrap_err();
    assert!(matches!(&err, KgsError::InvalidArgument(info) if info.code == "malformed-component"));
}

#[test]
fn repeated_sources_give_parallel_edges() {
    let mut g = graph(&[(1, 1)]);
    let sink = SinkDeleteInverse::new(&mut g)
        .unwrap()
        .apply(&vec![v(1), v(1)])
        .unwrap();
    assert_eq!(g.edge_multiplicity(v(1), sink, 0).unwrap(), 2);
    assert_eq!(SinkDelete::new(&mut g).unwrap().apply(&sink).unwrap(), vec![v(1), v(1)]);
}

#[test]
fn reduction_collapses_a_single_in_edge() {
    let mut g = graph(&[(1, 2), (2, 3), (2, 3), (3, 1)]);
    let before = invariant_hash(&g);

    let mut reduction = Reduction::new(&mut g).unwrap();
    assert_eq!(reduction.viable_components(), &[v(1), v(2)]);
    let bundle = reduction.apply(&v(2)).unwrap();
    assert_eq!(
        bundle,
        EdgeBundle {
            source: v(1),
            target: v(3),
            multiplicity: 2,
        }
    );
    assert_eq!(g.edge_multiplicity(v(1), v(3), 0).unwrap(), 2);
    assert_eq!((g.vertex_count(), g.edge_count()), (2, 3));

    let middle = ReductionInverse::new(&mut g).unwrap().apply(&bundle).unwrap();
    assert_eq!(g.edge_multiplicity(middle, v(3), 0).unwrap(), 2);
    assert_eq!(invariant_hash(&g), before);
}

#[test]
fn reduction_skips_loops_and_fan_outs() {
    let mut g = graph(&[(1, 2), (2, 2), (3, 4), (4, 1), (4, 3)]);
    let reduction = Reduction::new(&mut g).unwrap();
    // 2 only leads to itself, 4 fans out to two targets
    assert_eq!(reduction.viable_components(), &[v(1), v(3)]);
    assert!(!reduction.is_viable(&v(2)).unwrap());
    assert!(!reduction.is_viable(&v(4)).unwrap());
}

#[test]
fn reduction_inverse_checks_the_bundle() {
    let mut g = graph(&[(1, 2), (2, 1)]);
    let mut inverse = ReductionInverse::new(&mut g).unwrap();
    assert_eq!(inverse.viable_components().len(), 2);
    assert!(inverse.viable_components().iter().all(|bundle| bundle.multiplicity == 1));

    let empty = EdgeBundle {
        source: v(1),
        target: v(2),
        multiplicity: 0,
    };
    let err = inverse.is_viable(&empty).unwrap_err();
    assert!(matches!(&err, KgsError::InvalidArgument(info) if info.code == "malformed-component"));

    let too_many = EdgeBundle {
        multiplicity: 3,
        ..empty
    };
    assert!(!inverse.is_viable(&too_many).unwrap());
    let err = inverse.action(&too_many).unwrap_err();
    assert_eq!(err.code(), "edge-not-found");
    assert_eq!(g.edge_count(), 2);
}

#[test]
fn in_split_partitions_cover_distinct_in_neighbors() {
    let mut g = graph(&[(1, 3), (2, 3), (3, 4), (4, 1), (4, 2), (4, 4), (1, 4)]);
    let split = InSplit::new(&mut g).unwrap();
    assert!(split.is_active());
    for partition in split.viable_components() {
        let neighbors: BTreeSet<VertexId> = split
            .graph()
            .in_neighbors(partition.vertex, ColorFilter::All)
            .unwrap()
            .into_iter()
            .collect();
        assert!(!partition.e1.is_empty() && !partition.e2.is_empty());
        assert!(partition.e1.is_disjoint(&partition.e2));
        let union: BTreeSet<VertexId> = partition.e1.union(&partition.e2).copied().collect();
        assert_eq!(union, neighbors);
    }
}

#[test]
fn in_split_duplicates_out_edges_and_merges_back() {
    let mut g = graph(&[(1, 3), (2, 3), (3, 4), (4, 1), (4, 2)]);
    let before = invariant_hash(&g);
    let partition = VertexPartition {
        vertex: v(3),
        e1: set(&[1]),
        e2: set(&[2]),
    };

    let mut split = InSplit::new(&mut g).unwrap();
    assert_eq!(split.viable_components(), &[partition.clone()]);
    let pair = split.apply(&partition).unwrap();
    assert_eq!(
        pair,
        VertexPair {
            first: v(5),
            second: v(6),
        }
    );
    assert!(!g.contains_vertex(v(3)));
    assert_eq!(sorted_out(&g, pair.first), vec![v(4)]);
    assert_eq!(sorted_out(&g, pair.second), vec![v(4)]);
    assert_eq!(sorted_in(&g, pair.first), vec![v(1)]);
    assert_eq!(sorted_in(&g, pair.second), vec![v(2)]);
    assert_eq!((g.vertex_count(), g.edge_count()), (5, 6));

    let mut merge = InSplitInverse::new(&mut g).unwrap();
    assert_eq!(merge.viable_components(), &[pair]);
    let restored = merge.apply(&pair).unwrap();
    assert_eq!(restored.e1, set(&[1]));
    assert_eq!(restored.e2, set(&[2]));
    assert_eq!(invariant_hash(&g), before);
}

#[test]
fn in_split_routes_a_self_loop_to_the_owning_copy() {
    let mut g = graph(&[(1, 1), (2, 1), (1, 2)]);
    let before = invariant_hash(&g);
    let partition = VertexPartition {
        vertex: v(1),
        e1: set(&[1]),
        e2: set(&[2]),
    };

    let pair = InSplit::new(&mut g).unwrap().apply(&partition).unwrap();
    let (first, second) = (pair.first, pair.second);
    assert_eq!(g.edge_count(), 5);
    assert_eq!(g.edge_multiplicity(first, first, 0).unwrap(), 1);
    assert_eq!(g.edge_multiplicity(second, first, 0).unwrap(), 1);
    assert_eq!(sorted_out(&g, first), sorted_out(&g, second));
    assert_eq!(sorted_in(&g, second), vec![v(2)]);

    let restored = InSplitInverse::new(&mut g).unwrap().apply(&pair).unwrap();
    assert_eq!(restored.e1, BTreeSet::from([restored.vertex]));
    assert_eq!(restored.e2, set(&[2]));
    assert_eq!(invariant_hash(&g), before);
}

#[test]
fn out_split_duplicates_in_edges_and_merges_back() {
    let mut g = graph(&[(3, 1), (3, 2), (4, 3), (1, 4), (2, 4)]);
    let before = invariant_hash(&g);
    let partition = VertexPartition {
        vertex: v(3),
        e1: set(&[1]),
        e2: set(&[2]),
    };

    let mut split = OutSplit::new(&mut g).unwrap();
    assert_eq!(split.viable_components(), &[partition.clone()]);
    let pair = split.apply(&partition).unwrap();
    assert_eq!(sorted_in(&g, pair.first), vec![v(4)]);
    assert_eq!(sorted_in(&g, pair.second), vec![v(4)]);
    assert_eq!(sorted_out(&g, pair.first), vec![v(1)]);
    assert_eq!(sorted_out(&g, pair.second), vec![v(2)]);
    assert_eq!(g.edge_count(), 6);

    let mut merge = OutSplitInverse::new(&mut g).unwrap();
    assert!(merge.viable_components().contains(&pair));
    merge.apply(&pair).unwrap();
    assert_eq!(invariant_hash(&g), before);
}

#[test]
fn merge_requires_matching_shared_sides() {
    let mut g = graph(&[(1, 3), (2, 4), (3, 5), (4, 5), (4, 1)]);
    let merge = InSplitInverse::new(&mut g).unwrap();
    let pair = VertexPair {
        first: v(3),
        second: v(4),
    };
    assert!(!merge.is_viable(&pair).unwrap());
    assert!(merge.viable_components().is_empty());

    let same = VertexPair {
        first: v(3),
        second: v(3),
    };
    let err = merge.is_viable(&same).unwrap_err();
    assert_eq!(err.code(), "malformed-component");
}

#[test]
fn split_action_with_a_bad_partition_is_fatal() {
    let mut g = graph(&[(1, 3), (2, 3), (3, 1)]);
    let overlapping = VertexPartition {
        vertex: v(3),
        e1: set(&[1]),
        e2: set(&[1, 2]),
    };

    let mut split = InSplit::new(&mut g).unwrap();
    assert!(!split.is_viable(&overlapping).unwrap());
    let err = split.action(&overlapping).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(&err, KgsError::InvariantViolation(info) if info.code == "partition-not-covering"));
    assert!(g.contains_vertex(v(3)));
    assert_eq!(g.edge_count(), 3);

    let err = InSplit::new(&mut g).unwrap().apply(&overlapping).unwrap_err();
    assert!(matches!(&err, KgsError::PreconditionFailed(info) if info.code == "non-viable-component"));
}
