use std::collections::BTreeSet;

use kgs_core::VertexId;
use kgs_cycles::{CycleFinder, CycleIntersection};
use kgs_graph::ColoredMultigraph;

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

fn index_of(intersection: &CycleIntersection, members: &[u64]) -> usize {
    let wanted: BTreeSet<VertexId> = members.iter().map(|raw| v(*raw)).collect();
    intersection
        .finder()
        .cycles()
        .iter()
        .position(|cycle| cycle.iter().copied().collect::<BTreeSet<_>>() == wanted)
        .unwrap()
}

/// Three two-cycles strung along 1 - 2 - 3 - 4.
fn ladder() -> (ColoredMultigraph, CycleIntersection) {
    let graph = graph(&[(1, 2), (2, 1), (2, 3), (3, 2), (3, 4), (4, 3)]);
    let intersection = CycleIntersection::build(&graph).unwrap();
    (graph, intersection)
}

#[test]
fn adjacent_cycles_share_witnesses() {
    let (_, intersection) = ladder();
    let a = index_of(&intersection, &[1, 2]);
    let b = index_of(&intersection, &[2, 3]);
    let c = index_of(&intersection, &[3, 4]);
    assert_eq!(intersection.cycle_count(), 3);
    assert_eq!(intersection.intersection_count(), 2);
    assert_eq!(intersection.intersect(a, None).unwrap(), vec![b]);

    let mut around_b = intersection.intersect(b, None).unwrap();
    around_b.sort_unstable();
    let mut expected = vec![a, c];
    expected.sort_unstable();
    assert_eq!(around_b, expected);

    let skip_two = |vertex: VertexId| vertex == v(2);
    assert_eq!(intersection.intersect(b, Some(&skip_two)).unwrap(), vec![c]);
    assert!(intersection.intersect(a, Some(&skip_two)).unwrap().is_empty());
    assert_eq!(intersection.chains().len(), 1);
}

#[test]
fn shared_vertices_follow_the_probe_cycle() {
    let (_, intersection) = ladder();
    let a = index_of(&intersection, &[1, 2]);
    let b = index_of(&intersection, &[2, 3]);
    let c = index_of(&intersection, &[3, 4]);
    assert_eq!(intersection.intersect_vertices(a, b).unwrap(), vec![v(2)]);
    assert_eq!(intersection.intersect_vertices(b, a).unwrap(), vec![v(2)]);
    assert!(intersection.intersect_vertices(a, c).unwrap().is_empty());
    assert_eq!(intersection.intersect_vertices(b, b).unwrap().len(), 2);
    assert!(intersection.scratch_is_clear());
}

#[test]
fn disjoint_triangles_do_not_intersect() {
    let graph = graph(&[(1, 2), (2, 3), (3, 1), (4, 5), (5, 6), (6, 4)]);
    let intersection = CycleIntersection::build(&graph).unwrap();
    assert_eq!(intersection.cycle_count(), 2);
    assert!(intersection.intersect_vertices(0, 1).unwrap().is_empty());
    assert!(intersection.intersect(0, None).unwrap().is_empty());
    assert_eq!(intersection.intersection_count(), 0);
    assert_eq!(intersection.chains().len(), 2);
}

#[test]
fn scratch_is_reset_on_error_paths() {
    let (_, intersection) = ladder();
    let err = intersection.intersect_vertices(0, 99).unwrap_err();
    assert_eq!(err.code(), "unknown-cycle");
    assert!(intersection.scratch_is_clear());
    assert!(intersection.intersect_vertices(99, 0).is_err());
    assert!(intersection.scratch_is_clear());
    assert_eq!(intersection.intersect_vertices(0, 0).unwrap().len(), 2);
    assert!(intersection.scratch_is_clear());
}

#[test]
fn return_path_components_drop_forbidden_cycles() {
    let (_, intersection) = ladder();
    let a = index_of(&intersection, &[1, 2]);
    let b = index_of(&intersection, &[2, 3]);
    let c = index_of(&intersection, &[3, 4]);

    let sorted = |mut list: Vec<usize>| {
        list.sort_unstable();
        list
    };
    let mut everything = vec![a, b, c];
    everything.sort_unstable();

    assert_eq!(
        sorted(intersection.largest_return_path_component(v(1), a).unwrap()),
        everything
    );
    assert_eq!(intersection.largest_return_path_component(v(3), a).unwrap(), vec![a]);
    assert_eq!(intersection.largest_return_path_component(v(2), c).unwrap(), vec![c]);

    let mut tail = vec![b, c];
    tail.sort_unstable();
    assert_eq!(
        sorted(intersection.largest_return_path_component(v(1), b).unwrap()),
        tail
    );

    let forbidden = BTreeSet::from([v(1), v(4)]);
    assert_eq!(intersection.return_path_component(b, &forbidden).unwrap(), vec![b]);
    let unknown = BTreeSet::from([v(77)]);
    assert_eq!(
        sorted(intersection.return_path_component(a, &unknown).unwrap()),
        everything
    );
    assert!(intersection.scratch_is_clear());
}

#[test]
fn construction_requires_a_current_enumeration() {
    let mut graph = graph(&[(1, 2), (2, 1)]);
    let finder = CycleFinder::new(&graph).unwrap();
    graph.add_edge(v(1), v(1), 0).unwrap();
    let err = CycleIntersection::new(&graph, finder).unwrap_err();
    assert_eq!(err.code(), "stale-cycles");

    let rebuilt = CycleIntersection::build(&graph).unwrap();
    rebuilt.ensure_current(&graph).unwrap();
    assert_eq!(rebuilt.cycle_count(), 2);
}
