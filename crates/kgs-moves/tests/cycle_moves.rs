use std::collections::BTreeSet;

use kgs_core::{KgsError, VertexId};
use kgs_graph::{invariant_hash, ColoredMultigraph};
use kgs_moves::{
    viable_steps, CuntzSplice, CuntzSpliceInverse, Eclose, EcloseInverse, Move, MoveKind,
    SpliceMotif,
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

/// A lone loop at 0 whose only exit is a doubly looped vertex 1.
fn open_loop() -> ColoredMultigraph {
    graph(&[(0, 0), (0, 1), (1, 1), (1, 1)])
}

#[test]
fn splice_on_a_double_loop_adds_the_gadget() {
    let mut g = graph(&[(0, 0), (0, 0)]);
    let before = invariant_hash(&g);

    let mut splice = CuntzSplice::new(&mut g).unwrap();
    assert_eq!(splice.viable_components(), &[v(0)]);
    let motif = splice.apply(&v(0)).unwrap();
    assert_eq!(
        motif,
        SpliceMotif {
            anchor: v(0),
            inner: v(1),
            outer: v(2),
        }
    );
    assert_eq!((g.vertex_count(), g.edge_count()), (3, 8));

    let mut removal = CuntzSpliceInverse::new(&mut g).unwrap();
    assert_eq!(removal.viable_components(), &[motif]);
    assert_eq!(removal.apply(&motif).unwrap(), v(0));
    assert_eq!((g.vertex_count(), g.edge_count()), (1, 2));
    assert_eq!(invariant_hash(&g), before);
}

#[test]
fn single_loop_or_lone_cycle_has_one_return_path() {
    let mut single = graph(&[(0, 0)]);
    assert!(!CuntzSplice::new(&mut single).unwrap().is_active());

    let mut triangle = graph(&[(0, 1), (1, 2), (2, 0)]);
    assert!(!CuntzSplice::new(&mut triangle).unwrap().is_active());
}

#[test]
fn crossing_cycles_give_two_return_paths() {
    // two triangles sharing 0, plus a loop on 3 hanging off the first one
    let mut g = graph(&[(0, 1), (1, 2), (2, 0), (0, 3), (3, 4), (4, 0), (1, 1)]);
    let splice = CuntzSplice::new(&mut g).unwrap();
    let viable: BTreeSet<VertexId> = splice.viable_components().iter().copied().collect();
    // 0 sits on two cycles; 1 sits on a triangle and its own loop; 2 reaches
    // the loop on 1 without revisiting itself
    assert!(viable.contains(&v(0)));
    assert!(viable.contains(&v(1)));
    assert!(viable.contains(&v(2)));
    assert!(viable.contains(&v(3)));
    assert!(viable.contains(&v(4)));
}

#[test]
fn isolated_cycle_vertices_are_not_spliceable() {
    let mut g = graph(&[(0, 1), (1, 0), (2, 2), (2, 2)]);
    let splice = CuntzSplice::new(&mut g).unwrap();
    assert_eq!(splice.viable_components(), &[v(2)]);
}

#[test]
fn gadget_with_extra_edges_is_not_removable() {
    let mut g = graph(&[(0, 0), (0, 0)]);
    let motif = CuntzSplice::new(&mut g).unwrap().apply(&v(0)).unwrap();
    g.add_edge(motif.outer, v(0), 0).unwrap();

    let removal = CuntzSpliceInverse::new(&mut g).unwrap();
    assert!(removal.viable_components().is_empty());
    assert!(!removal.is_viable(&motif).unwrap());

    let collapsed = SpliceMotif {
        outer: motif.inner,
        ..motif
    };
    let err = removal.is_viable(&collapsed).unwrap_err();
    assert!(matches!(&err, KgsError::InvalidArgument(info) if info.code == "malformed-component"));
}

#[test]
fn gadget_anchor_needs_its_own_return_paths() {
    let mut g = graph(&[(0, 0), (0, 0)]);
    let motif = CuntzSplice::new(&mut g).unwrap().apply(&v(0)).unwrap();
    g.del_edge(v(0), v(0), 0).unwrap();

    let removal = CuntzSpliceInverse::new(&mut g).unwrap();
    assert!(!removal.is_viable(&motif).unwrap());
}

#[test]
fn eclose_splices_every_exit() {
    let mut g = open_loop();
    let before = invariant_hash(&g);

    let mut close = Eclose::new(&mut g).unwrap();
    assert_eq!(close.viable_components(), &[v(0)]);
    assert_eq!(close.apply(&v(0)).unwrap(), v(0));
    assert_eq!((g.vertex_count(), g.edge_count()), (4, 12));
    assert_eq!(g.edge_multiplicity(v(3), v(0), 0).unwrap(), 2);

    let mut reopen = EcloseInverse::new(&mut g).unwrap();
    assert_eq!(reopen.viable_components(), &[v(0)]);
    assert_eq!(
        reopen.bucket(v(0)),
        &[SpliceMotif {
            anchor: v(1),
            inner: v(2),
            outer: v(3),
        }]
    );
    assert!(reopen.bucket(v(1)).is_empty());
    reopen.apply(&v(0)).unwrap();
    assert_eq!(invariant_hash(&g), before);
}

#[test]
fn eclose_gives_parallel_exits_one_gadget_each() {
    let mut g = graph(&[(0, 0), (0, 1), (0, 1), (1, 1), (1, 1)]);
    let before = invariant_hash(&g);

    let mut close = Eclose::new(&mut g).unwrap();
    assert_eq!(close.viable_components(), &[v(0)]);
    close.apply(&v(0)).unwrap();
    assert_eq!((g.vertex_count(), g.edge_count()), (6, 21));
    assert_eq!(g.edge_multiplicity(v(3), v(0), 0).unwrap(), 2);
    assert_eq!(g.edge_multiplicity(v(5), v(0), 0).unwrap(), 2);
    assert_eq!(g.edge_multiplicity(v(1), v(2), 0).unwrap(), 1);
    assert_eq!(g.edge_multiplicity(v(1), v(4), 0).unwrap(), 1);

    let mut reopen = EcloseInverse::new(&mut g).unwrap();
    assert_eq!(reopen.bucket(v(0)).len(), 2);
    assert!(reopen.bucket(v(0)).iter().all(|motif| motif.anchor == v(1)));
    assert_eq!(reopen.viable_components(), &[v(0)]);
    reopen.apply(&v(0)).unwrap();
    assert_eq!((g.vertex_count(), g.edge_count()), (2, 5));
    assert_eq!(invariant_hash(&g), before);
}

#[test]
fn eclose_inverse_needs_a_gadget_per_exit_edge() {
    let mut g = graph(&[(0, 0), (0, 1), (0, 1), (1, 1), (1, 1)]);
    Eclose::new(&mut g).unwrap().apply(&v(0)).unwrap();
    // a third exit edge has no gadget of its own
    g.add_edge(v(0), v(1), 0).unwrap();

    let reopen = EcloseInverse::new(&mut g).unwrap();
    assert_eq!(reopen.bucket(v(0)).len(), 2);
    assert!(!reopen.is_viable(&v(0)).unwrap());
    assert!(reopen.viable_components().is_empty());
}

#[test]
fn eclose_needs_a_lone_loop_and_spliceable_exits() {
    // two loops at 0
    let mut doubled = graph(&[(0, 0), (0, 0), (0, 1), (1, 1), (1, 1)]);
    assert!(!Eclose::new(&mut doubled).unwrap().is_active());

    // the exit only carries a single loop
    let mut weak_exit = graph(&[(0, 0), (0, 1), (1, 1)]);
    assert!(!Eclose::new(&mut weak_exit).unwrap().is_active());

    // no exit at all
    let mut closed = graph(&[(0, 0)]);
    assert!(!Eclose::new(&mut closed).unwrap().is_active());

    // the exit leads back, so the loop is not the only return path
    let mut returning = graph(&[(0, 0), (0, 1), (1, 0), (1, 1), (1, 1)]);
    assert!(!Eclose::new(&mut returning).unwrap().is_active());
}

#[test]
fn second_apply_on_a_cycle_move_sees_stale_cycles() {
    let mut g = graph(&[(0, 0), (0, 0)]);
    let mut splice = CuntzSplice::new(&mut g).unwrap();
    splice.apply(&v(0)).unwrap();
    let err = splice.apply(&v(0)).unwrap_err();
    assert!(matches!(&err, KgsError::PreconditionFailed(info) if info.code == "stale-cycles"));
}

#[test]
fn higher_rank_graphs_have_no_viable_steps() {
    let mut g = ColoredMultigraph::from_edges(
        [v(0), v(1)],
        [(v(0), v(0), 0), (v(0), v(0), 1), (v(0), v(1), 0), (v(1), v(0), 1)],
        2,
    )
    .unwrap();
    for kind in MoveKind::ALL {
        let steps = viable_steps(&mut g, kind).unwrap();
        assert!(steps.is_empty(), "{kind} found steps on a 2-colored graph");
    }
    assert!(!CuntzSplice::new(&mut g).unwrap().is_viable(&v(0)).unwrap());
}
