//! Return-path predicates evaluated on a cycle snapshot, optionally ignoring
//! every cycle that passes through an `avoid` set.

use std::collections::BTreeSet;

use kgs_core::{KgsError, VertexId};
use kgs_cycles::CycleIntersection;
use kgs_graph::ColoredMultigraph;

use crate::framework::{is_rank_one, out_of};

/// Builds the cycle snapshot for a rank-1 graph; other ranks get none.
pub(crate) fn snapshot(graph: &ColoredMultigraph) -> Result<Option<CycleIntersection>, KgsError> {
    if !is_rank_one(graph) {
        return Ok(None);
    }
    CycleIntersection::build(graph).map(Some)
}

/// Returns the snapshot if it still describes `graph`.
pub(crate) fn current<'a>(
    cycles: &'a Option<CycleIntersection>,
    graph: &ColoredMultigraph,
) -> Result<Option<&'a CycleIntersection>, KgsError> {
    match cycles {
        Some(cycles) => {
            cycles.ensure_current(graph)?;
            Ok(Some(cycles))
        }
        None => Ok(None),
    }
}

/// Cycles through `vertex` that miss every vertex of `avoid`.
fn cycles_at(
    cycles: &CycleIntersection,
    vertex: VertexId,
    avoid: &BTreeSet<VertexId>,
) -> Result<Vec<usize>, KgsError> {
    let finder = cycles.finder();
    let mut kept = Vec::new();
    for &c in finder.cycles_at(vertex)? {
        if !finder.cycle(c)?.iter().any(|w| avoid.contains(w)) {
            kept.push(c);
        }
    }
    Ok(kept)
}

/// Condition (C): `vertex` supports at least two distinct return paths.
///
/// A single loop counts twice only when doubled; a single longer cycle needs
/// another cycle reachable from it without passing through `vertex`; two or
/// more cycles through `vertex` always give two return paths.
pub(crate) fn two_return_paths(
    graph: &ColoredMultigraph,
    cycles: &CycleIntersection,
    vertex: VertexId,
    avoid: &BTreeSet<VertexId>,
) -> Result<bool, KgsError> {
    let at_vertex = cycles_at(cycles, vertex, avoid)?;
    match at_vertex.as_slice() {
        [] => Ok(false),
        [only] if cycles.finder().cycle(*only)?.len() == 1 => {
            Ok(graph.edge_multiplicity(vertex, vertex, 0)? >= 2)
        }
        [only] => {
            let mut forbidden = avoid.clone();
            forbidden.insert(vertex);
            Ok(cycles.return_path_component(*only, &forbidden)?.len() >= 2)
        }
        _ => Ok(true),
    }
}

/// Condition (P): `vertex` carries exactly one loop, that loop is its only
/// return path, and the vertex has at least one other out-edge.
pub(crate) fn lone_loop_with_exit(
    graph: &ColoredMultigraph,
    cycles: &CycleIntersection,
    vertex: VertexId,
    avoid: &BTreeSet<VertexId>,
) -> Result<bool, KgsError> {
    let loops = graph.edge_multiplicity(vertex, vertex, 0)?;
    if loops != 1 {
        return Ok(false);
    }
    let at_vertex = cycles_at(cycles, vertex, avoid)?;
    if at_vertex.len() != 1 {
        return Ok(false);
    }
    Ok(out_of(graph, vertex)?.len() > loops)
}
