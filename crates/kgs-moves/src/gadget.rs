//! The two-vertex Cuntz gadget: attaching it and recognizing it.

use kgs_core::{KgsError, VertexId};
use kgs_graph::ColoredMultigraph;
use tracing::trace;

use crate::components::SpliceMotif;
use crate::framework::{in_of, out_of, sorted};

/// Adds the gadget at `anchor`: `anchor <-> inner`, a loop on `inner`,
/// `inner <-> outer` and a loop on `outer`.
pub(crate) fn attach(
    graph: &mut ColoredMultigraph,
    anchor: VertexId,
) -> Result<SpliceMotif, KgsError> {
    let inner = graph.add_vertex(None)?;
    let outer = graph.add_vertex(None)?;
    for (source, target) in [
        (anchor, inner),
        (inner, anchor),
        (inner, inner),
        (inner, outer),
        (outer, inner),
        (outer, outer),
    ] {
        graph.add_edge(source, target, 0)?;
    }
    trace!(anchor = %anchor, inner = %inner, outer = %outer, "attached cuntz gadget");
    Ok(SpliceMotif {
        anchor,
        inner,
        outer,
    })
}

/// Returns whether `motif` is exactly a gadget whose outer vertex has the
/// extra out-edges `exits`.
///
/// Both gadget vertices must have no edges beyond the gadget (and the exits),
/// so deleting them removes nothing else.
pub(crate) fn matches(
    graph: &ColoredMultigraph,
    motif: &SpliceMotif,
    exits: &[VertexId],
) -> Result<bool, KgsError> {
    let SpliceMotif {
        anchor,
        inner,
        outer,
    } = *motif;
    if inner == outer || anchor == inner || anchor == outer {
        return Ok(false);
    }
    if exits.iter().any(|w| *w == inner || *w == outer) {
        return Ok(false);
    }
    let mut outer_out = vec![inner, outer];
    outer_out.extend_from_slice(exits);
    let inner_sides = sorted(vec![anchor, inner, outer]);
    Ok(sorted(out_of(graph, outer)?) == sorted(outer_out)
        && sorted(in_of(graph, outer)?) == sorted(vec![inner, outer])
        && sorted(out_of(graph, inner)?) == inner_sides
        && sorted(in_of(graph, inner)?) == inner_sides)
}

/// Every gadget in the graph, paired with the extra out-edges of its outer
/// vertex.
pub(crate) fn find(
    graph: &ColoredMultigraph,
) -> Result<Vec<(SpliceMotif, Vec<VertexId>)>, KgsError> {
    let mut found = Vec::new();
    for outer in graph.vertices() {
        let incoming = in_of(graph, *outer)?;
        let inner = match incoming.as_slice() {
            [a, b] if a == outer && b != outer => *b,
            [a, b] if b == outer && a != outer => *a,
            _ => continue,
        };
        let mut exits = out_of(graph, *outer)?;
        for gadget_vertex in [*outer, inner] {
            match exits.iter().position(|w| *w == gadget_vertex) {
                Some(position) => {
                    exits.remove(position);
                }
                None => break,
            }
        }
        let anchors: Vec<VertexId> = out_of(graph, inner)?
            .into_iter()
            .filter(|w| *w != inner && w != outer)
            .collect();
        let [anchor] = anchors.as_slice() else {
            continue;
        };
        let motif = SpliceMotif {
            anchor: *anchor,
            inner,
            outer: *outer,
        };
        exits.sort_unstable();
        if matches(graph, &motif, &exits)? {
            found.push((motif, exits));
        }
    }
    Ok(found)
}
