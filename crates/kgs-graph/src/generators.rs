use kgs_core::{KgsError, RngHandle, VertexId};
use rand::Rng;

use crate::multigraph::ColoredMultigraph;

/// Generates a random colored multigraph with deterministic randomness.
///
/// Vertices are labelled `0..n_vertices`; every edge picks its endpoints and
/// color uniformly, so self-loops and parallel edges occur naturally.
pub fn gen_random_kgraph(
    n_vertices: usize,
    n_edges: usize,
    colors: usize,
    rng: &mut RngHandle,
) -> Result<ColoredMultigraph, KgsError> {
    if n_edges > 0 && (n_vertices == 0 || colors == 0) {
        return Err(KgsError::invalid_argument(
            "empty-graph",
            "random edges require at least one vertex and one color",
        )
        .with_context("vertices", n_vertices)
        .with_context("colors", colors));
    }
    let mut graph = ColoredMultigraph::new(colors);
    let vertices: Vec<VertexId> = (0..n_vertices as u64)
        .map(|raw| graph.add_vertex(Some(VertexId::from_raw(raw))))
        .collect::<Result<_, _>>()?;
    for _ in 0..n_edges {
        let source = vertices[rng.gen_range(0..vertices.len())];
        let target = vertices[rng.gen_range(0..vertices.len())];
        let color = rng.gen_range(0..colors);
        graph.add_edge(source, target, color)?;
    }
    Ok(graph)
}

/// Generates a rank-1 graph from the directed cycle `0 -> 1 -> ... -> len-1 -> 0`.
pub fn gen_directed_cycle(len: usize) -> Result<ColoredMultigraph, KgsError> {
    let vertices: Vec<VertexId> = (0..len as u64).map(VertexId::from_raw).collect();
    let edges = (0..len).map(|idx| (vertices[idx], vertices[(idx + 1) % len], 0));
    ColoredMultigraph::from_edges(vertices.clone(), edges, 1)
}
