use kgs_core::{KgsError, VertexId};
use kgs_graph::ColoredMultigraph;
use tracing::trace;

use crate::framework::{
    ensure_present, in_of, is_rank_one, log_scan, malformed, out_of, sorted, Move, MoveKind,
};

/// Deletes a vertex with no out-edges and at least one in-edge.
///
/// Returns the multiset of its former in-neighbors.
#[derive(Debug)]
pub struct SinkDelete<'g> {
    graph: &'g mut ColoredMultigraph,
    viable: Vec<VertexId>,
}

impl<'g> SinkDelete<'g> {
    /// Binds the move to `graph` and scans for sinks.
    pub fn new(graph: &'g mut ColoredMultigraph) -> Result<Self, KgsError> {
        let mut found = Self {
            graph,
            viable: Vec::new(),
        };
        found.viable = found.compute_viable_components()?;
        log_scan(Self::KIND, found.graph, found.viable.len());
        Ok(found)
    }
}

impl Move for SinkDelete<'_> {
    type Component = VertexId;
    type Inverse = Vec<VertexId>;

    const KIND: MoveKind = MoveKind::SinkDelete;

    fn graph(&self) -> &ColoredMultigraph {
        self.graph
    }

    fn viable_components(&self) -> &[VertexId] {
        &self.viable
    }

    fn compute_viable_components(&self) -> Result<Vec<VertexId>, KgsError> {
        if !is_rank_one(self.graph) {
            return Ok(Vec::new());
        }
        let mut sinks = Vec::new();
        for vertex in self.graph.vertices() {
            if self.is_viable(vertex)? {
                sinks.push(*vertex);
            }
        }
        Ok(sinks)
    }

    fn is_viable(&self, vertex: &VertexId) -> Result<bool, KgsError> {
        if !is_rank_one(self.graph) {
            return Ok(false);
        }
        ensure_present(self.graph, *vertex)?;
        Ok(out_of(self.graph, *vertex)?.is_empty() && !in_of(self.graph, *vertex)?.is_empty())
    }

    fn action(&mut self, vertex: &VertexId) -> Result<Vec<VertexId>, KgsError> {
        let sources = sorted(in_of(self.graph, *vertex)?);
        self.graph.del_vertex(*vertex)?;
        trace!(vertex = %vertex, in_edges = sources.len(), "deleted sink");
        Ok(sources)
    }
}

/// Adds a fresh sink fed by one edge from each listed source.
///
/// Sources form a multiset: a repeated source yields parallel edges.
#[derive(Debug)]
pub struct SinkDeleteInverse<'g> {
    graph: &'g mut ColoredMultigraph,
    viable: Vec<Vec<VertexId>>,
}

impl<'g> SinkDeleteInverse<'g> {
    /// Binds the move to `graph`; every single vertex is a viable source set.
    pub fn new(graph: &'g mut ColoredMultigraph) -> Result<Self, KgsError> {
        let mut found = Self {
            graph,
            viable: Vec::new(),
        };
        found.viable = found.compute_viable_components()?;
        log_scan(Self::KIND, found.graph, found.viable.len());
        Ok(found)
    }
}

impl Move for SinkDeleteInverse<'_> {
    type Component = Vec<VertexId>;
    type Inverse = VertexId;

    const KIND: MoveKind = MoveKind::SinkDeleteInverse;

    fn graph(&self) -> &ColoredMultigraph {
        self.graph
    }

    fn viable_components(&self) -> &[Vec<VertexId>] {
        &self.viable
    }

    fn compute_viable_components(&self) -> Result<Vec<Vec<VertexId>>, KgsError> {
        if !is_rank_one(self.graph) {
            return Ok(Vec::new());
        }
        Ok(self.graph.vertices().iter().map(|vertex| vec![*vertex]).collect())
    }

    fn is_viable(&self, sources: &Vec<VertexId>) -> Result<bool, KgsError> {
        if !is_rank_one(self.graph) {
            return Ok(false);
        }
        if sources.is_empty() {
            return Err(malformed("a new sink needs at least one source"));
        }
        for source in sources {
            ensure_present(self.graph, *source)?;
        }
        Ok(true)
    }

    fn action(&mut self, sources: &Vec<VertexId>) -> Result<VertexId, KgsError> {
        let sink = self.graph.add_vertex(None)?;
        for source in sources {
            self.graph.add_edge(*source, sink, 0)?;
        }
        trace!(vertex = %sink, in_edges = sources.len(), "attached sink");
        Ok(sink)
    }
}
