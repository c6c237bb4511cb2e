use std::collections::BTreeSet;

use kgs_core::{KgsError, VertexId};
use kgs_graph::ColoredMultigraph;
use tracing::trace;

use crate::components::EdgeBundle;
use crate::framework::{
    ensure_present, in_of, is_rank_one, log_scan, malformed, out_of, Move, MoveKind,
};

/// Collapses a vertex `v` with a single in-edge `u -> v` whose out-edges all
/// lead to one other vertex `w`.
///
/// The `d` edges `v -> w` become `d` edges `u -> w`; the returned bundle
/// names them.
#[derive(Debug)]
pub struct Reduction<'g> {
    graph: &'g mut ColoredMultigraph,
    viable: Vec<VertexId>,
}

impl<'g> Reduction<'g> {
    /// Binds the move to `graph` and scans for reducible vertices.
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

impl Move for Reduction<'_> {
    type Component = VertexId;
    type Inverse = EdgeBundle;

    const KIND: MoveKind = MoveKind::Reduction;

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
        let mut reducible = Vec::new();
        for vertex in self.graph.vertices() {
            if self.is_viable(vertex)? {
                reducible.push(*vertex);
            }
        }
        Ok(reducible)
    }

    fn is_viable(&self, vertex: &VertexId) -> Result<bool, KgsError> {
        if !is_rank_one(self.graph) {
            return Ok(false);
        }
        ensure_present(self.graph, *vertex)?;
        let targets: BTreeSet<VertexId> = out_of(self.graph, *vertex)?.into_iter().collect();
        let single_in = in_of(self.graph, *vertex)?.len() == 1;
        Ok(single_in && targets.len() == 1 && !targets.contains(vertex))
    }

    fn action(&mut self, vertex: &VertexId) -> Result<EdgeBundle, KgsError> {
        let targets = out_of(self.graph, *vertex)?;
        let sources = in_of(self.graph, *vertex)?;
        let (source, target) = match (sources.as_slice(), targets.first()) {
            ([source], Some(target))
                if target != vertex && targets.iter().all(|w| w == target) =>
            {
                (*source, *target)
            }
            _ => {
                return Err(malformed(
                    "reduction needs one in-edge and out-edges to a single other vertex",
                ))
            }
        };
        self.graph.del_vertex(*vertex)?;
        for _ in &targets {
            self.graph.add_edge(source, target, 0)?;
        }
        trace!(
            vertex = %vertex,
            source = %source,
            target = %target,
            multiplicity = targets.len(),
            "reduced vertex"
        );
        Ok(EdgeBundle {
            source,
            target,
            multiplicity: targets.len(),
        })
    }
}

/// Subdivides `multiplicity` parallel edges `source -> target` through a new
/// vertex `x`: one edge `source -> x` and `multiplicity` edges `x -> target`.
#[derive(Debug)]
pub struct ReductionInverse<'g> {
    graph: &'g mut ColoredMultigraph,
    viable: Vec<EdgeBundle>,
}

impl<'g> ReductionInverse<'g> {
    /// Binds the move to `graph`; every distinct edge is a viable bundle of one.
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

impl Move for ReductionInverse<'_> {
    type Component = EdgeBundle;
    type Inverse = VertexId;

    const KIND: MoveKind = MoveKind::ReductionInverse;

    fn graph(&self) -> &ColoredMultigraph {
        self.graph
    }

    fn viable_components(&self) -> &[EdgeBundle] {
        &self.viable
    }

    fn compute_viable_components(&self) -> Result<Vec<EdgeBundle>, KgsError> {
        if !is_rank_one(self.graph) {
            return Ok(Vec::new());
        }
        let distinct: BTreeSet<(VertexId, VertexId)> = self
            .graph
            .edges()
            .into_iter()
            .map(|(source, target, _)| (source, target))
            .collect();
        Ok(distinct
            .into_iter()
            .map(|(source, target)| EdgeBundle {
                source,
                target,
                multiplicity: 1,
            })
            .collect())
    }

    fn is_viable(&self, bundle: &EdgeBundle) -> Result<bool, KgsError> {
        if !is_rank_one(self.graph) {
            return Ok(false);
        }
        if bundle.multiplicity == 0 {
            return Err(malformed("an edge bundle holds at least one edge"));
        }
        ensure_present(self.graph, bundle.source)?;
        ensure_present(self.graph, bundle.target)?;
        Ok(self.graph.edge_multiplicity(bundle.source, bundle.target, 0)? >= bundle.multiplicity)
    }

    fn action(&mut self, bundle: &EdgeBundle) -> Result<VertexId, KgsError> {
        let present = self.graph.edge_multiplicity(bundle.source, bundle.target, 0)?;
        if present < bundle.multiplicity {
            return Err(KgsError::not_found(
                "edge-not-found",
                "bundle holds more edges than the graph",
            )
            .with_context("source", bundle.source)
            .with_context("target", bundle.target)
            .with_context("present", present));
        }
        for _ in 0..bundle.multiplicity {
            self.graph.del_edge(bundle.source, bundle.target, 0)?;
        }
        let middle = self.graph.add_vertex(None)?;
        self.graph.add_edge(bundle.source, middle, 0)?;
        for _ in 0..bundle.multiplicity {
            self.graph.add_edge(middle, bundle.target, 0)?;
        }
        trace!(
            vertex = %middle,
            source = %bundle.source,
            target = %bundle.target,
            multiplicity = bundle.multiplicity,
            "subdivided edge bundle"
        );
        Ok(middle)
    }
}
