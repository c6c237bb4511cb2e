use std::collections::BTreeSet;

use kgs_core::{KgsError, VertexId};
use kgs_cycles::CycleIntersection;
use kgs_graph::ColoredMultigraph;
use tracing::trace;

use crate::components::SpliceMotif;
use crate::framework::{ensure_present, log_scan, malformed, Move, MoveKind};
use crate::gadget;
use crate::return_paths::{current, snapshot, two_return_paths};

/// Attaches the Cuntz gadget at a vertex supporting two return paths.
///
/// The cycle snapshot is taken at construction, so the move refuses to check
/// viability again once the graph has changed underneath it.
#[derive(Debug)]
pub struct CuntzSplice<'g> {
    graph: &'g mut ColoredMultigraph,
    cycles: Option<CycleIntersection>,
    viable: Vec<VertexId>,
}

impl<'g> CuntzSplice<'g> {
    /// Binds the move to `graph`, enumerating its cycles.
    pub fn new(graph: &'g mut ColoredMultigraph) -> Result<Self, KgsError> {
        let cycles = snapshot(graph)?;
        let mut found = Self {
            graph,
            cycles,
            viable: Vec::new(),
        };
        found.viable = found.compute_viable_components()?;
        log_scan(Self::KIND, found.graph, found.viable.len());
        Ok(found)
    }
}

impl Move for CuntzSplice<'_> {
    type Component = VertexId;
    type Inverse = SpliceMotif;

    const KIND: MoveKind = MoveKind::CuntzSplice;

    fn graph(&self) -> &ColoredMultigraph {
        self.graph
    }

    fn viable_components(&self) -> &[VertexId] {
        &self.viable
    }

    fn compute_viable_components(&self) -> Result<Vec<VertexId>, KgsError> {
        let mut viable = Vec::new();
        for vertex in self.graph.vertices() {
            if self.is_viable(vertex)? {
                viable.push(*vertex);
            }
        }
        Ok(viable)
    }

    fn is_viable(&self, vertex: &VertexId) -> Result<bool, KgsError> {
        let Some(cycles) = current(&self.cycles, self.graph)? else {
            return Ok(false);
        };
        ensure_present(self.graph, *vertex)?;
        two_return_paths(self.graph, cycles, *vertex, &BTreeSet::new())
    }

    fn action(&mut self, vertex: &VertexId) -> Result<SpliceMotif, KgsError> {
        ensure_present(self.graph, *vertex)?;
        gadget::attach(self.graph, *vertex)
    }
}

/// Removes a bare Cuntz gadget whose anchor keeps two return paths without it.
#[derive(Debug)]
pub struct CuntzSpliceInverse<'g> {
    graph: &'g mut ColoredMultigraph,
    cycles: Option<CycleIntersection>,
    viable: Vec<SpliceMotif>,
}

impl<'g> CuntzSpliceInverse<'g> {
    /// Binds the move to `graph`, enumerating its cycles.
    pub fn new(graph: &'g mut ColoredMultigraph) -> Result<Self, KgsError> {
        let cycles = snapshot(graph)?;
        let mut found = Self {
            graph,
            cycles,
            viable: Vec::new(),
        };
        found.viable = found.compute_viable_components()?;
        log_scan(Self::KIND, found.graph, found.viable.len());
        Ok(found)
    }
}

impl Move for CuntzSpliceInverse<'_> {
    type Component = SpliceMotif;
    type Inverse = VertexId;

    const KIND: MoveKind = MoveKind::CuntzSpliceInverse;

    fn graph(&self) -> &ColoredMultigraph {
        self.graph
    }

    fn viable_components(&self) -> &[SpliceMotif] {
        &self.viable
    }

    fn compute_viable_components(&self) -> Result<Vec<SpliceMotif>, KgsError> {
        if self.cycles.is_none() {
            return Ok(Vec::new());
        }
        let mut viable = Vec::new();
        for (motif, exits) in gadget::find(self.graph)? {
            if exits.is_empty() && self.is_viable(&motif)? {
                viable.push(motif);
            }
        }
        Ok(viable)
    }

    fn is_viable(&self, motif: &SpliceMotif) -> Result<bool, KgsError> {
        let Some(cycles) = current(&self.cycles, self.graph)? else {
            return Ok(false);
        };
        if motif.inner == motif.outer {
            return Err(malformed("gadget vertices must be distinct"));
        }
        for vertex in [motif.anchor, motif.inner, motif.outer] {
            ensure_present(self.graph, vertex)?;
        }
        if !gadget::matches(self.graph, motif, &[])? {
            return Ok(false);
        }
        let avoid = BTreeSet::from(motif.gadget());
        two_return_paths(self.graph, cycles, motif.anchor, &avoid)
    }

    fn action(&mut self, motif: &SpliceMotif) -> Result<VertexId, KgsError> {
        for vertex in motif.gadget() {
            self.graph.del_vertex(vertex)?;
        }
        trace!(anchor = %motif.anchor, "removed cuntz gadget");
        Ok(motif.anchor)
    }
}
