use std::collections::{BTreeMap, BTreeSet};

use kgs_core::{KgsError, VertexId};
use kgs_cycles::CycleIntersection;
use kgs_graph::ColoredMultigraph;
use tracing::trace;

use crate::components::SpliceMotif;
use crate::framework::{ensure_present, log_scan, out_of, sorted, Move, MoveKind};
use crate::gadget;
use crate::return_paths::{current, lone_loop_with_exit, snapshot, two_return_paths};

/// Out-edges of `vertex` other than its loops, one entry per edge instance,
/// sorted.
fn exits(graph: &ColoredMultigraph, vertex: VertexId) -> Result<Vec<VertexId>, KgsError> {
    Ok(sorted(
        out_of(graph, vertex)?
            .into_iter()
            .filter(|w| *w != vertex)
            .collect(),
    ))
}

/// Closes the lone loop at `u`.
///
/// `u` must carry exactly one loop, no other return path and at least one
/// exit, and every exit must support two return paths. Every out-edge of `u`
/// other than the loop gets its own Cuntz gadget at the edge's target, so
/// parallel exits get one gadget each. Each outer vertex sends two edges
/// back to `u`.
#[derive(Debug)]
pub struct Eclose<'g> {
    graph: &'g mut ColoredMultigraph,
    cycles: Option<CycleIntersection>,
    viable: Vec<VertexId>,
}

impl<'g> Eclose<'g> {
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

impl Move for Eclose<'_> {
    type Component = VertexId;
    type Inverse = VertexId;

    const KIND: MoveKind = MoveKind::Eclose;

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
        let none = BTreeSet::new();
        if !lone_loop_with_exit(self.graph, cycles, *vertex, &none)? {
            return Ok(false);
        }
        let mut targets = exits(self.graph, *vertex)?;
        targets.dedup();
        for exit in targets {
            if !two_return_paths(self.graph, cycles, exit, &none)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn action(&mut self, vertex: &VertexId) -> Result<VertexId, KgsError> {
        let targets = exits(self.graph, *vertex)?;
        for target in &targets {
            let motif = gadget::attach(self.graph, *target)?;
            self.graph.add_edge(motif.outer, *vertex, 0)?;
            self.graph.add_edge(motif.outer, *vertex, 0)?;
        }
        trace!(vertex = %vertex, gadgets = targets.len(), "closed loop");
        Ok(*vertex)
    }
}

/// Removes the gadgets Eclose attached for `u`.
///
/// Gadgets whose outer vertex sends exactly two extra edges to the same
/// vertex are bucketed by that vertex. `u` is viable when its bucket holds
/// one gadget per out-edge of `u` other than the loop, anchored at that
/// edge's target, and, with the bucket's gadgets ignored, `u`
/// again has a lone loop while every exit keeps two return paths.
#[derive(Debug)]
pub struct EcloseInverse<'g> {
    graph: &'g mut ColoredMultigraph,
    cycles: Option<CycleIntersection>,
    buckets: BTreeMap<VertexId, Vec<SpliceMotif>>,
    viable: Vec<VertexId>,
}

impl<'g> EcloseInverse<'g> {
    /// Binds the move to `graph`, enumerating its cycles and gadgets.
    pub fn new(graph: &'g mut ColoredMultigraph) -> Result<Self, KgsError> {
        let cycles = snapshot(graph)?;
        let mut buckets: BTreeMap<VertexId, Vec<SpliceMotif>> = BTreeMap::new();
        if cycles.is_some() {
            for (motif, exits) in gadget::find(graph)? {
                if let [a, b] = exits.as_slice() {
                    if a == b && *a != motif.anchor {
                        buckets.entry(*a).or_default().push(motif);
                    }
                }
            }
        }
        let mut found = Self {
            graph,
            cycles,
            buckets,
            viable: Vec::new(),
        };
        found.viable = found.compute_viable_components()?;
        log_scan(Self::KIND, found.graph, found.viable.len());
        Ok(found)
    }

    /// Gadgets whose outer vertex points back at `vertex`.
    pub fn bucket(&self, vertex: VertexId) -> &[SpliceMotif] {
        self.buckets.get(&vertex).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Move for EcloseInverse<'_> {
    type Component = VertexId;
    type Inverse = VertexId;

    const KIND: MoveKind = MoveKind::EcloseInverse;

    fn graph(&self) -> &ColoredMultigraph {
        self.graph
    }

    fn viable_components(&self) -> &[VertexId] {
        &self.viable
    }

    fn compute_viable_components(&self) -> Result<Vec<VertexId>, KgsError> {
        let mut viable = Vec::new();
        for vertex in self.buckets.keys() {
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
        let bucket = self.bucket(*vertex);
        if bucket.is_empty() {
            return Ok(false);
        }
        let mut anchors = sorted(bucket.iter().map(|motif| motif.anchor).collect());
        if anchors != exits(self.graph, *vertex)? {
            return Ok(false);
        }
        anchors.dedup();
        let avoid: BTreeSet<VertexId> = bucket.iter().flat_map(SpliceMotif::gadget).collect();
        if !lone_loop_with_exit(self.graph, cycles, *vertex, &avoid)? {
            return Ok(false);
        }
        for anchor in &anchors {
            if !two_return_paths(self.graph, cycles, *anchor, &avoid)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn action(&mut self, vertex: &VertexId) -> Result<VertexId, KgsError> {
        let bucket = self.bucket(*vertex).to_vec();
        for motif in &bucket {
            for gadget_vertex in motif.gadget() {
                self.graph.del_vertex(gadget_vertex)?;
            }
        }
        trace!(vertex = %vertex, gadgets = bucket.len(), "reopened loop");
        Ok(*vertex)
    }
}
