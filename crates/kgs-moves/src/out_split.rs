use kgs_core::KgsError;
use kgs_graph::ColoredMultigraph;

use crate::components::{VertexPair, VertexPartition};
use crate::framework::{is_rank_one, log_scan, Move, MoveKind};
use crate::split::{self, Orientation};

/// Splits a vertex with at least two distinct out-neighbors into two copies.
///
/// The out-neighbors are partitioned between the copies and every
/// in-edge is duplicated onto both. A self-loop is duplicated like any
/// other in-edge and leaves from the copy whose part contains the vertex.
#[derive(Debug)]
pub struct OutSplit<'g> {
    graph: &'g mut ColoredMultigraph,
    viable: Vec<VertexPartition>,
}

impl<'g> OutSplit<'g> {
    /// Binds the move to `graph`, proposing one partition per splittable vertex.
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

impl Move for OutSplit<'_> {
    type Component = VertexPartition;
    type Inverse = VertexPair;

    const KIND: MoveKind = MoveKind::OutSplit;

    fn graph(&self) -> &ColoredMultigraph {
        self.graph
    }

    fn viable_components(&self) -> &[VertexPartition] {
        &self.viable
    }

    fn compute_viable_components(&self) -> Result<Vec<VertexPartition>, KgsError> {
        if !is_rank_one(self.graph) {
            return Ok(Vec::new());
        }
        split::default_partitions(self.graph, Orientation::Out)
    }

    fn is_viable(&self, partition: &VertexPartition) -> Result<bool, KgsError> {
        if !is_rank_one(self.graph) {
            return Ok(false);
        }
        split::partition_viable(self.graph, Orientation::Out, partition)
    }

    fn action(&mut self, partition: &VertexPartition) -> Result<VertexPair, KgsError> {
        split::split(self.graph, Orientation::Out, partition)
    }
}

/// Merges two vertices with identical in-neighbor multisets and disjoint,
/// non-empty out-neighbor sets.
///
/// Returns the merged vertex with the partition that splits it back.
#[derive(Debug)]
pub struct OutSplitInverse<'g> {
    graph: &'g mut ColoredMultigraph,
    viable: Vec<VertexPair>,
}

impl<'g> OutSplitInverse<'g> {
    /// Binds the move to `graph` and collects every mergeable pair.
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

impl Move for OutSplitInverse<'_> {
    type Component = VertexPair;
    type Inverse = VertexPartition;

    const KIND: MoveKind = MoveKind::OutSplitInverse;

    fn graph(&self) -> &ColoredMultigraph {
        self.graph
    }

    fn viable_components(&self) -> &[VertexPair] {
        &self.viable
    }

    fn compute_viable_components(&self) -> Result<Vec<VertexPair>, KgsError> {
        if !is_rank_one(self.graph) {
            return Ok(Vec::new());
        }
        split::candidate_pairs(self.graph, Orientation::Out)
    }

    fn is_viable(&self, pair: &VertexPair) -> Result<bool, KgsError> {
        if !is_rank_one(self.graph) {
            return Ok(false);
        }
        split::pair_viable(self.graph, Orientation::Out, pair)
    }

    fn action(&mut self, pair: &VertexPair) -> Result<VertexPartition, KgsError> {
        split::merge(self.graph, Orientation::Out, pair)
    }
}
