use kgs_core::KgsError;
use kgs_graph::ColoredMultigraph;

use crate::components::{VertexPair, VertexPartition};
use crate::framework::{is_rank_one, log_scan, Move, MoveKind};
use crate::split::{self, Orientation};

/// Splits a vertex with at least two distinct in-neighbors into two copies.
///
/// The in-neighbors are partitioned between the copies and every
/// out-edge is duplicated onto both. A self-loop is duplicated like any
/// other out-edge and lands on the copy whose part contains the vertex.
#[derive(Debug)]
pub struct InSplit<'g> {
    graph: &'g mut ColoredMultigraph,
    viable: Vec<VertexPartition>,
}

impl<'g> InSplit<'g> {
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

impl Move for InSplit<'_> {
    type Component = VertexPartition;
    type Inverse = VertexPair;

    const KIND: MoveKind = MoveKind::InSplit;

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
        split::default_partitions(self.graph, Orientation::In)
    }

    fn is_viable(&self, partition: &VertexPartition) -> Result<bool, KgsError> {
        if !is_rank_one(self.graph) {
            return Ok(false);
        }
        split::partition_viable(self.graph, Orientation::In, partition)
    }

    fn action(&mut self, partition: &VertexPartition) -> Result<VertexPair, KgsError> {
        split::split(self.graph, Orientation::In, partition)
    }
}

/// Merges two vertices with identical out-neighbor multisets and disjoint,
/// non-empty in-neighbor sets.
///
/// Returns the merged vertex with the partition that splits it back.
#[derive(Debug)]
pub struct InSplitInverse<'g> {
    graph: &'g mut ColoredMultigraph,
    viable: Vec<VertexPair>,
}

impl<'g> InSplitInverse<'g> {
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

impl Move for InSplitInverse<'_> {
    type Component = VertexPair;
    type Inverse = VertexPartition;

    const KIND: MoveKind = MoveKind::InSplitInverse;

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
        split::candidate_pairs(self.graph, Orientation::In)
    }

    fn is_viable(&self, pair: &VertexPair) -> Result<bool, KgsError> {
        if !is_rank_one(self.graph) {
            return Ok(false);
        }
        split::pair_viable(self.graph, Orientation::In, pair)
    }

    fn action(&mut self, pair: &VertexPair) -> Result<VertexPartition, KgsError> {
        split::merge(self.graph, Orientation::In, pair)
    }
}
