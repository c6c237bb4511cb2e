use std::collections::BTreeSet;

use kgs_core::VertexId;
use serde::{Deserialize, Serialize};

/// `multiplicity` parallel edges `source -> target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeBundle {
    /// Tail of the edges.
    pub source: VertexId,
    /// Head of the edges.
    pub target: VertexId,
    /// Number of parallel edges.
    pub multiplicity: usize,
}

/// A vertex together with a split of one side of its neighbor set.
///
/// For in-splits the parts cover the distinct in-neighbors, for out-splits
/// the distinct out-neighbors. A self-loop puts the vertex itself in one part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexPartition {
    /// Vertex being split.
    pub vertex: VertexId,
    /// Neighbors routed to the first copy.
    pub e1: BTreeSet<VertexId>,
    /// Neighbors routed to the second copy.
    pub e2: BTreeSet<VertexId>,
}

impl VertexPartition {
    /// Returns whether the parts are non-empty, disjoint and together equal
    /// `neighbors`.
    pub fn covers(&self, neighbors: &BTreeSet<VertexId>) -> bool {
        !self.e1.is_empty()
            && !self.e2.is_empty()
            && self.e1.is_disjoint(&self.e2)
            && self.e1.union(&self.e2).eq(neighbors.iter())
    }
}

/// Two vertices produced by a split, in copy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexPair {
    /// First copy.
    pub first: VertexId,
    /// Second copy.
    pub second: VertexId,
}

/// The two-vertex Cuntz gadget hanging off `anchor`.
///
/// `inner` carries a loop and a 2-cycle to both `anchor` and `outer`;
/// `outer` carries a loop and the 2-cycle to `inner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpliceMotif {
    /// Vertex the gadget is attached to.
    pub anchor: VertexId,
    /// Gadget vertex adjacent to the anchor.
    pub inner: VertexId,
    /// Gadget vertex adjacent only to `inner` (and, for Eclose, the closed vertex).
    pub outer: VertexId,
}

impl SpliceMotif {
    /// The two gadget vertices.
    pub fn gadget(&self) -> [VertexId; 2] {
        [self.inner, self.outer]
    }
}
