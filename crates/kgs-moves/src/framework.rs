use std::fmt::{self, Debug};

use kgs_core::{KgsError, VertexId};
use kgs_graph::{ColorFilter, ColoredMultigraph};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The twelve rewrite moves: six forward moves and their inverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveKind {
    /// Delete a sink.
    SinkDelete,
    /// Re-attach a sink to a multiset of sources.
    SinkDeleteInverse,
    /// Collapse a vertex with one in-edge and one distinct out-neighbor.
    Reduction,
    /// Subdivide a bundle of parallel edges.
    ReductionInverse,
    /// Split a vertex along a partition of its in-neighbors.
    InSplit,
    /// Merge two in-split copies.
    InSplitInverse,
    /// Split a vertex along a partition of its out-neighbors.
    OutSplit,
    /// Merge two out-split copies.
    OutSplitInverse,
    /// Attach the Cuntz gadget at a vertex with two return paths.
    CuntzSplice,
    /// Remove a Cuntz gadget.
    CuntzSpliceInverse,
    /// Close a bare loop by splicing its exits.
    Eclose,
    /// Remove the gadgets attached by Eclose.
    EcloseInverse,
}

impl MoveKind {
    /// Every move, forward moves immediately followed by their inverses.
    pub const ALL: [MoveKind; 12] = [
        MoveKind::SinkDelete,
        MoveKind::SinkDeleteInverse,
        MoveKind::Reduction,
        MoveKind::ReductionInverse,
        MoveKind::InSplit,
        MoveKind::InSplitInverse,
        MoveKind::OutSplit,
        MoveKind::OutSplitInverse,
        MoveKind::CuntzSplice,
        MoveKind::CuntzSpliceInverse,
        MoveKind::Eclose,
        MoveKind::EcloseInverse,
    ];

    /// The move undoing this one.
    pub fn inverse(self) -> MoveKind {
        match self {
            MoveKind::SinkDelete => MoveKind::SinkDeleteInverse,
            MoveKind::SinkDeleteInverse => MoveKind::SinkDelete,
            MoveKind::Reduction => MoveKind::ReductionInverse,
            MoveKind::ReductionInverse => MoveKind::Reduction,
            MoveKind::InSplit => MoveKind::InSplitInverse,
            MoveKind::InSplitInverse => MoveKind::InSplit,
            MoveKind::OutSplit => MoveKind::OutSplitInverse,
            MoveKind::OutSplitInverse => MoveKind::OutSplit,
            MoveKind::CuntzSplice => MoveKind::CuntzSpliceInverse,
            MoveKind::CuntzSpliceInverse => MoveKind::CuntzSplice,
            MoveKind::Eclose => MoveKind::EcloseInverse,
            MoveKind::EcloseInverse => MoveKind::Eclose,
        }
    }

    /// Returns whether this is one of the six inverse moves.
    pub fn is_inverse(self) -> bool {
        matches!(
            self,
            MoveKind::SinkDeleteInverse
                | MoveKind::ReductionInverse
                | MoveKind::InSplitInverse
                | MoveKind::OutSplitInverse
                | MoveKind::CuntzSpliceInverse
                | MoveKind::EcloseInverse
        )
    }

    /// Short name: `S`, `R`, `I`, `O`, `C`, `P`, with `-inv` for inverses.
    pub fn symbol(self) -> &'static str {
        match self {
            MoveKind::SinkDelete => "S",
            MoveKind::SinkDeleteInverse => "S-inv",
            MoveKind::Reduction => "R",
            MoveKind::ReductionInverse => "R-inv",
            MoveKind::InSplit => "I",
            MoveKind::InSplitInverse => "I-inv",
            MoveKind::OutSplit => "O",
            MoveKind::OutSplitInverse => "O-inv",
            MoveKind::CuntzSplice => "C",
            MoveKind::CuntzSpliceInverse => "C-inv",
            MoveKind::Eclose => "P",
            MoveKind::EcloseInverse => "P-inv",
        }
    }

    /// Looks a move up by its [`symbol`](Self::symbol).
    pub fn from_symbol(symbol: &str) -> Result<MoveKind, KgsError> {
        MoveKind::ALL
            .into_iter()
            .find(|kind| kind.symbol() == symbol)
            .ok_or_else(|| {
                KgsError::invalid_argument("unknown-move", "no move has this symbol")
                    .with_context("symbol", symbol)
            })
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A rewrite move bound to one graph.
///
/// Construction scans the graph once and caches the viable components; a
/// move is a capability over that snapshot, so it must be rebuilt after the
/// graph changes. The concrete moves require a rank-1 graph and find nothing
/// to do on any other rank.
pub trait Move {
    /// Rewrite site accepted by the move.
    type Component: Clone + Debug;
    /// Data returned by the move that locates its inverse.
    type Inverse: Clone + Debug;

    /// Which move this is.
    const KIND: MoveKind;

    /// Graph the move operates on.
    fn graph(&self) -> &ColoredMultigraph;

    /// Components found viable when the move was built.
    fn viable_components(&self) -> &[Self::Component];

    /// Returns whether the move could fire anywhere when it was built.
    fn is_active(&self) -> bool {
        !self.viable_components().is_empty()
    }

    /// Scans the graph for viable components.
    fn compute_viable_components(&self) -> Result<Vec<Self::Component>, KgsError>;

    /// Structural check for a single component.
    fn is_viable(&self, component: &Self::Component) -> Result<bool, KgsError>;

    /// Rewrites the graph at `component` without re-checking viability.
    fn action(&mut self, component: &Self::Component) -> Result<Self::Inverse, KgsError>;

    /// Rewrites the graph at `component` if it is viable.
    fn apply(&mut self, component: &Self::Component) -> Result<Self::Inverse, KgsError> {
        if !self.is_viable(component)? {
            return Err(KgsError::precondition(
                "non-viable-component",
                "move cannot be applied at this component",
            )
            .with_context("move", Self::KIND)
            .with_context("component", format!("{component:?}")));
        }
        self.action(component)
    }
}

pub(crate) fn is_rank_one(graph: &ColoredMultigraph) -> bool {
    graph.colors() == 1
}

pub(crate) fn log_scan(kind: MoveKind, graph: &ColoredMultigraph, viable: usize) {
    debug!(
        kind = %kind,
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        viable,
        "scanned for viable components"
    );
}

pub(crate) fn out_of(
    graph: &ColoredMultigraph,
    vertex: VertexId,
) -> Result<Vec<VertexId>, KgsError> {
    graph.out_neighbors(vertex, ColorFilter::Only(0))
}

pub(crate) fn in_of(
    graph: &ColoredMultigraph,
    vertex: VertexId,
) -> Result<Vec<VertexId>, KgsError> {
    graph.in_neighbors(vertex, ColorFilter::Only(0))
}

pub(crate) fn sorted(mut list: Vec<VertexId>) -> Vec<VertexId> {
    list.sort_unstable();
    list
}

pub(crate) fn ensure_present(graph: &ColoredMultigraph, vertex: VertexId) -> Result<(), KgsError> {
    if graph.contains_vertex(vertex) {
        Ok(())
    } else {
        Err(
            KgsError::not_found("unknown-vertex", "component names a vertex outside the graph")
                .with_context("vertex", vertex),
        )
    }
}

pub(crate) fn malformed(message: &str) -> KgsError {
    KgsError::invalid_argument("malformed-component", message.to_string())
}
