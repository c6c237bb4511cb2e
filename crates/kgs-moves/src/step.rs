use kgs_core::{KgsError, VertexId};
use kgs_graph::ColoredMultigraph;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::{EdgeBundle, SpliceMotif, VertexPair, VertexPartition};
use crate::cuntz_splice::{CuntzSplice, CuntzSpliceInverse};
use crate::eclose::{Eclose, EcloseInverse};
use crate::framework::{Move, MoveKind};
use crate::in_split::{InSplit, InSplitInverse};
use crate::out_split::{OutSplit, OutSplitInverse};
use crate::reduction::{Reduction, ReductionInverse};
use crate::sink_delete::{SinkDelete, SinkDeleteInverse};

/// One rewrite: a move together with the component it acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "move", content = "component", rename_all = "kebab-case")]
pub enum Step {
    /// Delete this sink.
    SinkDelete(VertexId),
    /// Add a sink fed by these sources.
    SinkDeleteInverse(Vec<VertexId>),
    /// Collapse this vertex.
    Reduction(VertexId),
    /// Subdivide this edge bundle.
    ReductionInverse(EdgeBundle),
    /// In-split along this partition.
    InSplit(VertexPartition),
    /// Merge this in-split pair.
    InSplitInverse(VertexPair),
    /// Out-split along this partition.
    OutSplit(VertexPartition),
    /// Merge this out-split pair.
    OutSplitInverse(VertexPair),
    /// Cuntz-splice at this vertex.
    CuntzSplice(VertexId),
    /// Remove this gadget.
    CuntzSpliceInverse(SpliceMotif),
    /// Close the loop at this vertex.
    Eclose(VertexId),
    /// Reopen the loop at this vertex.
    EcloseInverse(VertexId),
}

impl Step {
    /// Move performed by this step.
    pub fn kind(&self) -> MoveKind {
        match self {
            Step::SinkDelete(_) => MoveKind::SinkDelete,
            Step::SinkDeleteInverse(_) => MoveKind::SinkDeleteInverse,
            Step::Reduction(_) => MoveKind::Reduction,
            Step::ReductionInverse(_) => MoveKind::ReductionInverse,
            Step::InSplit(_) => MoveKind::InSplit,
            Step::InSplitInverse(_) => MoveKind::InSplitInverse,
            Step::OutSplit(_) => MoveKind::OutSplit,
            Step::OutSplitInverse(_) => MoveKind::OutSplitInverse,
            Step::CuntzSplice(_) => MoveKind::CuntzSplice,
            Step::CuntzSpliceInverse(_) => MoveKind::CuntzSpliceInverse,
            Step::Eclose(_) => MoveKind::Eclose,
            Step::EcloseInverse(_) => MoveKind::EcloseInverse,
        }
    }
}

/// Applies `step` to `graph` and returns the step that undoes it.
///
/// Fails with `non-viable-component` when the step cannot fire; the graph is
/// left untouched in that case.
pub fn apply_step(graph: &mut ColoredMultigraph, step: &Step) -> Result<Step, KgsError> {
    apply_step_tracked(graph, step).map(|(inverse, _)| inverse)
}

/// Like [`apply_step`], but also returns the vertices `step` deleted, in the
/// order the returned inverse creates their replacements.
pub(crate) fn apply_step_tracked(
    graph: &mut ColoredMultigraph,
    step: &Step,
) -> Result<(Step, Vec<VertexId>), KgsError> {
    let (inverse, removed) = match step {
        Step::SinkDelete(vertex) => (
            Step::SinkDeleteInverse(SinkDelete::new(graph)?.apply(vertex)?),
            vec![*vertex],
        ),
        Step::SinkDeleteInverse(sources) => (
            Step::SinkDelete(SinkDeleteInverse::new(graph)?.apply(sources)?),
            Vec::new(),
        ),
        Step::Reduction(vertex) => (
            Step::ReductionInverse(Reduction::new(graph)?.apply(vertex)?),
            vec![*vertex],
        ),
        Step::ReductionInverse(bundle) => (
            Step::Reduction(ReductionInverse::new(graph)?.apply(bundle)?),
            Vec::new(),
        ),
        Step::InSplit(partition) => (
            Step::InSplitInverse(InSplit::new(graph)?.apply(partition)?),
            vec![partition.vertex],
        ),
        Step::InSplitInverse(pair) => (
            Step::InSplit(InSplitInverse::new(graph)?.apply(pair)?),
            vec![pair.first, pair.second],
        ),
        Step::OutSplit(partition) => (
            Step::OutSplitInverse(OutSplit::new(graph)?.apply(partition)?),
            vec![partition.vertex],
        ),
        Step::OutSplitInverse(pair) => (
            Step::OutSplit(OutSplitInverse::new(graph)?.apply(pair)?),
            vec![pair.first, pair.second],
        ),
        Step::CuntzSplice(vertex) => (
            Step::CuntzSpliceInverse(CuntzSplice::new(graph)?.apply(vertex)?),
            Vec::new(),
        ),
        Step::CuntzSpliceInverse(motif) => (
            Step::CuntzSplice(CuntzSpliceInverse::new(graph)?.apply(motif)?),
            motif.gadget().to_vec(),
        ),
        Step::Eclose(vertex) => (
            Step::EcloseInverse(Eclose::new(graph)?.apply(vertex)?),
            Vec::new(),
        ),
        Step::EcloseInverse(vertex) => {
            let mut reopen = EcloseInverse::new(graph)?;
            // Eclose rebuilds gadgets in exit order, inner before outer
            let mut bucket = reopen.bucket(*vertex).to_vec();
            bucket.sort_by_key(|motif| motif.anchor);
            let inverse = Step::Eclose(reopen.apply(vertex)?);
            (inverse, bucket.iter().flat_map(SpliceMotif::gadget).collect())
        }
    };
    debug!(
        kind = %step.kind(),
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        removed = removed.len(),
        "applied step"
    );
    Ok((inverse, removed))
}

/// Every viable step of `kind` on the current graph.
///
/// The graph is borrowed mutably because moves bind to it, but it is not
/// modified.
pub fn viable_steps(graph: &mut ColoredMultigraph, kind: MoveKind) -> Result<Vec<Step>, KgsError> {
    fn wrap<C: Clone>(viable: &[C], into: fn(C) -> Step) -> Vec<Step> {
        viable.iter().cloned().map(into).collect()
    }

    let steps = match kind {
        MoveKind::SinkDelete => wrap(SinkDelete::new(graph)?.viable_components(), Step::SinkDelete),
        MoveKind::SinkDeleteInverse => wrap(
            SinkDeleteInverse::new(graph)?.viable_components(),
            Step::SinkDeleteInverse,
        ),
        MoveKind::Reduction => wrap(Reduction::new(graph)?.viable_components(), Step::Reduction),
        MoveKind::ReductionInverse => wrap(
            ReductionInverse::new(graph)?.viable_components(),
            Step::ReductionInverse,
        ),
        MoveKind::InSplit => wrap(InSplit::new(graph)?.viable_components(), Step::InSplit),
        MoveKind::InSplitInverse => wrap(
            InSplitInverse::new(graph)?.viable_components(),
            Step::InSplitInverse,
        ),
        MoveKind::OutSplit => wrap(OutSplit::new(graph)?.viable_components(), Step::OutSplit),
        MoveKind::OutSplitInverse => wrap(
            OutSplitInverse::new(graph)?.viable_components(),
            Step::OutSplitInverse,
        ),
        MoveKind::CuntzSplice => {
            wrap(CuntzSplice::new(graph)?.viable_components(), Step::CuntzSplice)
        }
        MoveKind::CuntzSpliceInverse => wrap(
            CuntzSpliceInverse::new(graph)?.viable_components(),
            Step::CuntzSpliceInverse,
        ),
        MoveKind::Eclose => wrap(Eclose::new(graph)?.viable_components(), Step::Eclose),
        MoveKind::EcloseInverse => wrap(
            EcloseInverse::new(graph)?.viable_components(),
            Step::EcloseInverse,
        ),
    };
    Ok(steps)
}
