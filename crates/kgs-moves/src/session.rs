use std::collections::{BTreeMap, BTreeSet};

use kgs_core::{KgsError, VertexId};
use kgs_graph::{invariant_hash, ColoredMultigraph};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::framework::MoveKind;
use crate::step::{apply_step, apply_step_tracked, viable_steps, Step};

/// A step that was applied, with the step that undoes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedStep {
    /// Step as requested.
    pub step: Step,
    /// Step returned by the move, undoing `step`.
    pub inverse: Step,
    /// Vertices `step` deleted, in the order `inverse` recreates them.
    pub removed: Vec<VertexId>,
    /// Label-free fingerprint of the graph before `step`.
    pub fingerprint: String,
}

/// A graph together with the rewrites applied to it so far.
///
/// Undo replays the recorded inverse on the live graph. Inverse steps give
/// recreated vertices fresh identifiers, so undo renames them back to the
/// identifiers they had before the step and older entries stay valid.
#[derive(Debug, Clone)]
pub struct RewriteSession {
    graph: ColoredMultigraph,
    history: Vec<AppliedStep>,
}

impl RewriteSession {
    /// Starts a session on `graph` with an empty history.
    pub fn new(graph: ColoredMultigraph) -> Self {
        Self {
            graph,
            history: Vec::new(),
        }
    }

    /// Current graph.
    pub fn graph(&self) -> &ColoredMultigraph {
        &self.graph
    }

    /// Applied steps, oldest first.
    pub fn history(&self) -> &[AppliedStep] {
        &self.history
    }

    /// Ends the session, returning the graph.
    pub fn into_graph(self) -> ColoredMultigraph {
        self.graph
    }

    /// Label-free fingerprint of the current graph.
    pub fn fingerprint(&self) -> String {
        invariant_hash(&self.graph)
    }

    /// Every viable step of `kind` on the current graph.
    pub fn viable(&mut self, kind: MoveKind) -> Result<Vec<Step>, KgsError> {
        viable_steps(&mut self.graph, kind)
    }

    /// Applies `step` and records it; returns the inverse step.
    pub fn apply(&mut self, step: Step) -> Result<&Step, KgsError> {
        let fingerprint = invariant_hash(&self.graph);
        let (inverse, removed) = apply_step_tracked(&mut self.graph, &step)?;
        self.history.push(AppliedStep {
            step,
            inverse,
            removed,
            fingerprint,
        });
        let depth = self.history.len();
        debug!(depth, "recorded step");
        Ok(&self.history[depth - 1].inverse)
    }

    /// Applies every step in order, stopping at the first failure.
    pub fn apply_all(&mut self, steps: impl IntoIterator<Item = Step>) -> Result<usize, KgsError> {
        let mut applied = 0;
        for step in steps {
            self.apply(step)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Undoes the most recent step; returns it, or `None` on an empty history.
    ///
    /// The inverse step runs on the live graph and must reproduce the recorded
    /// fingerprint. A non-viable inverse leaves the graph untouched; a
    /// fingerprint mismatch is fatal.
    pub fn undo(&mut self) -> Result<Option<Step>, KgsError> {
        let Some(last) = self.history.last() else {
            return Ok(None);
        };
        let before: BTreeSet<VertexId> = self.graph.vertices().iter().copied().collect();
        apply_step(&mut self.graph, &last.inverse)
            .map_err(|err| err.with_context("undoing", last.step.kind()))?;
        let restored = invariant_hash(&self.graph);
        if restored != last.fingerprint {
            return Err(KgsError::invariant(
                "undo-mismatch",
                "inverse step did not reproduce the earlier graph",
            )
            .with_context("undoing", last.step.kind())
            .with_context("expected", &last.fingerprint)
            .with_context("found", restored));
        }
        let created: Vec<VertexId> = self
            .graph
            .vertices()
            .iter()
            .copied()
            .filter(|vertex| !before.contains(vertex))
            .collect();
        if created.len() != last.removed.len() {
            return Err(KgsError::invariant(
                "undo-mismatch",
                "inverse step recreated a different number of vertices",
            )
            .with_context("undoing", last.step.kind())
            .with_context("expected", last.removed.len())
            .with_context("found", created.len()));
        }
        let renaming: BTreeMap<VertexId, VertexId> =
            created.into_iter().zip(last.removed.iter().copied()).collect();
        self.graph.rename_vertices(&renaming)?;
        let undone = self.history.pop().map(|applied| applied.step);
        debug!(depth = self.history.len(), renamed = renaming.len(), "undid step");
        Ok(undone)
    }
}
