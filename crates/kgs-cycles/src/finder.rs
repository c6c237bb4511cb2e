use std::collections::{BTreeMap, BTreeSet};

use kgs_core::{KgsError, VertexId};
use kgs_graph::{ColorFilter, ColoredMultigraph};
use tracing::debug;

use crate::config::CycleConfig;

/// Every simple directed cycle of a rank-1 graph, plus the vertex-to-cycle map.
///
/// Cycles are indexed in enumeration order. The finder remembers the graph
/// version it was built from; see [`CycleFinder::ensure_current`].
#[derive(Debug, Clone)]
pub struct CycleFinder {
    vertices: Vec<VertexId>,
    index: BTreeMap<VertexId, usize>,
    cycles: Vec<Vec<VertexId>>,
    dense: Vec<Vec<usize>>,
    tau: BTreeMap<VertexId, BTreeSet<usize>>,
    graph_version: u64,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: usize,
    cursor: usize,
    closed: bool,
}

impl CycleFinder {
    /// Enumerates all simple cycles of `graph` without a bound.
    pub fn new(graph: &ColoredMultigraph) -> Result<Self, KgsError> {
        Self::with_config(graph, &CycleConfig::default())
    }

    /// Enumerates the simple cycles of `graph` under `config`.
    pub fn with_config(graph: &ColoredMultigraph, config: &CycleConfig) -> Result<Self, KgsError> {
        if graph.colors() != 1 {
            return Err(KgsError::precondition(
                "non-rank-one-graph",
                "cycle enumeration requires a graph with exactly one color",
            )
            .with_context("k", graph.colors()));
        }
        let mut vertices = graph.vertices().to_vec();
        vertices.sort_unstable();
        let index: BTreeMap<VertexId, usize> = vertices
            .iter()
            .enumerate()
            .map(|(idx, vertex)| (*vertex, idx))
            .collect();
        let mut adjacency = Vec::with_capacity(vertices.len());
        for vertex in &vertices {
            let mut targets: Vec<usize> = graph
                .out_neighbors(*vertex, ColorFilter::All)?
                .iter()
                .filter_map(|w| index.get(w).copied())
                .collect();
            targets.sort_unstable();
            targets.dedup();
            adjacency.push(targets);
        }

        let dense = enumerate(&adjacency, config.max_cycles)?;
        let cycles: Vec<Vec<VertexId>> = dense
            .iter()
            .map(|cycle| cycle.iter().map(|idx| vertices[*idx]).collect())
            .collect();
        let mut tau: BTreeMap<VertexId, BTreeSet<usize>> = vertices
            .iter()
            .map(|vertex| (*vertex, BTreeSet::new()))
            .collect();
        for (c, cycle) in cycles.iter().enumerate() {
            for vertex in cycle {
                tau.entry(*vertex).or_default().insert(c);
            }
        }
        debug!(
            vertices = vertices.len(),
            cycles = cycles.len(),
            version = graph.version(),
            "enumerated simple cycles"
        );
        Ok(Self {
            vertices,
            index,
            cycles,
            dense,
            tau,
            graph_version: graph.version(),
        })
    }

    /// Number of cycles.
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    /// Returns whether the graph is acyclic.
    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// All cycles; each lists its vertices in traversal order.
    pub fn cycles(&self) -> &[Vec<VertexId>] {
        &self.cycles
    }

    /// Vertices of cycle `c` in traversal order.
    pub fn cycle(&self, c: usize) -> Result<&[VertexId], KgsError> {
        self.cycles
            .get(c)
            .map(Vec::as_slice)
            .ok_or_else(|| unknown_cycle(c, self.cycles.len()))
    }

    /// Indices of the cycles passing through `vertex`.
    pub fn cycles_at(&self, vertex: VertexId) -> Result<&BTreeSet<usize>, KgsError> {
        self.tau.get(&vertex).ok_or_else(|| {
            KgsError::not_found("unknown-vertex", "vertex was not part of the enumerated graph")
                .with_context("vertex", vertex)
        })
    }

    /// Graph version this enumeration was computed from.
    pub fn graph_version(&self) -> u64 {
        self.graph_version
    }

    /// Returns whether `graph` is unchanged since the enumeration.
    pub fn is_current(&self, graph: &ColoredMultigraph) -> bool {
        graph.version() == self.graph_version
    }

    /// Fails with `stale-cycles` once `graph` has been mutated since the
    /// enumeration.
    pub fn ensure_current(&self, graph: &ColoredMultigraph) -> Result<(), KgsError> {
        if !self.is_current(graph) {
            return Err(KgsError::precondition(
                "stale-cycles",
                "cycle data was computed for an earlier version of the graph",
            )
            .with_context("built", self.graph_version)
            .with_context("current", graph.version())
            .with_hint("rebuild the cycle finder after every mutation"));
        }
        Ok(())
    }

    pub(crate) fn vertex_total(&self) -> usize {
        self.vertices.len()
    }

    pub(crate) fn dense_index(&self, vertex: VertexId) -> Option<usize> {
        self.index.get(&vertex).copied()
    }

    pub(crate) fn dense_cycle(&self, c: usize) -> Result<&[usize], KgsError> {
        self.dense
            .get(c)
            .map(Vec::as_slice)
            .ok_or_else(|| unknown_cycle(c, self.dense.len()))
    }
}

pub(crate) fn unknown_cycle(c: usize, total: usize) -> KgsError {
    KgsError::invalid_argument("unknown-cycle", "cycle index out of range")
        .with_context("cycle", c)
        .with_context("cycles", total)
}

/// Johnson-style elementary circuit search over dense, deduplicated adjacency.
///
/// For every start `s` only vertices `>= s` are explored; a vertex stays
/// blocked until a cycle through the start is found below it, and the
/// `waiting` lists record whom to unblock when that happens.
fn enumerate(adjacency: &[Vec<usize>], limit: Option<usize>) -> Result<Vec<Vec<usize>>, KgsError> {
    let n = adjacency.len();
    let mut cycles = Vec::new();
    let mut blocked = vec![false; n];
    let mut waiting: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    let mut path: Vec<usize> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for start in 0..n {
        for slot in start..n {
            blocked[slot] = false;
            waiting[slot].clear();
        }
        blocked[start] = true;
        path.push(start);
        stack.push(Frame {
            node: start,
            cursor: 0,
            closed: false,
        });

        while let Some(top) = stack.len().checked_sub(1) {
            let Frame { node, cursor, .. } = stack[top];
            if let Some(&next) = adjacency[node].get(cursor) {
                stack[top].cursor += 1;
                if next < start {
                    continue;
                }
                if next == start {
                    cycles.push(path.clone());
                    if let Some(max) = limit {
                        if cycles.len() > max {
                            return Err(KgsError::precondition(
                                "cycle-limit-exceeded",
                                "graph has more simple cycles than the configured bound",
                            )
                            .with_context("max_cycles", max));
                        }
                    }
                    stack[top].closed = true;
                } else if !blocked[next] {
                    blocked[next] = true;
                    path.push(next);
                    stack.push(Frame {
                        node: next,
                        cursor: 0,
                        closed: false,
                    });
                }
                continue;
            }

            let closed = stack[top].closed;
            stack.pop();
            path.pop();
            if closed {
                unblock(node, &mut blocked, &mut waiting);
            } else {
                for &next in adjacency[node].iter().filter(|w| **w >= start) {
                    waiting[next].insert(node);
                }
            }
            if let Some(parent) = stack.last_mut() {
                parent.closed |= closed;
            }
        }
    }
    Ok(cycles)
}

fn unblock(vertex: usize, blocked: &mut [bool], waiting: &mut [BTreeSet<usize>]) {
    let mut worklist = vec![vertex];
    while let Some(current) = worklist.pop() {
        blocked[current] = false;
        for next in std::mem::take(&mut waiting[current]) {
            if blocked[next] {
                worklist.push(next);
            }
        }
    }
}
