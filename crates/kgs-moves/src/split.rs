//! Split and merge shared by in-splits and out-splits.
//!
//! An in-split partitions the in-neighbors of a vertex and duplicates its
//! out-edges; an out-split is the same construction with every edge reversed.
//! The "split side" is the partitioned one, the "shared side" the duplicated
//! one.

use std::collections::{BTreeMap, BTreeSet};

use kgs_core::{KgsError, VertexId};
use kgs_graph::ColoredMultigraph;
use tracing::trace;

use crate::components::{VertexPair, VertexPartition};
use crate::framework::{ensure_present, in_of, malformed, out_of, sorted};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Orientation {
    In,
    Out,
}

impl Orientation {
    fn split_side(
        self,
        graph: &ColoredMultigraph,
        vertex: VertexId,
    ) -> Result<Vec<VertexId>, KgsError> {
        match self {
            Orientation::In => in_of(graph, vertex),
            Orientation::Out => out_of(graph, vertex),
        }
    }

    fn shared_side(
        self,
        graph: &ColoredMultigraph,
        vertex: VertexId,
    ) -> Result<Vec<VertexId>, KgsError> {
        match self {
            Orientation::In => out_of(graph, vertex),
            Orientation::Out => in_of(graph, vertex),
        }
    }

    /// Adds an edge between `vertex` and `far` on the shared side.
    fn link_shared(
        self,
        graph: &mut ColoredMultigraph,
        vertex: VertexId,
        far: VertexId,
    ) -> Result<(), KgsError> {
        match self {
            Orientation::In => graph.add_edge(vertex, far, 0),
            Orientation::Out => graph.add_edge(far, vertex, 0),
        }
    }

    /// Adds an edge between `vertex` and `far` on the split side.
    fn link_split(
        self,
        graph: &mut ColoredMultigraph,
        vertex: VertexId,
        far: VertexId,
    ) -> Result<(), KgsError> {
        match self {
            Orientation::In => graph.add_edge(far, vertex, 0),
            Orientation::Out => graph.add_edge(vertex, far, 0),
        }
    }
}

/// Distinct split-side neighbors of `vertex`.
pub(crate) fn split_neighbors(
    graph: &ColoredMultigraph,
    orientation: Orientation,
    vertex: VertexId,
) -> Result<BTreeSet<VertexId>, KgsError> {
    Ok(orientation.split_side(graph, vertex)?.into_iter().collect())
}

pub(crate) fn partition_viable(
    graph: &ColoredMultigraph,
    orientation: Orientation,
    partition: &VertexPartition,
) -> Result<bool, KgsError> {
    ensure_present(graph, partition.vertex)?;
    let neighbors = split_neighbors(graph, orientation, partition.vertex)?;
    Ok(neighbors.len() >= 2 && partition.covers(&neighbors))
}

/// One partition per splittable vertex: the first neighbor other than the
/// vertex itself against all the rest. Every other partition of the same
/// vertex is reachable by moving neighbors between the parts.
pub(crate) fn default_partitions(
    graph: &ColoredMultigraph,
    orientation: Orientation,
) -> Result<Vec<VertexPartition>, KgsError> {
    let mut partitions = Vec::new();
    for vertex in graph.vertices() {
        let neighbors = split_neighbors(graph, orientation, *vertex)?;
        if neighbors.len() < 2 {
            continue;
        }
        let Some(first) = neighbors.iter().find(|w| *w != vertex).copied() else {
            continue;
        };
        let mut e2 = neighbors;
        e2.remove(&first);
        partitions.push(VertexPartition {
            vertex: *vertex,
            e1: BTreeSet::from([first]),
            e2,
        });
    }
    Ok(partitions)
}

/// Replaces `partition.vertex` by two copies.
///
/// Coverage is re-verified before the graph is touched; a partition that does
/// not cover the split side is an invariant violation.
pub(crate) fn split(
    graph: &mut ColoredMultigraph,
    orientation: Orientation,
    partition: &VertexPartition,
) -> Result<VertexPair, KgsError> {
    let vertex = partition.vertex;
    let split_side = orientation.split_side(graph, vertex)?;
    let shared_side = orientation.shared_side(graph, vertex)?;
    let neighbors: BTreeSet<VertexId> = split_side.iter().copied().collect();
    if !partition.covers(&neighbors) {
        return Err(KgsError::invariant(
            "partition-not-covering",
            "partition does not split the neighbor set into two disjoint non-empty parts",
        )
        .with_context("vertex", vertex)
        .with_context("e1", format!("{:?}", partition.e1))
        .with_context("e2", format!("{:?}", partition.e2))
        .with_context("neighbors", format!("{neighbors:?}")));
    }

    graph.del_vertex(vertex)?;
    let first = graph.add_vertex(None)?;
    let second = graph.add_vertex(None)?;
    let copy_for = |neighbor: &VertexId| {
        if partition.e1.contains(neighbor) {
            first
        } else {
            second
        }
    };

    // a self-loop is shared-side from each copy and lands on the copy owning `vertex`
    for far in &shared_side {
        let far = if *far == vertex { copy_for(&vertex) } else { *far };
        orientation.link_shared(graph, first, far)?;
        orientation.link_shared(graph, second, far)?;
    }
    for far in split_side.iter().filter(|far| **far != vertex) {
        orientation.link_split(graph, copy_for(far), *far)?;
    }
    trace!(
        vertex = %vertex,
        first = %first,
        second = %second,
        orientation = ?orientation,
        "split vertex"
    );
    Ok(VertexPair { first, second })
}

pub(crate) fn pair_viable(
    graph: &ColoredMultigraph,
    orientation: Orientation,
    pair: &VertexPair,
) -> Result<bool, KgsError> {
    if pair.first == pair.second {
        return Err(malformed("a merge needs two distinct vertices"));
    }
    ensure_present(graph, pair.first)?;
    ensure_present(graph, pair.second)?;
    let shared_first = sorted(orientation.shared_side(graph, pair.first)?);
    let shared_second = sorted(orientation.shared_side(graph, pair.second)?);
    if shared_first != shared_second {
        return Ok(false);
    }
    let split_first = split_neighbors(graph, orientation, pair.first)?;
    let split_second = split_neighbors(graph, orientation, pair.second)?;
    Ok(!split_first.is_empty()
        && !split_second.is_empty()
        && split_first.is_disjoint(&split_second))
}

/// Every mergeable pair, found by grouping vertices on their shared-side
/// multiset.
pub(crate) fn candidate_pairs(
    graph: &ColoredMultigraph,
    orientation: Orientation,
) -> Result<Vec<VertexPair>, KgsError> {
    let mut groups: BTreeMap<Vec<VertexId>, Vec<VertexId>> = BTreeMap::new();
    for vertex in graph.vertices() {
        let key = sorted(orientation.shared_side(graph, *vertex)?);
        groups.entry(key).or_default().push(*vertex);
    }
    let mut pairs = Vec::new();
    for members in groups.values() {
        for (idx, first) in members.iter().enumerate() {
            for second in &members[idx + 1..] {
                let pair = VertexPair {
                    first: (*first).min(*second),
                    second: (*first).max(*second),
                };
                if pair_viable(graph, orientation, &pair)? {
                    pairs.push(pair);
                }
            }
        }
    }
    pairs.sort_unstable();
    Ok(pairs)
}

/// Merges a split pair back into one vertex and reconstructs the partition.
pub(crate) fn merge(
    graph: &mut ColoredMultigraph,
    orientation: Orientation,
    pair: &VertexPair,
) -> Result<VertexPartition, KgsError> {
    let shared_side = orientation.shared_side(graph, pair.first)?;
    let split_first = orientation.split_side(graph, pair.first)?;
    let split_second = orientation.split_side(graph, pair.second)?;
    let in_pair = |vertex: &VertexId| *vertex == pair.first || *vertex == pair.second;

    graph.del_vertex(pair.first)?;
    graph.del_vertex(pair.second)?;
    let merged = graph.add_vertex(None)?;
    for far in &shared_side {
        let far = if in_pair(far) { merged } else { *far };
        orientation.link_shared(graph, merged, far)?;
    }
    for far in split_first.iter().chain(&split_second).filter(|far| !in_pair(far)) {
        orientation.link_split(graph, merged, *far)?;
    }

    let rename = |side: &[VertexId]| -> BTreeSet<VertexId> {
        side.iter()
            .map(|far| if in_pair(far) { merged } else { *far })
            .collect()
    };
    trace!(
        first = %pair.first,
        second = %pair.second,
        merged = %merged,
        orientation = ?orientation,
        "merged split pair"
    );
    Ok(VertexPartition {
        vertex: merged,
        e1: rename(&split_first),
        e2: rename(&split_second),
    })
}
