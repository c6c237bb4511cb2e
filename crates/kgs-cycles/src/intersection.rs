use std::cell::{RefCell, RefMut};
use std::collections::{BTreeMap, BTreeSet};

use kgs_core::{KgsError, VertexId};
use kgs_graph::{ColoredMultigraph, ComponentFinder, Components};
use tracing::debug;

use crate::finder::{unknown_cycle, CycleFinder};

/// Undirected graph on cycles: two cycles are adjacent when they share a
/// vertex.
///
/// Each adjacency remembers the vertices witnessing it, and the intersection
/// graph is split into connected chains once at construction.
#[derive(Debug)]
pub struct CycleIntersection {
    finder: CycleFinder,
    adjacency: Vec<BTreeMap<usize, BTreeSet<VertexId>>>,
    pairs: usize,
    graph: ComponentFinder<usize>,
    chains: Components<usize>,
    scratch: RefCell<Vec<u32>>,
}

/// A cycle whose vertices are loaded into the shared counting vector.
///
/// Dropping the guard removes exactly the counts it added, so the vector is
/// back to all zeros on every exit path.
struct LoadedCycle<'a> {
    counts: RefMut<'a, Vec<u32>>,
    loaded: &'a [usize],
}

impl<'a> LoadedCycle<'a> {
    fn load(scratch: &'a RefCell<Vec<u32>>, loaded: &'a [usize]) -> Result<Self, KgsError> {
        let mut counts = scratch.try_borrow_mut().map_err(|_| {
            KgsError::invariant(
                "scratch-in-use",
                "intersection vector is already loaded by another query",
            )
        })?;
        for idx in loaded {
            counts[*idx] += 1;
        }
        Ok(Self { counts, loaded })
    }

    fn contains(&self, idx: usize) -> bool {
        self.counts.get(idx).is_some_and(|count| *count > 0)
    }
}

impl Drop for LoadedCycle<'_> {
    fn drop(&mut self) {
        for idx in self.loaded {
            self.counts[*idx] -= 1;
        }
    }
}

impl CycleIntersection {
    /// Enumerates the cycles of `graph` and builds their intersection graph.
    pub fn build(graph: &ColoredMultigraph) -> Result<Self, KgsError> {
        let finder = CycleFinder::new(graph)?;
        Self::new(graph, finder)
    }

    /// Builds the intersection graph from an existing enumeration of `graph`.
    pub fn new(graph: &ColoredMultigraph, finder: CycleFinder) -> Result<Self, KgsError> {
        finder.ensure_current(graph)?;
        let total = finder.len();
        let mut adjacency: Vec<BTreeMap<usize, BTreeSet<VertexId>>> = vec![BTreeMap::new(); total];
        let mut pairs: BTreeSet<(usize, usize)> = BTreeSet::new();
        for c in 0..total {
            for vertex in finder.cycle(c)? {
                for &d in finder.cycles_at(*vertex)? {
                    if c == d {
                        continue;
                    }
                    adjacency[c].entry(d).or_default().insert(*vertex);
                    adjacency[d].entry(c).or_default().insert(*vertex);
                    pairs.insert((c.min(d), c.max(d)));
                }
            }
        }
        let pair_count = pairs.len();
        let cycle_graph = ComponentFinder::new(0..total, pairs);
        let chains = cycle_graph.components();
        debug!(
            cycles = total,
            intersections = pair_count,
            chains = chains.len(),
            "built cycle intersection graph"
        );
        let scratch = RefCell::new(vec![0; finder.vertex_total()]);
        Ok(Self {
            finder,
            adjacency,
            pairs: pair_count,
            graph: cycle_graph,
            chains,
            scratch,
        })
    }

    /// Underlying cycle enumeration.
    pub fn finder(&self) -> &CycleFinder {
        &self.finder
    }

    /// Number of cycles.
    pub fn cycle_count(&self) -> usize {
        self.finder.len()
    }

    /// Number of unordered pairs of intersecting cycles.
    pub fn intersection_count(&self) -> usize {
        self.pairs
    }

    /// Connected chains of the intersection graph.
    pub fn chains(&self) -> &Components<usize> {
        &self.chains
    }

    /// Fails with `stale-cycles` once `graph` changed after the enumeration.
    pub fn ensure_current(&self, graph: &ColoredMultigraph) -> Result<(), KgsError> {
        self.finder.ensure_current(graph)
    }

    /// Cycles sharing a vertex with cycle `c`, in index order.
    ///
    /// With `excluded`, an intersection only counts when at least one of its
    /// witnessing vertices is not excluded.
    pub fn intersect(
        &self,
        c: usize,
        excluded: Option<&dyn Fn(VertexId) -> bool>,
    ) -> Result<Vec<usize>, KgsError> {
        let neighbors = self
            .adjacency
            .get(c)
            .ok_or_else(|| unknown_cycle(c, self.cycle_count()))?;
        Ok(neighbors
            .iter()
            .filter(|(_, witnesses)| match excluded {
                Some(skip) => witnesses.iter().any(|vertex| !skip(*vertex)),
                None => true,
            })
            .map(|(d, _)| *d)
            .collect())
    }

    /// Vertices shared by cycles `c` and `d`, in the traversal order of `d`.
    pub fn intersect_vertices(&self, c: usize, d: usize) -> Result<Vec<VertexId>, KgsError> {
        let loaded = LoadedCycle::load(&self.scratch, self.finder.dense_cycle(c)?)?;
        let probe = self.finder.dense_cycle(d)?;
        let members = self.finder.cycle(d)?;
        Ok(probe
            .iter()
            .zip(members)
            .filter(|(idx, _)| loaded.contains(**idx))
            .map(|(_, vertex)| *vertex)
            .collect())
    }

    /// Cycles still reachable from `c` once `forbidden` vertices are removed.
    ///
    /// Restricts the chain containing `c` to `c` itself plus every cycle that
    /// avoids all of `forbidden`, then returns the component of `c` in that
    /// restriction.
    pub fn return_path_component(
        &self,
        c: usize,
        forbidden: &BTreeSet<VertexId>,
    ) -> Result<Vec<usize>, KgsError> {
        let chain = self
            .chains
            .chain_of(c)
            .ok_or_else(|| unknown_cycle(c, self.cycle_count()))?;
        let forbidden_idx: Vec<usize> = forbidden
            .iter()
            .filter_map(|vertex| self.finder.dense_index(*vertex))
            .collect();
        let mut keep: BTreeSet<usize> = BTreeSet::new();
        keep.insert(c);
        for &d in chain {
            let loaded = LoadedCycle::load(&self.scratch, self.finder.dense_cycle(d)?)?;
            if forbidden_idx.iter().all(|idx| !loaded.contains(*idx)) {
                keep.insert(d);
            }
        }
        let restricted = self.graph.components_filtered(|d| keep.contains(&d));
        Ok(restricted
            .chain_of(c)
            .map(<[usize]>::to_vec)
            .unwrap_or_else(|| vec![c]))
    }

    /// Cycles reachable from `c` without passing through `vertex`.
    pub fn largest_return_path_component(
        &self,
        vertex: VertexId,
        c: usize,
    ) -> Result<Vec<usize>, KgsError> {
        self.return_path_component(c, &BTreeSet::from([vertex]))
    }

    /// Returns whether the shared counting vector is all zeros.
    pub fn scratch_is_clear(&self) -> bool {
        self.scratch
            .try_borrow()
            .map(|counts| counts.iter().all(|count| *count == 0))
            .unwrap_or(false)
    }
}
