use std::collections::{BTreeMap, VecDeque};

/// Undirected connected components over an arbitrary node set.
///
/// Nodes are any ordered copyable labels: graph vertices for plain
/// connectivity, or cycle indices when clustering intersecting cycles.
#[derive(Debug, Clone)]
pub struct ComponentFinder<T> {
    nodes: Vec<T>,
    index: BTreeMap<T, usize>,
    adjacency: Vec<Vec<usize>>,
}

/// Partition of the (included) nodes into connected components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components<T> {
    chains: Vec<Vec<T>>,
    membership: BTreeMap<T, usize>,
}

impl<T: Copy + Ord> ComponentFinder<T> {
    /// Builds the finder from a node set and undirected pairs.
    ///
    /// Endpoints of pairs that are missing from `nodes` are appended in order
    /// of first appearance. Pairs joining a node to itself are ignored.
    pub fn new(
        nodes: impl IntoIterator<Item = T>,
        pairs: impl IntoIterator<Item = (T, T)>,
    ) -> Self {
        let mut finder = Self {
            nodes: Vec::new(),
            index: BTreeMap::new(),
            adjacency: Vec::new(),
        };
        for node in nodes {
            finder.intern(node);
        }
        for (a, b) in pairs {
            let ia = finder.intern(a);
            let ib = finder.intern(b);
            if ia != ib {
                finder.adjacency[ia].push(ib);
                finder.adjacency[ib].push(ia);
            }
        }
        finder
    }

    /// Builds the finder from pairs alone; the node set is their endpoints.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (T, T)>) -> Self {
        Self::new(std::iter::empty(), pairs)
    }

    /// Nodes in iteration order.
    pub fn nodes(&self) -> &[T] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the finder has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Components of the full node set.
    pub fn components(&self) -> Components<T> {
        self.components_filtered(|_| true)
    }

    /// Components of the subgraph induced by the nodes satisfying `include`.
    ///
    /// Seeds are taken in node order and each component lists its nodes in
    /// breadth-first order from its seed. Excluded nodes belong to no
    /// component.
    pub fn components_filtered(&self, include: impl Fn(T) -> bool) -> Components<T> {
        let mut chains: Vec<Vec<T>> = Vec::new();
        let mut assigned: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut queue = VecDeque::new();
        for seed in 0..self.nodes.len() {
            if assigned[seed].is_some() || !include(self.nodes[seed]) {
                continue;
            }
            let component = chains.len();
            let mut chain = Vec::new();
            assigned[seed] = Some(component);
            queue.push_back(seed);
            while let Some(current) = queue.pop_front() {
                chain.push(self.nodes[current]);
                for &next in &self.adjacency[current] {
                    if assigned[next].is_none() && include(self.nodes[next]) {
                        assigned[next] = Some(component);
                        queue.push_back(next);
                    }
                }
            }
            chains.push(chain);
        }
        let membership = assigned
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.map(|component| (self.nodes[idx], component)))
            .collect();
        Components { chains, membership }
    }

    fn intern(&mut self, node: T) -> usize {
        if let Some(&idx) = self.index.get(&node) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(node);
        self.index.insert(node, idx);
        self.adjacency.push(Vec::new());
        idx
    }
}

impl<T: Copy + Ord> Components<T> {
    /// Every component, in seed order.
    pub fn chains(&self) -> &[Vec<T>] {
        &self.chains
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns whether no node was included.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Index of the component containing `node`.
    pub fn component_of(&self, node: T) -> Option<usize> {
        self.membership.get(&node).copied()
    }

    /// Nodes of the component containing `node`.
    pub fn chain_of(&self, node: T) -> Option<&[T]> {
        self.component_of(node)
            .and_then(|idx| self.chains.get(idx))
            .map(Vec::as_slice)
    }

    /// Consumes the partition, returning the components.
    pub fn into_chains(self) -> Vec<Vec<T>> {
        self.chains
    }
}
