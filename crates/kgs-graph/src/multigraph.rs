use std::collections::{BTreeMap, BTreeSet};

use kgs_core::{Color, KgsError, VertexId};
use serde::{Deserialize, Serialize};

use crate::components::{ComponentFinder, Components};
use crate::config::GraphConfig;

/// Selects the color classes a neighborhood or degree query ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFilter<'a> {
    /// Every color class of the graph.
    All,
    /// A single color class.
    Only(Color),
    /// An explicit list of color classes, visited in the given order.
    Subset(&'a [Color]),
}

impl From<Color> for ColorFilter<'_> {
    fn from(color: Color) -> Self {
        ColorFilter::Only(color)
    }
}

/// Outgoing and incoming neighbor multisets of a vertex.
///
/// Each edge instance contributes one entry, so parallel edges repeat the
/// neighbor and a self-loop shows up once on each side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighborhood {
    /// Targets of edges leaving the vertex.
    pub outgoing: Vec<VertexId>,
    /// Sources of edges entering the vertex.
    pub incoming: Vec<VertexId>,
}

impl Neighborhood {
    /// Returns the union of both sides, outgoing entries first.
    pub fn symmetric(self) -> Vec<VertexId> {
        let mut all = self.outgoing;
        all.extend(self.incoming);
        all
    }

    /// Number of edge instances incident to the vertex.
    pub fn degree(&self) -> usize {
        self.outgoing.len() + self.incoming.len()
    }
}

/// Per-color adjacency table: one [`Neighborhood`] per vertex.
pub type AdjacencyTable = BTreeMap<VertexId, Neighborhood>;

/// Mutable directed multigraph whose edges are partitioned into `k` colors.
///
/// Every color class keeps its own adjacency table. An edge `(v, w, c)` is
/// stored as one `w` entry in the outgoing list of `v` and one `v` entry in
/// the incoming list of `w`, both in table `c`.
#[derive(Debug, Clone)]
pub struct ColoredMultigraph {
    config: GraphConfig,
    vertices: Vec<VertexId>,
    tables: Vec<AdjacencyTable>,
    edge_count: usize,
    /// Smallest identifier never used by this graph; `None` once the
    /// identifier space is exhausted.
    next_vertex: Option<VertexId>,
    version: u64,
}

impl ColoredMultigraph {
    /// Creates an empty graph with `colors` edge color classes.
    pub fn new(colors: usize) -> Self {
        Self::with_config(GraphConfig::with_colors(colors))
    }

    /// Creates an empty graph with the provided configuration.
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            config,
            vertices: Vec::new(),
            tables: vec![AdjacencyTable::new(); config.colors],
            edge_count: 0,
            next_vertex: Some(VertexId::from_raw(0)),
            version: 0,
        }
    }

    /// Builds a graph from a vertex list and `(source, target, color)` triples.
    pub fn from_edges(
        vertices: impl IntoIterator<Item = VertexId>,
        edges: impl IntoIterator<Item = (VertexId, VertexId, Color)>,
        colors: usize,
    ) -> Result<Self, KgsError> {
        let mut graph = Self::new(colors);
        for vertex in vertices {
            graph.add_vertex(Some(vertex))?;
        }
        for (source, target, color) in edges {
            graph.add_edge(source, target, color)?;
        }
        Ok(graph)
    }

    /// Builds a graph directly from precomputed adjacency tables.
    ///
    /// The tables must be keyed by exactly the colors `0..colors`, hold one
    /// entry per listed vertex, and agree with each other on every edge.
    pub fn from_adjacency(
        vertices: Vec<VertexId>,
        tables: BTreeMap<Color, AdjacencyTable>,
        colors: usize,
    ) -> Result<Self, KgsError> {
        let keys: Vec<Color> = tables.keys().copied().collect();
        if keys != (0..colors).collect::<Vec<_>>() {
            return Err(KgsError::invalid_argument(
                "adjacency-colors-mismatch",
                "adjacency tables must be keyed by exactly the colors 0..k",
            )
            .with_context("colors", colors)
            .with_context("keys", format!("{keys:?}")));
        }
        let vertex_set: BTreeSet<VertexId> = vertices.iter().copied().collect();
        if vertex_set.len() != vertices.len() {
            return Err(KgsError::invalid_argument(
                "duplicate-vertex",
                "vertex list contains repeated identifiers",
            ));
        }
        let mut edge_count = 0usize;
        for (color, table) in &tables {
            let table_keys: BTreeSet<VertexId> = table.keys().copied().collect();
            if table_keys != vertex_set {
                return Err(KgsError::invalid_argument(
                    "adjacency-vertices-mismatch",
                    "adjacency table does not cover exactly the vertex list",
                )
                .with_context("color", color));
            }
            edge_count += table.values().map(|adj| adj.outgoing.len()).sum::<usize>();
        }
        let next_vertex = match vertices.iter().max() {
            Some(max) => max.next(),
            None => Some(VertexId::from_raw(0)),
        };
        let graph = Self {
            config: GraphConfig::with_colors(colors),
            vertices,
            tables: tables.into_values().collect(),
            edge_count,
            next_vertex,
            version: 0,
        };
        graph.audit().map_err(|err| {
            let mut wrapped = KgsError::invalid_argument(
                "inconsistent-adjacency",
                "adjacency tables disagree on at least one edge",
            )
            .with_context("cause", err.code());
            for (key, value) in &err.info().context {
                wrapped = wrapped.with_context(key.clone(), value);
            }
            wrapped
        })?;
        Ok(graph)
    }

    /// Returns the configuration used by this graph.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Number of edge color classes `k`.
    pub fn colors(&self) -> usize {
        self.config.colors
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edge instances across all colors.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Vertex identifiers in insertion order.
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// Structural version counter; advances on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns whether `vertex` belongs to the graph.
    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        match self.tables.first() {
            Some(table) => table.contains_key(&vertex),
            None => self.vertices.contains(&vertex),
        }
    }

    /// Adds a vertex, either with the supplied identifier or one past the
    /// largest identifier this graph has ever used.
    pub fn add_vertex(&mut self, id: Option<VertexId>) -> Result<VertexId, KgsError> {
        let Some(vertex) = id.or(self.next_vertex) else {
            return Err(KgsError::invalid_argument(
                "vertex-id-exhausted",
                "no fresh vertex identifier is left",
            )
            .with_context("vertices", self.vertices.len()));
        };
        if self.contains_vertex(vertex) {
            return Err(
                KgsError::invalid_argument("duplicate-vertex", "vertex already exists")
                    .with_context("vertex", vertex),
            );
        }
        for table in &mut self.tables {
            table.insert(vertex, Neighborhood::default());
        }
        self.vertices.push(vertex);
        if self.next_vertex.is_some_and(|next| vertex >= next) {
            self.next_vertex = vertex.next();
        }
        self.bump();
        Ok(vertex)
    }

    /// Adds one edge instance `source -> target` in `color`.
    pub fn add_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        color: Color,
    ) -> Result<(), KgsError> {
        self.ensure_color(color)?;
        self.ensure_vertex(source)?;
        self.ensure_vertex(target)?;
        self.attach(source, target, color);
        Ok(())
    }

    /// Adds one edge instance `source -> target` in each listed color.
    pub fn add_edge_colors(
        &mut self,
        source: VertexId,
        target: VertexId,
        colors: &[Color],
    ) -> Result<(), KgsError> {
        for &color in colors {
            self.ensure_color(color)?;
        }
        self.ensure_vertex(source)?;
        self.ensure_vertex(target)?;
        for &color in colors {
            self.attach(source, target, color);
        }
        Ok(())
    }

    /// Removes exactly one edge instance `source -> target` in `color`.
    pub fn del_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        color: Color,
    ) -> Result<(), KgsError> {
        self.ensure_color(color)?;
        self.ensure_vertex(source)?;
        self.ensure_vertex(target)?;
        if self.edge_multiplicity(source, target, color)? == 0 {
            return Err(edge_not_found(source, target, color));
        }
        self.detach(source, target, color)
    }

    /// Removes one edge instance `source -> target` in each listed color.
    ///
    /// Nothing is removed unless every requested instance exists.
    pub fn del_edge_colors(
        &mut self,
        source: VertexId,
        target: VertexId,
        colors: &[Color],
    ) -> Result<(), KgsError> {
        let mut requested: BTreeMap<Color, usize> = BTreeMap::new();
        for &color in colors {
            self.ensure_color(color)?;
            *requested.entry(color).or_default() += 1;
        }
        for (&color, &count) in &requested {
            if self.edge_multiplicity(source, target, color)? < count {
                return Err(edge_not_found(source, target, color));
            }
        }
        for &color in colors {
            self.detach(source, target, color)?;
        }
        Ok(())
    }

    /// Removes a vertex together with every edge incident to it, self-loops
    /// included.
    pub fn del_vertex(&mut self, vertex: VertexId) -> Result<(), KgsError> {
        self.ensure_vertex(vertex)?;
        let mut removed = 0usize;
        for (color, table) in self.tables.iter_mut().enumerate() {
            let adjacency = table.remove(&vertex).unwrap_or_default();
            for target in adjacency.outgoing.iter().filter(|w| **w != vertex) {
                let entry = table
                    .get_mut(target)
                    .ok_or_else(|| dangling(vertex, *target, color))?;
                if !remove_one(&mut entry.incoming, vertex) {
                    return Err(dangling(vertex, *target, color));
                }
            }
            for source in adjacency.incoming.iter().filter(|u| **u != vertex) {
                let entry = table
                    .get_mut(source)
                    .ok_or_else(|| dangling(*source, vertex, color))?;
                if !remove_one(&mut entry.outgoing, vertex) {
                    return Err(dangling(*source, vertex, color));
                }
            }
            removed += adjacency.outgoing.len();
            removed += adjacency.incoming.iter().filter(|u| **u != vertex).count();
        }
        self.vertices.retain(|v| *v != vertex);
        self.edge_count -= removed;
        self.bump();
        Ok(())
    }

    /// Renames vertices in place, keeping every edge and the insertion order.
    ///
    /// Each key must be a vertex of the graph and the new labels must not
    /// collide with each other or with any vertex that keeps its label. The
    /// fresh-identifier counter never moves backwards.
    pub fn rename_vertices(
        &mut self,
        renaming: &BTreeMap<VertexId, VertexId>,
    ) -> Result<(), KgsError> {
        for from in renaming.keys() {
            self.ensure_vertex(*from)?;
        }
        let labels: BTreeSet<VertexId> = renaming.values().copied().collect();
        let clash = renaming
            .values()
            .find(|to| self.contains_vertex(**to) && !renaming.contains_key(*to));
        if labels.len() != renaming.len() || clash.is_some() {
            let mut err = KgsError::invalid_argument(
                "rename-collision",
                "new labels must be distinct and unused",
            );
            if let Some(to) = clash {
                err = err.with_context("vertex", to);
            }
            return Err(err);
        }
        let rename = |vertex: &VertexId| renaming.get(vertex).copied().unwrap_or(*vertex);
        for table in &mut self.tables {
            *table = std::mem::take(table)
                .into_iter()
                .map(|(vertex, adjacency)| {
                    let adjacency = Neighborhood {
                        outgoing: adjacency.outgoing.iter().map(rename).collect(),
                        incoming: adjacency.incoming.iter().map(rename).collect(),
                    };
                    (rename(&vertex), adjacency)
                })
                .collect();
        }
        for vertex in &mut self.vertices {
            *vertex = rename(&*vertex);
        }
        if let (Some(next), Some(top)) = (self.next_vertex, labels.last()) {
            if *top >= next {
                self.next_vertex = top.next();
            }
        }
        self.bump();
        Ok(())
    }

    /// Outgoing and incoming neighbor multisets of `vertex` over `colors`.
    pub fn neighbors(
        &self,
        vertex: VertexId,
        colors: ColorFilter<'_>,
    ) -> Result<Neighborhood, KgsError> {
        self.ensure_vertex(vertex)?;
        let mut result = Neighborhood::default();
        for color in self.resolve(colors)? {
            if let Some(adjacency) = self.tables[color].get(&vertex) {
                result.outgoing.extend_from_slice(&adjacency.outgoing);
                result.incoming.extend_from_slice(&adjacency.incoming);
            }
        }
        Ok(result)
    }

    /// Targets of edges leaving `vertex`, one entry per edge instance.
    pub fn out_neighbors(
        &self,
        vertex: VertexId,
        colors: ColorFilter<'_>,
    ) -> Result<Vec<VertexId>, KgsError> {
        Ok(self.neighbors(vertex, colors)?.outgoing)
    }

    /// Sources of edges entering `vertex`, one entry per edge instance.
    pub fn in_neighbors(
        &self,
        vertex: VertexId,
        colors: ColorFilter<'_>,
    ) -> Result<Vec<VertexId>, KgsError> {
        Ok(self.neighbors(vertex, colors)?.incoming)
    }

    /// Number of edge instances incident to `vertex` in `colors`.
    pub fn degree(&self, vertex: VertexId, colors: ColorFilter<'_>) -> Result<usize, KgsError> {
        Ok(self.neighbors(vertex, colors)?.degree())
    }

    /// Number of edge instances leaving `vertex` in `colors`.
    pub fn out_degree(
        &self,
        vertex: VertexId,
        colors: ColorFilter<'_>,
    ) -> Result<usize, KgsError> {
        Ok(self.neighbors(vertex, colors)?.outgoing.len())
    }

    /// Number of edge instances entering `vertex` in `colors`.
    pub fn in_degree(&self, vertex: VertexId, colors: ColorFilter<'_>) -> Result<usize, KgsError> {
        Ok(self.neighbors(vertex, colors)?.incoming.len())
    }

    /// Number of parallel `source -> target` edges in `color`.
    pub fn edge_multiplicity(
        &self,
        source: VertexId,
        target: VertexId,
        color: Color,
    ) -> Result<usize, KgsError> {
        self.ensure_color(color)?;
        self.ensure_vertex(source)?;
        self.ensure_vertex(target)?;
        Ok(self.tables[color]
            .get(&source)
            .map(|adj| adj.outgoing.iter().filter(|w| **w == target).count())
            .unwrap_or(0))
    }

    /// Every edge instance as `(source, target, color)`, grouped by source in
    /// vertex order, then by color, then in insertion order.
    pub fn edges(&self) -> Vec<(VertexId, VertexId, Color)> {
        let mut edges = Vec::with_capacity(self.edge_count);
        for vertex in &self.vertices {
            for (color, table) in self.tables.iter().enumerate() {
                if let Some(adjacency) = table.get(vertex) {
                    edges.extend(adjacency.outgoing.iter().map(|w| (*vertex, *w, color)));
                }
            }
        }
        edges
    }

    /// Returns a graph keeping only the listed color classes.
    ///
    /// Color `colors[i]` of this graph becomes color `i` of the result.
    pub fn restrict_colors(&self, colors: &[Color]) -> Result<ColoredMultigraph, KgsError> {
        let distinct: BTreeSet<Color> = colors.iter().copied().collect();
        if distinct.len() != colors.len() || colors.iter().any(|c| *c >= self.colors()) {
            return Err(KgsError::invalid_argument(
                "invalid-color-subset",
                "the restriction set must be a subset of the colors 0..k",
            )
            .with_context("k", self.colors())
            .with_context("requested", format!("{colors:?}")));
        }
        let tables = colors
            .iter()
            .enumerate()
            .map(|(new_color, old_color)| (new_color, self.tables[*old_color].clone()))
            .collect();
        let mut restricted = Self::from_adjacency(self.vertices.clone(), tables, colors.len())?;
        restricted.config.schema_version = self.config.schema_version;
        restricted.next_vertex = match (restricted.next_vertex, self.next_vertex) {
            (Some(own), Some(source)) => Some(own.max(source)),
            _ => None,
        };
        Ok(restricted)
    }

    /// Weakly connected components over all colors.
    pub fn weak_components(&self) -> Components<VertexId> {
        let pairs = self.edges().into_iter().map(|(v, w, _)| (v, w));
        ComponentFinder::new(self.vertices.iter().copied(), pairs).components()
    }

    /// Re-verifies the storage invariants: every edge has matching forward
    /// and backward entries, and the edge counter equals the forward entries.
    pub fn audit(&self) -> Result<(), KgsError> {
        if self.tables.len() != self.colors() {
            return Err(KgsError::invariant(
                "color-table-count",
                "number of adjacency tables differs from k",
            ));
        }
        let mut forward = 0usize;
        let mut backward = 0usize;
        for (color, table) in self.tables.iter().enumerate() {
            if table.len() != self.vertices.len() {
                return Err(KgsError::invariant(
                    "vertex-table-mismatch",
                    "adjacency table does not cover the vertex list",
                )
                .with_context("color", color));
            }
            let mut balance: BTreeMap<(VertexId, VertexId), i64> = BTreeMap::new();
            for (vertex, adjacency) in table {
                forward += adjacency.outgoing.len();
                backward += adjacency.incoming.len();
                for target in &adjacency.outgoing {
                    *balance.entry((*vertex, *target)).or_default() += 1;
                }
                for source in &adjacency.incoming {
                    *balance.entry((*source, *vertex)).or_default() -= 1;
                }
            }
            if let Some(((source, target), _)) = balance.iter().find(|(_, count)| **count != 0) {
                return Err(KgsError::invariant(
                    "unbalanced-edge",
                    "forward and backward adjacency entries disagree",
                )
                .with_context("source", source)
                .with_context("target", target)
                .with_context("color", color));
            }
        }
        if forward != backward || forward != self.edge_count {
            return Err(KgsError::invariant(
                "edge-count-mismatch",
                "edge counter differs from the adjacency entries",
            )
            .with_context("counter", self.edge_count)
            .with_context("forward", forward)
            .with_context("backward", backward));
        }
        Ok(())
    }

    fn attach(&mut self, source: VertexId, target: VertexId, color: Color) {
        let table = &mut self.tables[color];
        if let Some(entry) = table.get_mut(&source) {
            entry.outgoing.push(target);
        }
        if let Some(entry) = table.get_mut(&target) {
            entry.incoming.push(source);
        }
        self.edge_count += 1;
        self.bump();
    }

    fn detach(&mut self, source: VertexId, target: VertexId, color: Color) -> Result<(), KgsError> {
        let table = &mut self.tables[color];
        let removed_forward = table
            .get_mut(&source)
            .map(|entry| remove_one(&mut entry.outgoing, target))
            .unwrap_or(false);
        if !removed_forward {
            return Err(edge_not_found(source, target, color));
        }
        let removed_backward = table
            .get_mut(&target)
            .map(|entry| remove_one(&mut entry.incoming, source))
            .unwrap_or(false);
        if !removed_backward {
            return Err(dangling(source, target, color));
        }
        self.edge_count -= 1;
        self.bump();
        Ok(())
    }

    fn resolve(&self, colors: ColorFilter<'_>) -> Result<Vec<Color>, KgsError> {
        match colors {
            ColorFilter::All => Ok((0..self.colors()).collect()),
            ColorFilter::Only(color) => {
                self.ensure_color(color)?;
                Ok(vec![color])
            }
            ColorFilter::Subset(list) => {
                for &color in list {
                    self.ensure_color(color)?;
                }
                Ok(list.to_vec())
            }
        }
    }

    fn ensure_color(&self, color: Color) -> Result<(), KgsError> {
        if color >= self.colors() {
            return Err(
                KgsError::invalid_argument("color-out-of-range", "color must lie in 0..k")
                    .with_context("color", color)
                    .with_context("k", self.colors()),
            );
        }
        Ok(())
    }

    fn ensure_vertex(&self, vertex: VertexId) -> Result<(), KgsError> {
        if !self.contains_vertex(vertex) {
            return Err(
                KgsError::not_found("unknown-vertex", "vertex does not exist")
                    .with_context("vertex", vertex),
            );
        }
        Ok(())
    }

    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

impl PartialEq for ColoredMultigraph {
    /// Graphs are equal when they share `k`, the vertex set and, per color,
    /// the outgoing neighbor multiset of every vertex.
    fn eq(&self, other: &Self) -> bool {
        if self.colors() != other.colors() || self.vertex_count() != other.vertex_count() {
            return false;
        }
        let mut mine = self.edges();
        let mut theirs = other.edges();
        mine.sort();
        theirs.sort();
        let mut my_vertices = self.vertices.clone();
        let mut their_vertices = other.vertices.clone();
        my_vertices.sort();
        their_vertices.sort();
        mine == theirs && my_vertices == their_vertices
    }
}

impl Eq for ColoredMultigraph {}

fn remove_one(list: &mut Vec<VertexId>, target: VertexId) -> bool {
    match list.iter().position(|entry| *entry == target) {
        Some(position) => {
            list.remove(position);
            true
        }
        None => false,
    }
}

fn edge_not_found(source: VertexId, target: VertexId, color: Color) -> KgsError {
    KgsError::not_found("edge-not-found", "edge does not exist")
        .with_context("source", source)
        .with_context("target", target)
        .with_context("color", color)
}

fn dangling(source: VertexId, target: VertexId, color: Color) -> KgsError {
    KgsError::invariant(
        "dangling-adjacency",
        "edge is recorded on one side of the adjacency only",
    )
    .with_context("source", source)
    .with_context("target", target)
    .with_context("color", color)
}
