use std::fs;
use std::path::Path;

use kgs_core::{KgsError, SchemaVersion, VertexId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GraphConfig;
use crate::multigraph::{ColorFilter, ColoredMultigraph};

impl ColoredMultigraph {
    /// Canonical text form; see [`graph_to_text`].
    pub fn to_text(&self) -> String {
        graph_to_text(self)
    }
}

/// Renders the graph in the line-oriented skeleton format.
///
/// ```text
/// <V> <E> <k>
/// <vertex labels>
/// <one line per vertex: k comma-separated fields of out-neighbors>
/// ```
pub fn graph_to_text(graph: &ColoredMultigraph) -> String {
    let mut lines = Vec::with_capacity(graph.vertex_count() + 2);
    lines.push(format!(
        "{} {} {}",
        graph.vertex_count(),
        graph.edge_count(),
        graph.colors()
    ));
    lines.push(join(graph.vertices()));
    for vertex in graph.vertices() {
        let fields: Vec<String> = (0..graph.colors())
            .map(|color| {
                graph
                    .out_neighbors(*vertex, ColorFilter::Only(color))
                    .map(|targets| join(&targets))
                    .unwrap_or_default()
            })
            .collect();
        lines.push(fields.join(","));
    }
    lines.join("\n")
}

/// Parses the skeleton text format.
///
/// The counts in the header must agree with the reconstructed graph and the
/// re-rendered text must match the input on their common prefix.
pub fn graph_from_text(text: &str) -> Result<ColoredMultigraph, KgsError> {
    let lines: Vec<&str> = text.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    let header = lines
        .first()
        .ok_or_else(|| KgsError::serde("missing-header", "graph text is empty"))?;
    let counts: Vec<&str> = header.split_whitespace().collect();
    if counts.len() != 3 {
        return Err(
            KgsError::serde("malformed-header", "header must read `<V> <E> <k>`")
                .with_context("header", header),
        );
    }
    let parse_count = |field: &str| {
        field.parse::<usize>().map_err(|_| {
            KgsError::serde("malformed-header", "header counts must be non-negative integers")
                .with_context("field", field)
        })
    };
    let vertex_total = parse_count(counts[0])?;
    let edge_total = parse_count(counts[1])?;
    let colors = parse_count(counts[2])?;

    let vertices: Vec<VertexId> = lines
        .get(1)
        .copied()
        .unwrap_or_default()
        .split(' ')
        .filter(|label| !label.is_empty())
        .map(parse_label)
        .collect::<Result<_, _>>()?;
    if vertices.len() != vertex_total {
        return Err(KgsError::serde(
            "vertex-count-mismatch",
            "vertex list length differs from the header",
        )
        .with_context("header", vertex_total)
        .with_context("listed", vertices.len()));
    }

    let mut graph = ColoredMultigraph::new(colors);
    for vertex in &vertices {
        graph.add_vertex(Some(*vertex))?;
    }
    for (row, vertex) in vertices.iter().enumerate() {
        let line = lines.get(row + 2).copied().unwrap_or_default();
        let fields: Vec<&str> = if colors == 0 && line.is_empty() {
            Vec::new()
        } else {
            line.split(',').collect()
        };
        if fields.len() != colors {
            return Err(KgsError::serde(
                "color-field-mismatch",
                "adjacency line must hold exactly k comma-separated fields",
            )
            .with_context("vertex", vertex)
            .with_context("fields", fields.len())
            .with_context("k", colors));
        }
        for (color, field) in fields.iter().enumerate() {
            for label in field.split(' ').filter(|label| !label.is_empty()) {
                graph.add_edge(*vertex, parse_label(label)?, color)?;
            }
        }
    }
    if graph.edge_count() != edge_total {
        return Err(KgsError::serde(
            "edge-count-mismatch",
            "adjacency lines disagree with the header edge count",
        )
        .with_context("header", edge_total)
        .with_context("parsed", graph.edge_count()));
    }

    let original = lines.join("\n");
    let original = original.trim();
    let rendered = graph_to_text(&graph);
    let rendered = rendered.trim();
    let shared = original.len().min(rendered.len());
    if original.as_bytes()[..shared] != rendered.as_bytes()[..shared] {
        return Err(KgsError::serde(
            "explicit-isomorphism",
            "re-rendered graph does not reproduce the input text",
        ));
    }
    debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        colors = graph.colors(),
        "parsed skeleton text"
    );
    Ok(graph)
}

/// Writes the skeleton text format to `path`.
pub fn write_text_file(graph: &ColoredMultigraph, path: impl AsRef<Path>) -> Result<(), KgsError> {
    let path = path.as_ref();
    fs::write(path, graph_to_text(graph)).map_err(|err| {
        KgsError::serde("io-write", err.to_string()).with_context("path", path.display())
    })
}

/// Reads a graph stored in the skeleton text format.
pub fn read_text_file(path: impl AsRef<Path>) -> Result<ColoredMultigraph, KgsError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|err| {
        KgsError::serde("io-read", err.to_string()).with_context("path", path.display())
    })?;
    graph_from_text(&text)
}

/// Serializes the graph to a compact binary representation using `bincode`.
pub fn graph_to_bytes(graph: &ColoredMultigraph) -> Result<Vec<u8>, KgsError> {
    let serializable = SerializableGraph::from_graph(graph);
    bincode::serialize(&serializable)
        .map_err(|err| KgsError::serde("serialize-bytes", err.to_string()))
}

/// Restores a graph from its binary representation.
pub fn graph_from_bytes(bytes: &[u8]) -> Result<ColoredMultigraph, KgsError> {
    let serializable: SerializableGraph = bincode::deserialize(bytes)
        .map_err(|err| KgsError::serde("deserialize-bytes", err.to_string()))?;
    serializable.into_graph()
}

/// Serializes the graph to a JSON string.
pub fn graph_to_json(graph: &ColoredMultigraph) -> Result<String, KgsError> {
    let serializable = SerializableGraph::from_graph(graph);
    serde_json::to_string_pretty(&serializable)
        .map_err(|err| KgsError::serde("serialize-json", err.to_string()))
}

/// Restores a graph from a JSON string.
pub fn graph_from_json(json: &str) -> Result<ColoredMultigraph, KgsError> {
    let serializable: SerializableGraph = serde_json::from_str(json)
        .map_err(|err| KgsError::serde("deserialize-json", err.to_string()))?;
    serializable.into_graph()
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializableGraph {
    schema_version: SchemaVersion,
    colors: usize,
    vertices: Vec<u64>,
    edges: Vec<SerializableEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializableEdge {
    source: u64,
    target: u64,
    color: usize,
}

impl SerializableGraph {
    fn from_graph(graph: &ColoredMultigraph) -> Self {
        Self {
            schema_version: graph.config().schema_version,
            colors: graph.colors(),
            vertices: graph.vertices().iter().map(VertexId::as_raw).collect(),
            edges: graph
                .edges()
                .into_iter()
                .map(|(source, target, color)| SerializableEdge {
                    source: source.as_raw(),
                    target: target.as_raw(),
                    color,
                })
                .collect(),
        }
    }

    fn into_graph(self) -> Result<ColoredMultigraph, KgsError> {
        let config = GraphConfig::with_colors(self.colors);
        if !config.schema_version.accepts(&self.schema_version) {
            return Err(KgsError::serde(
                "schema-version",
                "payload schema version is not readable by this build",
            )
            .with_context(
                "payload",
                format!(
                    "{}.{}.{}",
                    self.schema_version.major,
                    self.schema_version.minor,
                    self.schema_version.patch
                ),
            ));
        }
        let mut graph = ColoredMultigraph::with_config(config);
        for raw in self.vertices {
            graph.add_vertex(Some(VertexId::from_raw(raw)))?;
        }
        for edge in self.edges {
            graph.add_edge(
                VertexId::from_raw(edge.source),
                VertexId::from_raw(edge.target),
                edge.color,
            )?;
        }
        Ok(graph)
    }
}

fn parse_label(label: &str) -> Result<VertexId, KgsError> {
    label.parse::<u64>().map(VertexId::from_raw).map_err(|_| {
        KgsError::invalid_argument("non-integer-vertex", "vertex labels must be integers")
            .with_context("label", label)
    })
}

fn join(vertices: &[VertexId]) -> String {
    vertices
        .iter()
        .map(VertexId::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
