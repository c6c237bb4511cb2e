#![deny(missing_docs)]
#![doc = "Edge-colored directed multigraphs (k-graph skeletons), connected components, serialization and structural hashing."]

mod components;
mod config;
mod generators;
mod hash;
mod multigraph;
mod serialization;

pub use components::{ComponentFinder, Components};
pub use config::GraphConfig;
pub use generators::{gen_directed_cycle, gen_random_kgraph};
pub use hash::{canonical_hash, invariant_hash};
pub use multigraph::{AdjacencyTable, ColorFilter, ColoredMultigraph, Neighborhood};
pub use serialization::{
    graph_from_bytes, graph_from_json, graph_from_text, graph_to_bytes, graph_to_json,
    graph_to_text, read_text_file, write_text_file,
};
