#![deny(missing_docs)]
#![doc = "Core identifiers, errors and descriptors shared by the k-graph skeleton crates."]

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod rng;
pub mod schema;

pub use errors::{ErrorInfo, KgsError};
pub use rng::RngHandle;
pub use schema::SchemaVersion;

/// Index of an edge color class. Valid colors of a `k`-graph are `0..k`.
pub type Color = usize;

/// Identifier for a vertex of a colored multigraph.
///
/// Identifiers are unique within one graph and are never handed out twice by
/// the same graph, even after the vertex carrying them has been deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(u64);

impl VertexId {
    /// Creates a new identifier from its raw integer representation.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub const fn as_raw(&self) -> u64 {
        self.0
    }

    /// Returns the identifier immediately following this one, or `None`
    /// when this is the largest representable identifier.
    pub const fn next(&self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VertexId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
