use kgs_core::SchemaVersion;

/// Configuration options for a [`ColoredMultigraph`](crate::ColoredMultigraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphConfig {
    /// Number of edge color classes `k`; fixed for the lifetime of the graph.
    pub colors: usize,
    /// Schema version stored alongside serialized payloads.
    pub schema_version: SchemaVersion,
}

impl GraphConfig {
    /// Returns the default configuration with `colors` color classes.
    pub fn with_colors(colors: usize) -> Self {
        Self {
            colors,
            ..Self::default()
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            colors: 1,
            schema_version: SchemaVersion::new(1, 0, 0),
        }
    }
}
