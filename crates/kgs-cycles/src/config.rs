use serde::{Deserialize, Serialize};

/// Options for cycle enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Upper bound on the number of simple cycles; `None` enumerates all of them.
    #[serde(default)]
    pub max_cycles: Option<usize>,
}

impl CycleConfig {
    /// Returns a configuration that fails once more than `max` cycles are found.
    pub fn bounded(max: usize) -> Self {
        Self {
            max_cycles: Some(max),
        }
    }
}
