#![deny(missing_docs)]
#![doc = "Simple-cycle enumeration on rank-1 skeletons and the cycle-intersection graph used to count return paths."]

mod config;
mod finder;
mod intersection;

pub use config::CycleConfig;
pub use finder::CycleFinder;
pub use intersection::CycleIntersection;
