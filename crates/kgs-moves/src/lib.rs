#![deny(missing_docs)]
#![doc = "Move-equivalence rewrites on rank-1 k-graph skeletons: the six moves, their inverses and a recorded rewrite session."]

mod components;
mod cuntz_splice;
mod eclose;
mod framework;
mod gadget;
mod in_split;
mod out_split;
mod reduction;
mod return_paths;
mod session;
mod sink_delete;
mod split;
mod step;

pub use components::{EdgeBundle, SpliceMotif, VertexPair, VertexPartition};
pub use cuntz_splice::{CuntzSplice, CuntzSpliceInverse};
pub use eclose::{Eclose, EcloseInverse};
pub use framework::{Move, MoveKind};
pub use in_split::{InSplit, InSplitInverse};
pub use out_split::{OutSplit, OutSplitInverse};
pub use reduction::{Reduction, ReductionInverse};
pub use session::{AppliedStep, RewriteSession};
pub use sink_delete::{SinkDelete, SinkDeleteInverse};
pub use step::{apply_step, viable_steps, Step};
