pub mod commit;
pub mod memory;
pub mod view;

pub use commit::commit_expansion;
pub use memory::{GraphConfig, MemoryGraph};
pub use view::{GraphView, PlacementOutcome, PlacementRequest};
