pub mod applicability;
pub mod context;
pub mod creation;
pub mod expand;
pub mod path;
pub mod relationships;
pub mod result;
pub mod selection;
pub mod state_update;
pub mod variant;

pub use applicability::{describe_failure, evaluate_all};
pub use context::ExecutionContext;
pub use expand::{TemplateAdapter, expand};
pub use path::evaluate_path;
pub use result::{CreationDebug, Endpoint, ExpansionResult, PartialEntity, RelationshipDraft};
pub use selection::{find_candidates, select};
