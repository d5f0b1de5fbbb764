pub mod error;
pub mod flush;
pub mod graph;
pub mod id;
pub mod interp;
pub mod library;
pub mod model;
pub mod testutil;

pub use error::TemplateError;
pub use graph::{GraphConfig, GraphView, MemoryGraph, commit_expansion};
pub use id::IdGenerator;
pub use interp::{ExpansionResult, PartialEntity, RelationshipDraft, TemplateAdapter, expand};
pub use library::TemplateLibrary;
pub use model::{
    Direction, Entity, EntityKind, EntityRef, EntityStatus, PendingId, Prominence, Relationship,
    RelationshipKind, Template,
};
