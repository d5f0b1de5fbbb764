pub mod entity;
pub mod refs;
pub mod relationship;
pub mod template;

pub use entity::{Entity, EntityKind, EntityStatus, Prominence, WILDCARD};
pub use refs::{EntityRef, PendingId};
pub use relationship::{Direction, Relationship, RelationshipKind};
pub use template::{
    ApplicabilityRule, Count, CreationRule, CultureSpec, DescriptionSpec, GraphPathAssertion,
    PathCheck, PathConstraint, PathStep, PickPolicy, PlacementAnchor, PlacementSpec,
    RelationCondition, RelationshipRule, SelectionFilter, SelectionRule, SelectionStrategy,
    StateUpdateRule, SubtypeFallback, SubtypeSpec, Template, Variant, VariantBlock,
    VariantCondition, VariantEffects, VariantMode, VariableDecl, VariableQuery,
};
