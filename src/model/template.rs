//! The template document: a declarative, serializable description of when a
//! piece of world history may fire, what it selects, what it creates, and
//! what side effects it applies. Templates are pure data — JSON documents
//! with no embedded behavior — and every rule kind is a closed sum type so
//! no kind can silently fall through dispatch.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::entity::{EntityKind, EntityStatus, Prominence};
use super::refs::EntityRef;
use super::relationship::{Direction, RelationshipKind};

fn default_true() -> bool {
    true
}

fn default_min_count() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applicability: Vec<ApplicabilityRule>,
    pub selection: SelectionRule,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub creations: Vec<CreationRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelationshipRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state_updates: Vec<StateUpdateRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<VariantBlock>,
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// How many candidates a variable or selection keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickPolicy {
    Random,
    First,
    #[default]
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    #[serde(flatten)]
    pub query: VariableQuery,
    #[serde(default)]
    pub pick: PickPolicy,
    /// Reference substituted when the query yields no candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<EntityRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum VariableQuery {
    /// Query the whole graph by kind, with optional subtype/status narrowing
    /// and a filter chain. When `preferred` filters are given, candidates
    /// passing them win; if none do, the unpreferred set is kept.
    Global {
        kind: EntityKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtype: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<EntityStatus>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        filters: Vec<SelectionFilter>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        preferred: Vec<SelectionFilter>,
    },
    /// Follow a relationship from an already-resolved reference.
    Related {
        from: EntityRef,
        relationship: RelationshipKind,
        #[serde(default)]
        direction: Direction,
    },
}

// ---------------------------------------------------------------------------
// Applicability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApplicabilityRule {
    /// Fail below `min`. Above `max` succeed only with `extreme_chance`
    /// (default 0.3). In between, succeed.
    PressureThreshold {
        pressure: String,
        min: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extreme_chance: Option<f64>,
    },
    /// Succeed if any named pressure exceeds the threshold.
    PressureAnyAbove { pressures: Vec<String>, threshold: f64 },
    /// Succeed iff pressure `greater` > pressure `lesser`.
    PressureCompare { greater: String, lesser: String },
    EntityCountMin {
        kind: EntityKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtype: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<EntityStatus>,
        min: u32,
    },
    /// Succeed while the population is below the configured distribution
    /// target (falling back to `max`) times the overshoot factor.
    EntityCountMax {
        kind: EntityKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtype: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<EntityStatus>,
        max: u32,
    },
    EraMatch { eras: Vec<String> },
    RandomChance { chance: f64 },
    /// Ticks since this template last created something >= `ticks`.
    CooldownElapsed { ticks: u64 },
    /// This template's epoch creation counter is still below `max`.
    CreationsPerEpoch { max: u32 },
    /// At least `min_count` entities passing the kind/subtype filter carry
    /// the tag (optionally with an exact value).
    TagExists {
        tag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<EntityKind>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtype: Option<String>,
        #[serde(default = "default_min_count")]
        min_count: u32,
    },
    /// No entity passing the kind/subtype filter carries the tag.
    TagAbsent {
        tag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<EntityKind>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtype: Option<String>,
    },
    #[serde(rename = "and")]
    And { rules: Vec<ApplicabilityRule> },
    #[serde(rename = "or")]
    Or { rules: Vec<ApplicabilityRule> },
    /// True iff any entity matching the starting filter satisfies the path
    /// assertion.
    GraphPath {
        start_kind: EntityKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_subtype: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_status: Option<EntityStatus>,
        path: GraphPathAssertion,
    },
}

// ---------------------------------------------------------------------------
// Graph path assertions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphPathAssertion {
    pub steps: Vec<PathStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<PathConstraint>,
    #[serde(default)]
    pub check: PathCheck,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathStep {
    pub relationship: RelationshipKind,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_kind: Option<EntityKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_status: Option<EntityStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_strength: Option<f64>,
    /// Snapshot the id set this step lands on, for later constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_as: Option<String>,
}

impl PathStep {
    pub fn new(relationship: RelationshipKind, direction: Direction) -> Self {
        Self {
            relationship,
            direction,
            target_kind: None,
            target_subtype: None,
            target_status: None,
            min_strength: None,
            save_as: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathConstraint {
    /// Keep entities absent from a named snapshot.
    NotIn { set: String },
    /// Keep entities present in a named snapshot.
    In { set: String },
    /// Exclude the entity the walk started from.
    NotSelf,
    HasRelationship {
        relationship: RelationshipKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        other: Option<EntityRef>,
        #[serde(default)]
        direction: Direction,
    },
    LacksRelationship {
        relationship: RelationshipKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        other: Option<EntityRef>,
        #[serde(default)]
        direction: Direction,
    },
    KindEquals { kind: EntityKind },
    SubtypeEquals { subtype: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathCheck {
    #[default]
    Exists,
    NotExists,
    CountMin { count: u32 },
    CountMax { count: u32 },
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionRule {
    #[serde(flatten)]
    pub strategy: SelectionStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<SelectionFilter>,
    /// Truncation applied after filtering, before the pick policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default)]
    pub pick: PickPolicy,
}

impl SelectionRule {
    pub fn by_kind(kind: EntityKind) -> Self {
        Self {
            strategy: SelectionStrategy::ByKind {
                kind,
                subtypes: Vec::new(),
            },
            status: None,
            filters: Vec::new(),
            limit: None,
            pick: PickPolicy::All,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SelectionStrategy {
    ByKind {
        kind: EntityKind,
        /// Allow-list; empty means any subtype.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        subtypes: Vec<String>,
    },
    /// Try subtypes in priority order; first nonempty match wins, else every
    /// entity of the kind.
    ByPreferenceOrder {
        kind: EntityKind,
        preference: Vec<String>,
    },
    /// Entities of the kind that do (or, with `present: false`, do not) have
    /// a relationship of the given kind in the given role.
    ByRelationship {
        kind: EntityKind,
        relationship: RelationshipKind,
        #[serde(default)]
        direction: Direction,
        #[serde(default = "default_true")]
        present: bool,
    },
    /// Entities of the kind within a Euclidean radius of a reference
    /// entity's coordinates. Entities without coordinates are excluded.
    ByProximity {
        kind: EntityKind,
        reference: EntityRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        radius: Option<f64>,
    },
    /// Entities of the kind at or above a minimum prominence rank.
    ByProminence {
        kind: EntityKind,
        min_prominence: Prominence,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectionFilter {
    Exclude { refs: Vec<EntityRef> },
    HasRelationship {
        relationship: RelationshipKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        other: Option<EntityRef>,
        #[serde(default)]
        direction: Direction,
    },
    LacksRelationship {
        relationship: RelationshipKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        other: Option<EntityRef>,
        #[serde(default)]
        direction: Direction,
    },
    HasTag {
        tag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
    },
    HasAnyTag { tags: Vec<String> },
    /// Keep entities sharing at least one common target of the relationship
    /// kind with the reference entity.
    SharesRelated {
        relationship: RelationshipKind,
        reference: EntityRef,
    },
    GraphPath { path: GraphPathAssertion },
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Count {
    Fixed(u32),
    /// Inclusive range, sampled uniformly.
    Range { min: u32, max: u32 },
}

impl Default for Count {
    fn default() -> Self {
        Count::Fixed(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreationRule {
    pub kind: EntityKind,
    /// Label other rules use to reference the entities this rule creates
    /// (`"new:<label>"`); also the key variant effects address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub count: Count,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<SubtypeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture: Option<CultureSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<DescriptionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<PlacementSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubtypeSpec {
    Literal { value: String },
    /// Copy the subtype of a referenced entity, with an optional probability
    /// gate and a fallback when the gate misses or the reference is unset.
    Inherit {
        from: EntityRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chance: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<SubtypeFallback>,
    },
    /// Pick the subtype mapped to whichever listed pressure is highest.
    FromPressure { map: Vec<PressureSubtype> },
    Random { options: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PressureSubtype {
    pub pressure: String,
    pub subtype: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubtypeFallback {
    Literal { value: String },
    /// Uniform pick from the domain list.
    RandomFromDomain { options: Vec<String> },
}

/// Culture source for a created entity. Exactly one of `inherit`/`fixed`
/// must be set; a spec with neither is an authoring error surfaced when the
/// creation rule runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CultureSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DescriptionSpec {
    Literal { text: String },
    /// `$ref.property` placeholders are substituted from resolved entities.
    Template { text: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacementSpec {
    #[serde(flatten)]
    pub anchor: PlacementAnchor,
    /// Minimum distance from avoided entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<f64>,
    /// Maximum distance from the anchor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub avoid: Vec<EntityRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "anchor", rename_all = "snake_case")]
pub enum PlacementAnchor {
    Entity { entity: EntityRef },
    /// Place within the region associated with a culture (defaults to the
    /// created entity's culture).
    CultureRegion {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        culture: Option<String>,
    },
    Centroid { refs: Vec<EntityRef> },
    Bounds {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },
    /// Let the delegate find an underpopulated area.
    SparseArea,
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationshipRule {
    pub kind: RelationshipKind,
    pub source: EntityRef,
    pub dest: EntityRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<RelationCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bidirectional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalyst: Option<EntityRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelationCondition {
    Chance { chance: f64 },
    /// The reference resolves to at least one entity.
    Exists { entity: EntityRef },
    /// The referenced entity has a relationship of the given kind.
    HasRelationship {
        entity: EntityRef,
        relationship: RelationshipKind,
        #[serde(default)]
        direction: Direction,
    },
}

// ---------------------------------------------------------------------------
// State updates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateUpdateRule {
    /// Record a creation for this template at the current tick (cooldown and
    /// per-epoch bookkeeping).
    RateLimitBump,
    ArchiveRelationship {
        source: EntityRef,
        dest: EntityRef,
        kind: RelationshipKind,
    },
    PressureDelta { pressure: String, delta: f64 },
    SetStatus {
        entity: EntityRef,
        status: EntityStatus,
    },
    SetTag {
        entity: EntityRef,
        tag: String,
        value: serde_json::Value,
    },
    RemoveTag { entity: EntityRef, tag: String },
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantBlock {
    #[serde(default)]
    pub mode: VariantMode,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariantMode {
    #[default]
    FirstMatch,
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub condition: VariantCondition,
    #[serde(default)]
    pub effects: VariantEffects,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariantCondition {
    PressureRange {
        pressure: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    PressureCompare { greater: String, lesser: String },
    EntityCountRange {
        kind: EntityKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtype: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<u32>,
    },
    TagPresent {
        entity: EntityRef,
        tag: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
    },
    Chance { chance: f64 },
    Always,
    #[serde(rename = "and")]
    And { conditions: Vec<VariantCondition> },
    #[serde(rename = "or")]
    Or { conditions: Vec<VariantCondition> },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VariantEffects {
    /// Creation label -> replacement subtype for every entity created under
    /// that label.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subtype_overrides: BTreeMap<String, String>,
    /// Creation label -> tags merged onto every entity created under it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelationshipRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state_updates: Vec<StateUpdateRule>,
}
