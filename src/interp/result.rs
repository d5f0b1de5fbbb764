use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::entity::{EntityKind, EntityStatus, Prominence};
use crate::model::refs::PendingId;
use crate::model::relationship::RelationshipKind;

/// One endpoint of a relationship produced by an expansion: either an entity
/// already in the graph or a placeholder for one created in this expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Endpoint {
    Pending(PendingId),
    Existing(u64),
}

/// An entity computed by the creation engine but not yet committed. Addressed
/// by its placeholder until the committing layer allocates a permanent id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialEntity {
    pub placeholder: PendingId,
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub status: EntityStatus,
    #[serde(default)]
    pub prominence: Prominence,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub region_ids: Vec<u64>,
}

/// A relationship computed by the relationship engine. Endpoints may still be
/// placeholders; the committing layer re-resolves them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDraft {
    pub source: Endpoint,
    pub dest: Endpoint,
    pub kind: RelationshipKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalyst: Option<Endpoint>,
}

/// Per-created-entity diagnostic metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationDebug {
    pub placeholder: PendingId,
    /// Index of the creation rule that produced the entity.
    pub rule_index: usize,
    /// How the subtype was chosen.
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<String>,
}

/// Everything one `expand` call produced. Entities and relationships are not
/// yet persisted; committing them (and re-resolving placeholders) is the
/// caller's responsibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpansionResult {
    pub entities: Vec<PartialEntity>,
    pub relationships: Vec<RelationshipDraft>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub debug: Vec<CreationDebug>,
}
