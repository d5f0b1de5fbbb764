use std::collections::BTreeMap;

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wildcard accepted by subtype/status/kind filters in path steps and
/// selection rules. A filter set to the wildcard matches every entity.
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Npc,
    Location,
    Faction,
    Ability,
    Rule,
    Custom(String),
}

impl EntityKind {
    pub fn as_str(&self) -> &str {
        match self {
            EntityKind::Npc => "npc",
            EntityKind::Location => "location",
            EntityKind::Faction => "faction",
            EntityKind::Ability => "ability",
            EntityKind::Rule => "rule",
            EntityKind::Custom(s) => s.as_str(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, EntityKind::Custom(s) if s == WILDCARD)
    }
}

impl Serialize for EntityKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "npc" => Ok(EntityKind::Npc),
            "location" => Ok(EntityKind::Location),
            "faction" => Ok(EntityKind::Faction),
            "ability" => Ok(EntityKind::Ability),
            "rule" => Ok(EntityKind::Rule),
            _ => {
                if s.is_empty() {
                    Err(de::Error::custom("entity kind cannot be empty"))
                } else {
                    Ok(EntityKind::Custom(s))
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum EntityStatus {
    #[default]
    Active,
    Dormant,
    Ruined,
    Departed,
    Custom(String),
}

impl EntityStatus {
    pub fn as_str(&self) -> &str {
        match self {
            EntityStatus::Active => "active",
            EntityStatus::Dormant => "dormant",
            EntityStatus::Ruined => "ruined",
            EntityStatus::Departed => "departed",
            EntityStatus::Custom(s) => s.as_str(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, EntityStatus::Custom(s) if s == WILDCARD)
    }
}

impl Serialize for EntityStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "active" => Ok(EntityStatus::Active),
            "dormant" => Ok(EntityStatus::Dormant),
            "ruined" => Ok(EntityStatus::Ruined),
            "departed" => Ok(EntityStatus::Departed),
            _ => {
                if s.is_empty() {
                    Err(de::Error::custom("entity status cannot be empty"))
                } else {
                    Ok(EntityStatus::Custom(s))
                }
            }
        }
    }
}

/// How well-known an entity is on the world's ordinal renown scale.
///
/// Ordered least-to-most prominent so `min_prominence` comparisons read as
/// `entity.prominence >= rule.min_prominence`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Prominence {
    Forgotten,
    #[default]
    Marginal,
    Recognized,
    Renowned,
    Mythic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: u64,
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtype: String,
    pub name: String,
    #[serde(default)]
    pub status: EntityStatus,
    #[serde(default)]
    pub prominence: Prominence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture: Option<String>,

    /// Open-ended key/value annotations (e.g. {"blessed": true, "region": "mirefen"}).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, serde_json::Value>,

    /// World coordinates, absent for entities without a spatial footprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Entity {
    /// Euclidean distance to another entity; None if either lacks coordinates.
    pub fn distance_to(&self, other: &Entity) -> Option<f64> {
        let (ax, ay) = self.position?;
        let (bx, by) = other.position?;
        Some(((ax - bx).powi(2) + (ay - by).powi(2)).sqrt())
    }

    /// Check a tag, optionally requiring an exact value match.
    pub fn has_tag(&self, key: &str, expected: Option<&serde_json::Value>) -> bool {
        match (self.tags.get(key), expected) {
            (Some(_), None) => true,
            (Some(actual), Some(wanted)) => actual == wanted,
            (None, _) => false,
        }
    }

    /// Wildcard-aware kind/subtype/status filter. A `None` filter or the `"*"`
    /// wildcard matches anything.
    pub fn matches_filter(
        &self,
        kind: Option<&EntityKind>,
        subtype: Option<&str>,
        status: Option<&EntityStatus>,
    ) -> bool {
        if let Some(k) = kind
            && !k.is_wildcard()
            && self.kind != *k
        {
            return false;
        }
        if let Some(s) = subtype
            && s != WILDCARD
            && self.subtype != s
        {
            return false;
        }
        if let Some(st) = status
            && !st.is_wildcard()
            && self.status != *st
        {
            return false;
        }
        true
    }

    /// Look up a named property for string-template substitution.
    /// Structural fields first, then tag values; None if nothing matches.
    pub fn property(&self, key: &str) -> Option<String> {
        match key {
            "name" => Some(self.name.clone()),
            "kind" => Some(self.kind.as_str().to_string()),
            "subtype" => Some(self.subtype.clone()),
            "status" => Some(self.status.as_str().to_string()),
            "culture" => self.culture.clone(),
            "description" => Some(self.description.clone()),
            _ => self.tags.get(key).map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }
}
