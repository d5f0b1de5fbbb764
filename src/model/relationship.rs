use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationshipKind {
    MemberOf,
    LocatedIn,
    AlliedWith,
    RivalOf,
    RulerOf,
    Knows,
    Venerates,
    Wields,
    Custom(String),
}

impl RelationshipKind {
    pub fn as_str(&self) -> &str {
        match self {
            RelationshipKind::MemberOf => "member_of",
            RelationshipKind::LocatedIn => "located_in",
            RelationshipKind::AlliedWith => "allied_with",
            RelationshipKind::RivalOf => "rival_of",
            RelationshipKind::RulerOf => "ruler_of",
            RelationshipKind::Knows => "knows",
            RelationshipKind::Venerates => "venerates",
            RelationshipKind::Wields => "wields",
            RelationshipKind::Custom(s) => s.as_str(),
        }
    }
}

impl Serialize for RelationshipKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RelationshipKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "member_of" => Ok(RelationshipKind::MemberOf),
            "located_in" => Ok(RelationshipKind::LocatedIn),
            "allied_with" => Ok(RelationshipKind::AlliedWith),
            "rival_of" => Ok(RelationshipKind::RivalOf),
            "ruler_of" => Ok(RelationshipKind::RulerOf),
            "knows" => Ok(RelationshipKind::Knows),
            "venerates" => Ok(RelationshipKind::Venerates),
            "wields" => Ok(RelationshipKind::Wields),
            _ => {
                if s.is_empty() {
                    Err(de::Error::custom("relationship kind cannot be empty"))
                } else {
                    Ok(RelationshipKind::Custom(s))
                }
            }
        }
    }
}

/// Traversal direction relative to the entity being walked from.
///
/// `Out`: the entity is the source, land on destinations. `In`: the entity is
/// the destination, land on sources. `Both`: either end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Out,
    In,
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    pub source_entity_id: u64,
    pub target_entity_id: u64,
    pub kind: RelationshipKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Entity whose involvement caused this relationship, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalyst: Option<u64>,
    /// Archived relationships are retained for history but excluded from
    /// traversal and existence queries.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub archived: bool,
}

impl Relationship {
    pub fn new(source: u64, target: u64, kind: RelationshipKind) -> Self {
        Self {
            source_entity_id: source,
            target_entity_id: target,
            kind,
            strength: None,
            distance: None,
            catalyst: None,
            archived: false,
        }
    }

    /// Whether this edge touches `entity_id` in the given direction.
    pub fn touches(&self, entity_id: u64, direction: Direction) -> bool {
        match direction {
            Direction::Out => self.source_entity_id == entity_id,
            Direction::In => self.target_entity_id == entity_id,
            Direction::Both => {
                self.source_entity_id == entity_id || self.target_entity_id == entity_id
            }
        }
    }

    /// The entity on the far side of this edge from `entity_id`.
    pub fn other_end(&self, entity_id: u64) -> u64 {
        if self.source_entity_id == entity_id {
            self.target_entity_id
        } else {
            self.source_entity_id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RelationshipKind::MemberOf).unwrap(),
            "\"member_of\""
        );
        assert_eq!(
            serde_json::to_string(&RelationshipKind::Venerates).unwrap(),
            "\"venerates\""
        );
    }

    #[test]
    fn custom_kind_round_trips() {
        let kind = RelationshipKind::Custom("haunts".to_string());
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, "\"haunts\"");
        let back: RelationshipKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }

    #[test]
    fn optional_fields_omitted_when_absent() {
        let rel = Relationship::new(1, 2, RelationshipKind::Knows);
        let json = serde_json::to_string(&rel).unwrap();
        assert!(!json.contains("strength"));
        assert!(!json.contains("catalyst"));
        assert!(!json.contains("archived"));
    }

    #[test]
    fn archived_serialized_when_set() {
        let mut rel = Relationship::new(1, 2, RelationshipKind::Knows);
        rel.archived = true;
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json["archived"], true);
    }

    #[test]
    fn direction_default_is_out() {
        assert_eq!(Direction::default(), Direction::Out);
        let d: Direction = serde_json::from_str("\"both\"").unwrap();
        assert_eq!(d, Direction::Both);
    }

    #[test]
    fn touches_respects_direction() {
        let rel = Relationship::new(1, 2, RelationshipKind::Knows);
        assert!(rel.touches(1, Direction::Out));
        assert!(!rel.touches(1, Direction::In));
        assert!(rel.touches(2, Direction::In));
        assert!(rel.touches(2, Direction::Both));
        assert!(!rel.touches(3, Direction::Both));
    }

    #[test]
    fn other_end_swaps() {
        let rel = Relationship::new(1, 2, RelationshipKind::Knows);
        assert_eq!(rel.other_end(1), 2);
        assert_eq!(rel.other_end(2), 1);
    }
}
