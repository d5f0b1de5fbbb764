use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Temporary identity of an entity created within one expansion, before the
/// committing layer allocates a permanent id. Index is the creation order
/// across the whole expansion, rendered as `pending-<index>` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PendingId(pub usize);

impl fmt::Display for PendingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pending-{}", self.0)
    }
}

impl PendingId {
    /// Parse the `pending-<index>` wire form.
    pub fn parse(s: &str) -> Option<Self> {
        let index = s.strip_prefix("pending-")?.parse().ok()?;
        Some(PendingId(index))
    }
}

impl Serialize for PendingId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PendingId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PendingId::parse(&s)
            .ok_or_else(|| de::Error::custom(format!("invalid pending id: {s:?}")))
    }
}

/// Symbolic reference to an entity inside a template document.
///
/// Parsed once at deserialization from the wire forms `"$target"`, `"$name"`,
/// `"new:label"`, `"pending-3"`, or a bare integer id; resolution against the
/// execution context never re-parses strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// The entity the template is currently expanding around.
    Target,
    /// A declared template variable (entity or entity list).
    Var(String),
    /// Every placeholder produced by the creation rule with this label.
    Created(String),
    /// A placeholder from earlier in the same expansion.
    Pending(PendingId),
    /// A literal graph entity id.
    Entity(u64),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Target => write!(f, "$target"),
            EntityRef::Var(name) => write!(f, "${name}"),
            EntityRef::Created(label) => write!(f, "new:{label}"),
            EntityRef::Pending(p) => write!(f, "{p}"),
            EntityRef::Entity(id) => write!(f, "{id}"),
        }
    }
}

impl EntityRef {
    pub fn var(name: &str) -> Self {
        EntityRef::Var(name.to_string())
    }

    pub fn created(label: &str) -> Self {
        EntityRef::Created(label.to_string())
    }

    fn from_str_form(s: &str) -> Result<Self, String> {
        if let Some(name) = s.strip_prefix('$') {
            if name.is_empty() {
                return Err("variable reference missing a name".to_string());
            }
            if name == "target" {
                return Ok(EntityRef::Target);
            }
            return Ok(EntityRef::Var(name.to_string()));
        }
        if let Some(label) = s.strip_prefix("new:") {
            if label.is_empty() {
                return Err("creation reference missing a label".to_string());
            }
            return Ok(EntityRef::Created(label.to_string()));
        }
        if let Some(pending) = PendingId::parse(s) {
            return Ok(EntityRef::Pending(pending));
        }
        s.parse::<u64>()
            .map(EntityRef::Entity)
            .map_err(|_| format!("unrecognized entity reference: {s:?}"))
    }
}

impl Serialize for EntityRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EntityRef::Entity(id) => serializer.serialize_u64(*id),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

struct EntityRefVisitor;

impl Visitor<'_> for EntityRefVisitor {
    type Value = EntityRef;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an entity id or a \"$var\"/\"new:label\"/\"pending-N\" reference")
    }

    fn visit_u64<E: de::Error>(self, id: u64) -> Result<EntityRef, E> {
        Ok(EntityRef::Entity(id))
    }

    fn visit_i64<E: de::Error>(self, id: i64) -> Result<EntityRef, E> {
        u64::try_from(id)
            .map(EntityRef::Entity)
            .map_err(|_| de::Error::custom("entity id cannot be negative"))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<EntityRef, E> {
        EntityRef::from_str_form(s).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for EntityRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EntityRefVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_wire_forms() {
        let cases: Vec<(&str, EntityRef)> = vec![
            ("\"$target\"", EntityRef::Target),
            ("\"$patron\"", EntityRef::var("patron")),
            ("\"new:shrine\"", EntityRef::created("shrine")),
            ("\"pending-3\"", EntityRef::Pending(PendingId(3))),
            ("42", EntityRef::Entity(42)),
            ("\"42\"", EntityRef::Entity(42)),
        ];
        for (json, expected) in cases {
            let parsed: EntityRef = serde_json::from_str(json).unwrap();
            assert_eq!(parsed, expected, "input {json}");
        }
    }

    #[test]
    fn round_trips() {
        for r in [
            EntityRef::Target,
            EntityRef::var("patron"),
            EntityRef::created("shrine"),
            EntityRef::Pending(PendingId(7)),
            EntityRef::Entity(99),
        ] {
            let json = serde_json::to_string(&r).unwrap();
            let back: EntityRef = serde_json::from_str(&json).unwrap();
            assert_eq!(back, r);
        }
    }

    #[test]
    fn rejects_malformed_references() {
        assert!(serde_json::from_str::<EntityRef>("\"$\"").is_err());
        assert!(serde_json::from_str::<EntityRef>("\"new:\"").is_err());
        assert!(serde_json::from_str::<EntityRef>("\"bogus\"").is_err());
        assert!(serde_json::from_str::<EntityRef>("-4").is_err());
    }

    #[test]
    fn pending_id_display_and_parse() {
        assert_eq!(PendingId(0).to_string(), "pending-0");
        assert_eq!(PendingId::parse("pending-12"), Some(PendingId(12)));
        assert_eq!(PendingId::parse("pending-"), None);
        assert_eq!(PendingId::parse("12"), None);
    }
}
