//! The committing layer: turns an [`ExpansionResult`] into graph state,
//! allocating permanent ids for `pending-<n>` placeholders and re-resolving
//! every relationship endpoint in one deferred pass.

use super::memory::MemoryGraph;
use crate::interp::result::{Endpoint, ExpansionResult};
use crate::model::entity::Entity;
use crate::model::relationship::Relationship;

/// Commit an expansion to the graph. Returns the permanent ids allocated for
/// the result's partial entities, in placeholder order.
///
/// # Panics
/// Panics if a relationship endpoint references a placeholder outside the
/// result or an existing entity the graph does not contain — both indicate a
/// result produced against a different graph.
pub fn commit_expansion(graph: &mut MemoryGraph, result: &ExpansionResult) -> Vec<u64> {
    let mut ids = Vec::with_capacity(result.entities.len());
    for partial in &result.entities {
        assert_eq!(
            partial.placeholder.0,
            ids.len(),
            "commit_expansion: placeholders must be dense and in creation order"
        );
        let id = graph.id_gen.next_id();
        let name = synthesize_name(partial, id);
        graph.insert_entity(Entity {
            id,
            kind: partial.kind.clone(),
            subtype: partial.subtype.clone(),
            name,
            status: partial.status.clone(),
            prominence: partial.prominence,
            culture: partial.culture.clone(),
            tags: partial.tags.clone(),
            position: partial.position,
            description: partial.description.clone(),
        });
        ids.push(id);
    }

    for draft in &result.relationships {
        let mut rel = Relationship::new(
            resolve(&ids, graph, draft.source),
            resolve(&ids, graph, draft.dest),
            draft.kind.clone(),
        );
        rel.strength = draft.strength;
        rel.distance = draft.distance;
        rel.catalyst = draft.catalyst.map(|c| resolve(&ids, graph, c));
        graph.add_relationship_record(rel);
    }
    ids
}

fn resolve(ids: &[u64], graph: &MemoryGraph, endpoint: Endpoint) -> u64 {
    match endpoint {
        Endpoint::Pending(pending) => *ids
            .get(pending.0)
            .unwrap_or_else(|| panic!("commit_expansion: unknown placeholder {pending}")),
        Endpoint::Existing(id) => {
            assert!(
                graph.entities.contains_key(&id),
                "commit_expansion: existing entity {id} not found"
            );
            id
        }
    }
}

/// Entities arrive nameless; the committing layer assigns a stable
/// subtype-derived name until a naming pass replaces it.
fn synthesize_name(partial: &crate::interp::result::PartialEntity, id: u64) -> String {
    let stem = if partial.subtype.is_empty() {
        partial.kind.as_str()
    } else {
        partial.subtype.as_str()
    };
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => format!("{}{} {id}", first.to_uppercase(), chars.as_str()),
        None => format!("Entity {id}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::graph::view::GraphView;
    use crate::interp::result::{PartialEntity, RelationshipDraft};
    use crate::model::entity::{EntityKind, EntityStatus, Prominence};
    use crate::model::refs::PendingId;
    use crate::model::relationship::{Direction, RelationshipKind};

    fn partial(index: usize, kind: EntityKind, subtype: &str) -> PartialEntity {
        PartialEntity {
            placeholder: PendingId(index),
            kind,
            subtype: subtype.to_string(),
            culture: None,
            description: String::new(),
            status: EntityStatus::Active,
            prominence: Prominence::Marginal,
            tags: BTreeMap::new(),
            position: None,
            region_ids: vec![],
        }
    }

    #[test]
    fn commit_allocates_ids_and_resolves_placeholders() {
        let mut graph = MemoryGraph::new();
        let patron = graph.add_entity(EntityKind::Npc, "prophet", "Vesna");

        let result = ExpansionResult {
            entities: vec![
                partial(0, EntityKind::Faction, "cult"),
                partial(1, EntityKind::Location, "shrine"),
            ],
            relationships: vec![
                RelationshipDraft {
                    source: Endpoint::Existing(patron),
                    dest: Endpoint::Pending(PendingId(0)),
                    kind: RelationshipKind::MemberOf,
                    strength: Some(0.9),
                    distance: None,
                    catalyst: None,
                },
                RelationshipDraft {
                    source: Endpoint::Pending(PendingId(0)),
                    dest: Endpoint::Pending(PendingId(1)),
                    kind: RelationshipKind::LocatedIn,
                    strength: None,
                    distance: None,
                    catalyst: Some(Endpoint::Existing(patron)),
                },
            ],
            description: String::new(),
            debug: vec![],
        };

        let ids = commit_expansion(&mut graph, &result);
        assert_eq!(ids.len(), 2);
        assert_eq!(graph.entities.len(), 3);

        let cult = graph.entities.get(&ids[0]).unwrap();
        assert_eq!(cult.kind, EntityKind::Faction);
        assert_eq!(cult.name, format!("Cult {}", ids[0]));

        assert!(graph.has_relationship(
            patron,
            &RelationshipKind::MemberOf,
            Direction::Out,
            Some(ids[0])
        ));
        assert!(graph.has_relationship(
            ids[0],
            &RelationshipKind::LocatedIn,
            Direction::Out,
            Some(ids[1])
        ));
        let located = graph
            .relationships
            .iter()
            .find(|r| r.kind == RelationshipKind::LocatedIn)
            .unwrap();
        assert_eq!(located.catalyst, Some(patron));
    }

    #[test]
    fn committed_entities_keep_partial_fields() {
        let mut graph = MemoryGraph::new();
        let mut entity = partial(0, EntityKind::Npc, "zealot");
        entity.culture = Some("mirefolk".to_string());
        entity.position = Some((12.0, 34.0));
        entity.tags.insert("blessed".to_string(), serde_json::json!(true));
        entity.description = "A fierce devotee".to_string();

        let result = ExpansionResult {
            entities: vec![entity],
            relationships: vec![],
            description: String::new(),
            debug: vec![],
        };
        let ids = commit_expansion(&mut graph, &result);
        let committed = graph.entities.get(&ids[0]).unwrap();
        assert_eq!(committed.culture.as_deref(), Some("mirefolk"));
        assert_eq!(committed.position, Some((12.0, 34.0)));
        assert_eq!(committed.tags["blessed"], serde_json::json!(true));
        assert_eq!(committed.description, "A fierce devotee");
    }

    #[test]
    #[should_panic(expected = "unknown placeholder")]
    fn commit_panics_on_out_of_range_placeholder() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_entity(EntityKind::Npc, "", "A");
        let result = ExpansionResult {
            entities: vec![],
            relationships: vec![RelationshipDraft {
                source: Endpoint::Existing(a),
                dest: Endpoint::Pending(PendingId(0)),
                kind: RelationshipKind::Knows,
                strength: None,
                distance: None,
                catalyst: None,
            }],
            description: String::new(),
            debug: vec![],
        };
        commit_expansion(&mut graph, &result);
    }
}
