//! Builders and helpers for constructing test graphs. Mirrors the shape of
//! the templates' world: entities with subtype/status/prominence/tags,
//! relationships, pressures, eras, ticks.

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::graph::memory::MemoryGraph;
use crate::graph::view::GraphView;
use crate::model::entity::{EntityKind, EntityStatus, Prominence};
use crate::model::relationship::{Direction, Relationship, RelationshipKind};

/// Deterministic RNG for tests.
pub fn rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Typed reference to an entity in a [`GraphBuilder`], enabling chained field
/// mutation. Call [`.id()`](EntityHandle::id) to terminate the chain.
pub struct EntityHandle<'a> {
    graph: &'a mut MemoryGraph,
    id: u64,
}

impl<'a> EntityHandle<'a> {
    pub fn subtype(self, v: &str) -> Self {
        self.graph.entities.get_mut(&self.id).unwrap().subtype = v.to_string();
        self
    }

    pub fn status(self, v: EntityStatus) -> Self {
        self.graph.entities.get_mut(&self.id).unwrap().status = v;
        self
    }

    pub fn prominence(self, v: Prominence) -> Self {
        self.graph.entities.get_mut(&self.id).unwrap().prominence = v;
        self
    }

    pub fn culture(self, v: &str) -> Self {
        self.graph.entities.get_mut(&self.id).unwrap().culture = Some(v.to_string());
        self
    }

    pub fn position(self, x: f64, y: f64) -> Self {
        self.graph.entities.get_mut(&self.id).unwrap().position = Some((x, y));
        self
    }

    pub fn tag(self, key: &str, value: serde_json::Value) -> Self {
        self.graph
            .entities
            .get_mut(&self.id)
            .unwrap()
            .tags
            .insert(key.to_string(), value);
        self
    }

    /// Terminate the chain and return the entity ID.
    pub fn id(self) -> u64 {
        self.id
    }
}

/// Scenario-style builder over a [`MemoryGraph`].
pub struct GraphBuilder {
    graph: MemoryGraph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: MemoryGraph::new(),
        }
    }

    pub fn at_tick(tick: u64) -> Self {
        let mut builder = Self::new();
        builder.graph.set_tick(tick);
        builder
    }

    pub fn era(&mut self, era: &str) -> &mut Self {
        self.graph.set_era(era);
        self
    }

    pub fn pressure(&mut self, name: &str, value: f64) -> &mut Self {
        self.graph.set_pressure(name, value);
        self
    }

    pub fn distribution_target(
        &mut self,
        kind: EntityKind,
        subtype: Option<&str>,
        target: u32,
    ) -> &mut Self {
        self.graph.set_distribution_target(kind, subtype, target);
        self
    }

    pub fn entity(&mut self, kind: EntityKind, subtype: &str, name: &str) -> EntityHandle<'_> {
        let id = self.graph.add_entity(kind, subtype, name);
        EntityHandle {
            graph: &mut self.graph,
            id,
        }
    }

    pub fn npc(&mut self, name: &str) -> EntityHandle<'_> {
        self.entity(EntityKind::Npc, "", name)
    }

    pub fn location(&mut self, name: &str) -> EntityHandle<'_> {
        self.entity(EntityKind::Location, "", name)
    }

    pub fn faction(&mut self, name: &str) -> EntityHandle<'_> {
        self.entity(EntityKind::Faction, "", name)
    }

    /// A `location/region` entity at a position, which the built-in placement
    /// delegate uses for containment tags.
    pub fn region(&mut self, name: &str, x: f64, y: f64) -> u64 {
        self.entity(EntityKind::Location, "region", name)
            .position(x, y)
            .id()
    }

    pub fn relate(&mut self, source: u64, kind: RelationshipKind, target: u64) -> &mut Self {
        self.graph.add_relationship(source, target, kind);
        self
    }

    pub fn relate_strength(
        &mut self,
        source: u64,
        kind: RelationshipKind,
        target: u64,
        strength: f64,
    ) -> &mut Self {
        let mut rel = Relationship::new(source, target, kind);
        rel.strength = Some(strength);
        self.graph.add_relationship_record(rel);
        self
    }

    pub fn build(self) -> MemoryGraph {
        self.graph
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Assertion helpers
// ---------------------------------------------------------------------------

/// Assert that a live relationship of `kind` runs from source to target.
pub fn assert_related(graph: &MemoryGraph, source: u64, kind: &RelationshipKind, target: u64) {
    assert!(
        graph.has_relationship(source, kind, Direction::Out, Some(target)),
        "assert_related: no live {:?} from {source} to {target}",
        kind
    );
}

/// Assert an entity's status.
pub fn assert_status(graph: &MemoryGraph, id: u64, status: EntityStatus) {
    let entity = graph
        .entities
        .get(&id)
        .unwrap_or_else(|| panic!("assert_status: entity {id} not found"));
    assert_eq!(
        entity.status, status,
        "assert_status: entity {id} ({}) has status {:?}",
        entity.name, entity.status
    );
}

/// Assert a float is approximately equal, with a named context message.
pub fn assert_approx(actual: f64, expected: f64, tolerance: f64, msg: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{msg}: expected ~{expected} (+-{tolerance}), got {actual}"
    );
}
