use std::collections::BTreeMap;

use rand::RngCore;

use crate::model::entity::{Entity, EntityKind, EntityStatus};
use crate::model::relationship::{Direction, RelationshipKind};
use crate::model::template::PlacementSpec;

/// Everything the interpreter hands the placement delegate for one created
/// entity. `anchors` and `avoid` are already resolved to entity ids.
#[derive(Debug)]
pub struct PlacementRequest<'a> {
    pub kind: &'a EntityKind,
    pub culture: Option<&'a str>,
    pub spec: &'a PlacementSpec,
    pub anchors: Vec<u64>,
    pub avoid: Vec<u64>,
}

/// What the placement delegate returns on success: coordinates, tags derived
/// from the surrounding geography, containing-region ids, and optional debug
/// metadata for the expansion result.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementOutcome {
    pub position: (f64, f64),
    pub tags: BTreeMap<String, serde_json::Value>,
    pub region_ids: Vec<u64>,
    pub debug: Option<String>,
}

/// The storage boundary the interpreter operates through. Object-safe so an
/// expansion can hold `&mut dyn GraphView` the way a tick holds
/// `&mut dyn RngCore`.
///
/// Mutation happens only through the primitives at the bottom; the
/// interpreter never touches entity or relationship storage directly.
pub trait GraphView {
    fn entity(&self, id: u64) -> Option<&Entity>;
    fn entity_ids(&self) -> Vec<u64>;
    fn entities_of_kind(&self, kind: &EntityKind) -> Vec<u64>;
    fn count_entities(
        &self,
        kind: &EntityKind,
        subtype: Option<&str>,
        status: Option<&EntityStatus>,
    ) -> usize;
    /// Configured population target for a kind(+subtype), if any.
    fn distribution_target(&self, kind: &EntityKind, subtype: Option<&str>) -> Option<u32>;

    /// Named world-state scalar; unknown names read as 0.0.
    fn pressure(&self, name: &str) -> f64;
    fn adjust_pressure(&mut self, name: &str, delta: f64);

    fn current_era(&self) -> String;
    fn current_tick(&self) -> u64;

    /// Tick at which the template last recorded a creation.
    fn last_creation_tick(&self, template_id: &str) -> Option<u64>;
    fn creations_this_epoch(&self, template_id: &str) -> u32;
    /// Rate-limit bump: stamps the current tick and increments the epoch
    /// counter for the template.
    fn record_creation(&mut self, template_id: &str);

    /// Entities reachable over non-archived relationships of `kind` in
    /// `direction`, optionally requiring a minimum strength.
    fn neighbors(
        &self,
        entity_id: u64,
        kind: &RelationshipKind,
        direction: Direction,
        min_strength: Option<f64>,
    ) -> Vec<u64>;
    /// Whether a non-archived relationship of `kind` touches `entity_id` in
    /// `direction`, optionally with a specific entity on the far end.
    fn has_relationship(
        &self,
        entity_id: u64,
        kind: &RelationshipKind,
        direction: Direction,
        other: Option<u64>,
    ) -> bool;
    /// Returns false when no matching live relationship exists.
    fn archive_relationship(&mut self, source: u64, target: u64, kind: &RelationshipKind) -> bool;

    fn set_status(&mut self, entity_id: u64, status: EntityStatus) -> bool;
    fn set_tag(&mut self, entity_id: u64, tag: &str, value: serde_json::Value) -> bool;
    fn remove_tag(&mut self, entity_id: u64, tag: &str) -> bool;

    /// `(min_x, min_y, max_x, max_y)` of the world, used for last-resort
    /// placement fallback.
    fn world_bounds(&self) -> (f64, f64, f64, f64);
    /// Spatial placement delegate. `None` signals failure; the creation
    /// engine then substitutes a uniform-random point.
    fn place(
        &mut self,
        request: &PlacementRequest<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<PlacementOutcome>;
}
