use std::collections::BTreeMap;

use rand::{Rng, RngCore};

use super::view::{GraphView, PlacementOutcome, PlacementRequest};
use crate::id::IdGenerator;
use crate::model::entity::{Entity, EntityKind, EntityStatus, Prominence};
use crate::model::relationship::{Direction, Relationship, RelationshipKind};
use crate::model::template::PlacementAnchor;

// --- Placement tuning ---
const ANCHOR_SCATTER: f64 = 25.0;
const SPACING_ATTEMPTS: u32 = 8;
const SPARSE_CANDIDATES: u32 = 8;
/// Regions only claim entities within this radius.
const REGION_REACH: f64 = 200.0;

/// Static world parameters for a [`MemoryGraph`].
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub bounds: (f64, f64, f64, f64),
    pub era: String,
    /// Population targets keyed by kind and optional subtype. A `None`
    /// subtype target covers the whole kind.
    pub distribution_targets: BTreeMap<(EntityKind, Option<String>), u32>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            bounds: (0.0, 0.0, 1000.0, 1000.0),
            era: "age_of_founding".to_string(),
            distribution_targets: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct TemplateStats {
    last_creation_tick: Option<u64>,
    epoch_creations: u32,
}

/// In-memory reference implementation of [`GraphView`], with a built-in
/// bounds-uniform placement delegate that derives region containment from
/// `location/region` entities.
#[derive(Debug)]
pub struct MemoryGraph {
    pub entities: BTreeMap<u64, Entity>,
    pub relationships: Vec<Relationship>,
    pub pressures: BTreeMap<String, f64>,
    pub config: GraphConfig,
    pub id_gen: IdGenerator,
    tick: u64,
    template_stats: BTreeMap<String, TemplateStats>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            entities: BTreeMap::new(),
            relationships: Vec::new(),
            pressures: BTreeMap::new(),
            config,
            id_gen: IdGenerator::new(),
            tick: 0,
            template_stats: BTreeMap::new(),
        }
    }

    /// Add an entity with default status/prominence, assigning a unique ID.
    /// Returns the assigned ID.
    pub fn add_entity(&mut self, kind: EntityKind, subtype: &str, name: &str) -> u64 {
        let id = self.id_gen.next_id();
        let entity = Entity {
            id,
            kind,
            subtype: subtype.to_string(),
            name: name.to_string(),
            status: EntityStatus::Active,
            prominence: Prominence::default(),
            culture: None,
            tags: BTreeMap::new(),
            position: None,
            description: String::new(),
        };
        self.entities.insert(id, entity);
        id
    }

    /// Insert a fully-formed entity.
    ///
    /// # Panics
    /// Panics if the ID is already taken.
    pub fn insert_entity(&mut self, entity: Entity) {
        assert!(
            !self.entities.contains_key(&entity.id),
            "insert_entity: id {} already exists",
            entity.id
        );
        self.entities.insert(entity.id, entity);
    }

    /// Add a relationship between two existing entities.
    ///
    /// # Panics
    /// Panics if either endpoint is missing, the endpoints are equal, or an
    /// identical live relationship already exists.
    pub fn add_relationship(&mut self, source: u64, target: u64, kind: RelationshipKind) {
        self.add_relationship_record(Relationship::new(source, target, kind));
    }

    /// Add a relationship record with strength/distance/catalyst set.
    ///
    /// # Panics
    /// Same contract as [`MemoryGraph::add_relationship`].
    pub fn add_relationship_record(&mut self, rel: Relationship) {
        assert!(
            self.entities.contains_key(&rel.source_entity_id),
            "add_relationship: source entity {} not found",
            rel.source_entity_id
        );
        assert!(
            self.entities.contains_key(&rel.target_entity_id),
            "add_relationship: target entity {} not found",
            rel.target_entity_id
        );
        assert!(
            rel.source_entity_id != rel.target_entity_id,
            "add_relationship: cannot create self-relationship on entity {}",
            rel.source_entity_id
        );
        assert!(
            !self.relationships.iter().any(|r| {
                r.source_entity_id == rel.source_entity_id
                    && r.target_entity_id == rel.target_entity_id
                    && r.kind == rel.kind
                    && !r.archived
            }),
            "add_relationship: duplicate live relationship from {} to {}",
            rel.source_entity_id,
            rel.target_entity_id
        );
        self.relationships.push(rel);
    }

    pub fn set_pressure(&mut self, name: &str, value: f64) {
        self.pressures.insert(name.to_string(), value);
    }

    pub fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    pub fn set_era(&mut self, era: &str) {
        self.config.era = era.to_string();
    }

    pub fn set_distribution_target(
        &mut self,
        kind: EntityKind,
        subtype: Option<&str>,
        target: u32,
    ) {
        self.config
            .distribution_targets
            .insert((kind, subtype.map(String::from)), target);
    }

    /// Epoch boundary hook for the owning scheduler: zero every template's
    /// per-epoch creation counter, leaving cooldown ticks intact.
    pub fn reset_epoch_counters(&mut self) {
        for stats in self.template_stats.values_mut() {
            stats.epoch_creations = 0;
        }
    }

    /// Non-archived relationships viewed from `entity_id`.
    fn live_relationships(
        &self,
        entity_id: u64,
        kind: &RelationshipKind,
        direction: Direction,
    ) -> impl Iterator<Item = &Relationship> {
        self.relationships
            .iter()
            .filter(move |r| !r.archived && r.kind == *kind && r.touches(entity_id, direction))
    }

    fn region_entities(&self) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| e.kind == EntityKind::Location && e.subtype == "region")
            .collect()
    }

    /// Nearest region entity within reach of a point, if any.
    fn containing_region(&self, point: (f64, f64)) -> Option<&Entity> {
        self.region_entities()
            .into_iter()
            .filter_map(|region| {
                let (rx, ry) = region.position?;
                let dist = ((rx - point.0).powi(2) + (ry - point.1).powi(2)).sqrt();
                (dist <= REGION_REACH).then_some((region, dist))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(region, _)| region)
    }

    fn random_point_in(
        &self,
        bounds: (f64, f64, f64, f64),
        rng: &mut dyn RngCore,
    ) -> (f64, f64) {
        let (min_x, min_y, max_x, max_y) = bounds;
        (
            rng.random_range(min_x..=max_x),
            rng.random_range(min_y..=max_y),
        )
    }

    fn clamp_to_bounds(&self, point: (f64, f64)) -> (f64, f64) {
        let (min_x, min_y, max_x, max_y) = self.config.bounds;
        (point.0.clamp(min_x, max_x), point.1.clamp(min_y, max_y))
    }

    /// One candidate point for the request's anchor, before spacing checks.
    fn anchor_point(
        &self,
        request: &PlacementRequest<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<(f64, f64)> {
        let scatter = request.spec.max_distance.unwrap_or(ANCHOR_SCATTER);
        let jitter = |center: (f64, f64), rng: &mut dyn RngCore| {
            (
                center.0 + rng.random_range(-scatter..=scatter),
                center.1 + rng.random_range(-scatter..=scatter),
            )
        };
        match &request.spec.anchor {
            PlacementAnchor::Entity { .. } => {
                let center = request
                    .anchors
                    .iter()
                    .find_map(|id| self.entities.get(id)?.position)?;
                Some(jitter(center, rng))
            }
            PlacementAnchor::CultureRegion { culture } => {
                let wanted = culture.as_deref().or(request.culture)?;
                let regions: Vec<(f64, f64)> = self
                    .region_entities()
                    .into_iter()
                    .filter(|r| r.culture.as_deref() == Some(wanted))
                    .filter_map(|r| r.position)
                    .collect();
                if regions.is_empty() {
                    return None;
                }
                let center = regions[rng.random_range(0..regions.len())];
                Some(jitter(center, rng))
            }
            PlacementAnchor::Centroid { .. } => {
                let points: Vec<(f64, f64)> = request
                    .anchors
                    .iter()
                    .filter_map(|id| self.entities.get(id)?.position)
                    .collect();
                if points.is_empty() {
                    return None;
                }
                let n = points.len() as f64;
                let center = (
                    points.iter().map(|p| p.0).sum::<f64>() / n,
                    points.iter().map(|p| p.1).sum::<f64>() / n,
                );
                Some(jitter(center, rng))
            }
            PlacementAnchor::Bounds {
                min_x,
                min_y,
                max_x,
                max_y,
            } => Some(self.random_point_in((*min_x, *min_y, *max_x, *max_y), rng)),
            PlacementAnchor::SparseArea => {
                let occupied: Vec<(f64, f64)> =
                    self.entities.values().filter_map(|e| e.position).collect();
                let mut best: Option<((f64, f64), f64)> = None;
                for _ in 0..SPARSE_CANDIDATES {
                    let candidate = self.random_point_in(self.config.bounds, rng);
                    let nearest = occupied
                        .iter()
                        .map(|p| ((p.0 - candidate.0).powi(2) + (p.1 - candidate.1).powi(2)).sqrt())
                        .fold(f64::INFINITY, f64::min);
                    if best.is_none() || nearest > best.unwrap().1 {
                        best = Some((candidate, nearest));
                    }
                }
                best.map(|(point, _)| point)
            }
        }
    }

    fn far_enough(&self, point: (f64, f64), avoid: &[u64], spacing: f64) -> bool {
        avoid.iter().all(|id| {
            match self.entities.get(id).and_then(|e| e.position) {
                Some((x, y)) => ((x - point.0).powi(2) + (y - point.1).powi(2)).sqrt() >= spacing,
                None => true,
            }
        })
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphView for MemoryGraph {
    fn entity(&self, id: u64) -> Option<&Entity> {
        self.entities.get(&id)
    }

    fn entity_ids(&self) -> Vec<u64> {
        self.entities.keys().copied().collect()
    }

    fn entities_of_kind(&self, kind: &EntityKind) -> Vec<u64> {
        self.entities
            .values()
            .filter(|e| e.kind == *kind)
            .map(|e| e.id)
            .collect()
    }

    fn count_entities(
        &self,
        kind: &EntityKind,
        subtype: Option<&str>,
        status: Option<&EntityStatus>,
    ) -> usize {
        self.entities
            .values()
            .filter(|e| e.matches_filter(Some(kind), subtype, status))
            .count()
    }

    fn distribution_target(&self, kind: &EntityKind, subtype: Option<&str>) -> Option<u32> {
        let with_subtype = (kind.clone(), subtype.map(String::from));
        if let Some(target) = self.config.distribution_targets.get(&with_subtype) {
            return Some(*target);
        }
        self.config
            .distribution_targets
            .get(&(kind.clone(), None))
            .copied()
    }

    fn pressure(&self, name: &str) -> f64 {
        self.pressures.get(name).copied().unwrap_or(0.0)
    }

    fn adjust_pressure(&mut self, name: &str, delta: f64) {
        *self.pressures.entry(name.to_string()).or_insert(0.0) += delta;
    }

    fn current_era(&self) -> String {
        self.config.era.clone()
    }

    fn current_tick(&self) -> u64 {
        self.tick
    }

    fn last_creation_tick(&self, template_id: &str) -> Option<u64> {
        self.template_stats
            .get(template_id)
            .and_then(|s| s.last_creation_tick)
    }

    fn creations_this_epoch(&self, template_id: &str) -> u32 {
        self.template_stats
            .get(template_id)
            .map(|s| s.epoch_creations)
            .unwrap_or(0)
    }

    fn record_creation(&mut self, template_id: &str) {
        let stats = self
            .template_stats
            .entry(template_id.to_string())
            .or_default();
        stats.last_creation_tick = Some(self.tick);
        stats.epoch_creations += 1;
    }

    fn neighbors(
        &self,
        entity_id: u64,
        kind: &RelationshipKind,
        direction: Direction,
        min_strength: Option<f64>,
    ) -> Vec<u64> {
        self.live_relationships(entity_id, kind, direction)
            .filter(|r| match min_strength {
                Some(floor) => r.strength.is_some_and(|s| s >= floor),
                None => true,
            })
            .map(|r| r.other_end(entity_id))
            .collect()
    }

    fn has_relationship(
        &self,
        entity_id: u64,
        kind: &RelationshipKind,
        direction: Direction,
        other: Option<u64>,
    ) -> bool {
        self.live_relationships(entity_id, kind, direction)
            .any(|r| match other {
                Some(other_id) => r.other_end(entity_id) == other_id,
                None => true,
            })
    }

    fn archive_relationship(&mut self, source: u64, target: u64, kind: &RelationshipKind) -> bool {
        let found = self.relationships.iter_mut().find(|r| {
            !r.archived
                && r.kind == *kind
                && r.source_entity_id == source
                && r.target_entity_id == target
        });
        match found {
            Some(rel) => {
                rel.archived = true;
                true
            }
            None => false,
        }
    }

    fn set_status(&mut self, entity_id: u64, status: EntityStatus) -> bool {
        match self.entities.get_mut(&entity_id) {
            Some(entity) => {
                entity.status = status;
                true
            }
            None => false,
        }
    }

    fn set_tag(&mut self, entity_id: u64, tag: &str, value: serde_json::Value) -> bool {
        match self.entities.get_mut(&entity_id) {
            Some(entity) => {
                entity.tags.insert(tag.to_string(), value);
                true
            }
            None => false,
        }
    }

    fn remove_tag(&mut self, entity_id: u64, tag: &str) -> bool {
        match self.entities.get_mut(&entity_id) {
            Some(entity) => entity.tags.remove(tag).is_some(),
            None => false,
        }
    }

    fn world_bounds(&self) -> (f64, f64, f64, f64) {
        self.config.bounds
    }

    fn place(
        &mut self,
        request: &PlacementRequest<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<PlacementOutcome> {
        let spacing = request.spec.spacing;
        let mut point = None;
        let attempts = if spacing.is_some() { SPACING_ATTEMPTS } else { 1 };
        for _ in 0..attempts {
            let candidate = self.clamp_to_bounds(self.anchor_point(request, rng)?);
            match spacing {
                Some(s) if !self.far_enough(candidate, &request.avoid, s) => continue,
                _ => {
                    point = Some(candidate);
                    break;
                }
            }
        }
        let point = point?;

        let mut tags = BTreeMap::new();
        let mut region_ids = Vec::new();
        if let Some(region) = self.containing_region(point) {
            tags.insert(
                "region".to_string(),
                serde_json::Value::String(region.name.clone()),
            );
            region_ids.push(region.id);
        }
        Some(PlacementOutcome {
            position: point,
            tags,
            region_ids,
            debug: Some(format!(
                "placed {} at ({:.1}, {:.1})",
                request.kind.as_str(),
                point.0,
                point.1
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::model::template::PlacementSpec;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    fn placed(graph: &mut MemoryGraph, kind: EntityKind, subtype: &str, x: f64, y: f64) -> u64 {
        let id = graph.add_entity(kind, subtype, "spot");
        graph.entities.get_mut(&id).unwrap().position = Some((x, y));
        id
    }

    #[test]
    fn count_entities_filters_kind_subtype_status() {
        let mut graph = MemoryGraph::new();
        graph.add_entity(EntityKind::Npc, "cultist", "A");
        graph.add_entity(EntityKind::Npc, "hermit", "B");
        let c = graph.add_entity(EntityKind::Npc, "cultist", "C");
        graph.set_status(c, EntityStatus::Dormant);

        assert_eq!(graph.count_entities(&EntityKind::Npc, None, None), 3);
        assert_eq!(graph.count_entities(&EntityKind::Npc, Some("cultist"), None), 2);
        assert_eq!(
            graph.count_entities(&EntityKind::Npc, Some("cultist"), Some(&EntityStatus::Active)),
            1
        );
        assert_eq!(graph.count_entities(&EntityKind::Faction, None, None), 0);
    }

    #[test]
    fn distribution_target_falls_back_to_kind_level() {
        let mut graph = MemoryGraph::new();
        graph.set_distribution_target(EntityKind::Npc, None, 50);
        graph.set_distribution_target(EntityKind::Npc, Some("cultist"), 5);

        assert_eq!(graph.distribution_target(&EntityKind::Npc, Some("cultist")), Some(5));
        assert_eq!(graph.distribution_target(&EntityKind::Npc, Some("hermit")), Some(50));
        assert_eq!(graph.distribution_target(&EntityKind::Faction, None), None);
    }

    #[test]
    fn neighbors_respect_direction_and_archive() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_entity(EntityKind::Npc, "", "A");
        let b = graph.add_entity(EntityKind::Npc, "", "B");
        let c = graph.add_entity(EntityKind::Npc, "", "C");
        graph.add_relationship(a, b, RelationshipKind::Knows);
        graph.add_relationship(c, a, RelationshipKind::Knows);

        assert_eq!(graph.neighbors(a, &RelationshipKind::Knows, Direction::Out, None), vec![b]);
        assert_eq!(graph.neighbors(a, &RelationshipKind::Knows, Direction::In, None), vec![c]);
        let mut both = graph.neighbors(a, &RelationshipKind::Knows, Direction::Both, None);
        both.sort();
        assert_eq!(both, vec![b, c]);

        assert!(graph.archive_relationship(a, b, &RelationshipKind::Knows));
        assert!(graph.neighbors(a, &RelationshipKind::Knows, Direction::Out, None).is_empty());
        // Archiving again finds nothing
        assert!(!graph.archive_relationship(a, b, &RelationshipKind::Knows));
    }

    #[test]
    fn neighbors_apply_strength_floor() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_entity(EntityKind::Npc, "", "A");
        let b = graph.add_entity(EntityKind::Npc, "", "B");
        let c = graph.add_entity(EntityKind::Npc, "", "C");
        let mut strong = Relationship::new(a, b, RelationshipKind::Knows);
        strong.strength = Some(0.9);
        graph.add_relationship_record(strong);
        graph.add_relationship(a, c, RelationshipKind::Knows);

        assert_eq!(
            graph.neighbors(a, &RelationshipKind::Knows, Direction::Out, Some(0.5)),
            vec![b]
        );
    }

    #[test]
    fn record_creation_tracks_tick_and_epoch() {
        let mut graph = MemoryGraph::new();
        assert_eq!(graph.last_creation_tick("t"), None);
        assert_eq!(graph.creations_this_epoch("t"), 0);

        graph.set_tick(42);
        graph.record_creation("t");
        graph.record_creation("t");
        assert_eq!(graph.last_creation_tick("t"), Some(42));
        assert_eq!(graph.creations_this_epoch("t"), 2);

        graph.reset_epoch_counters();
        assert_eq!(graph.creations_this_epoch("t"), 0);
        assert_eq!(graph.last_creation_tick("t"), Some(42));
    }

    #[test]
    fn adjust_pressure_accumulates_from_zero() {
        let mut graph = MemoryGraph::new();
        assert_eq!(graph.pressure("dread"), 0.0);
        graph.adjust_pressure("dread", 0.4);
        graph.adjust_pressure("dread", -0.1);
        assert!((graph.pressure("dread") - 0.3).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "self-relationship")]
    fn add_relationship_panics_on_self_pair() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_entity(EntityKind::Npc, "", "A");
        graph.add_relationship(a, a, RelationshipKind::Knows);
    }

    #[test]
    #[should_panic(expected = "duplicate live relationship")]
    fn add_relationship_panics_on_duplicate() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_entity(EntityKind::Npc, "", "A");
        let b = graph.add_entity(EntityKind::Npc, "", "B");
        graph.add_relationship(a, b, RelationshipKind::Knows);
        graph.add_relationship(a, b, RelationshipKind::Knows);
    }

    #[test]
    fn archived_relationship_can_be_recreated() {
        let mut graph = MemoryGraph::new();
        let a = graph.add_entity(EntityKind::Npc, "", "A");
        let b = graph.add_entity(EntityKind::Npc, "", "B");
        graph.add_relationship(a, b, RelationshipKind::Knows);
        graph.archive_relationship(a, b, &RelationshipKind::Knows);
        graph.add_relationship(a, b, RelationshipKind::Knows);
        assert_eq!(graph.relationships.len(), 2);
    }

    #[test]
    fn place_near_entity_anchor() {
        let mut graph = MemoryGraph::new();
        let shrine = placed(&mut graph, EntityKind::Location, "shrine", 100.0, 100.0);
        let spec: PlacementSpec = serde_json::from_str(
            r#"{"anchor": "entity", "entity": "$target", "max_distance": 10.0}"#,
        )
        .unwrap();
        let request = PlacementRequest {
            kind: &EntityKind::Npc,
            culture: None,
            spec: &spec,
            anchors: vec![shrine],
            avoid: vec![],
        };
        let outcome = graph.place(&request, &mut rng()).unwrap();
        let (x, y) = outcome.position;
        assert!((x - 100.0).abs() <= 10.0 && (y - 100.0).abs() <= 10.0);
    }

    #[test]
    fn place_fails_without_positioned_anchor() {
        let mut graph = MemoryGraph::new();
        let ghost = graph.add_entity(EntityKind::Npc, "", "no position");
        let spec: PlacementSpec =
            serde_json::from_str(r#"{"anchor": "entity", "entity": "$target"}"#).unwrap();
        let request = PlacementRequest {
            kind: &EntityKind::Npc,
            culture: None,
            spec: &spec,
            anchors: vec![ghost],
            avoid: vec![],
        };
        assert!(graph.place(&request, &mut rng()).is_none());
    }

    #[test]
    fn place_in_bounds_derives_region_tag() {
        let mut graph = MemoryGraph::new();
        let region = placed(&mut graph, EntityKind::Location, "region", 50.0, 50.0);
        graph.entities.get_mut(&region).unwrap().name = "Mirefen".to_string();
        let spec: PlacementSpec = serde_json::from_str(
            r#"{"anchor": "bounds", "min_x": 40.0, "min_y": 40.0, "max_x": 60.0, "max_y": 60.0}"#,
        )
        .unwrap();
        let request = PlacementRequest {
            kind: &EntityKind::Location,
            culture: None,
            spec: &spec,
            anchors: vec![],
            avoid: vec![],
        };
        let outcome = graph.place(&request, &mut rng()).unwrap();
        assert_eq!(outcome.region_ids, vec![region]);
        assert_eq!(outcome.tags["region"], serde_json::json!("Mirefen"));
    }

    #[test]
    fn place_culture_region_matches_culture() {
        let mut graph = MemoryGraph::new();
        let mirefen = placed(&mut graph, EntityKind::Location, "region", 100.0, 100.0);
        graph.entities.get_mut(&mirefen).unwrap().culture = Some("mirefolk".to_string());
        let ashlands = placed(&mut graph, EntityKind::Location, "region", 900.0, 900.0);
        graph.entities.get_mut(&ashlands).unwrap().culture = Some("ashkin".to_string());

        let spec: PlacementSpec =
            serde_json::from_str(r#"{"anchor": "culture_region"}"#).unwrap();
        let request = PlacementRequest {
            kind: &EntityKind::Npc,
            culture: Some("ashkin"),
            spec: &spec,
            anchors: vec![],
            avoid: vec![],
        };
        let outcome = graph.place(&request, &mut rng()).unwrap();
        let (x, y) = outcome.position;
        assert!((x - 900.0).abs() <= ANCHOR_SCATTER + 1e-9);
        assert!((y - 900.0).abs() <= ANCHOR_SCATTER + 1e-9);
    }

    #[test]
    fn place_respects_spacing_or_fails() {
        let mut graph = MemoryGraph::new();
        let anchor = placed(&mut graph, EntityKind::Location, "shrine", 100.0, 100.0);
        // Avoided entity sits on the anchor; spacing larger than the scatter
        // radius makes every candidate too close.
        let crowd = placed(&mut graph, EntityKind::Npc, "", 100.0, 100.0);
        let spec: PlacementSpec = serde_json::from_str(
            r#"{"anchor": "entity", "entity": "$target", "max_distance": 5.0, "spacing": 50.0}"#,
        )
        .unwrap();
        let request = PlacementRequest {
            kind: &EntityKind::Npc,
            culture: None,
            spec: &spec,
            anchors: vec![anchor],
            avoid: vec![crowd],
        };
        assert!(graph.place(&request, &mut rng()).is_none());
    }
}
