//! Strategy-based candidate search plus filter chain and pick policy:
//! decides which entity(ies) a template acts on.

use std::collections::BTreeSet;

use rand::Rng;

use super::context::ExecutionContext;
use super::path::evaluate_path;
use crate::graph::view::GraphView;
use crate::model::entity::EntityStatus;
use crate::model::relationship::Direction;
use crate::model::template::{PickPolicy, SelectionFilter, SelectionRule, SelectionStrategy};

const DEFAULT_PROXIMITY_RADIUS: f64 = 50.0;

/// Run the full selection pipeline: strategy, status filter, filter chain,
/// cap, pick policy.
pub fn select(rule: &SelectionRule, ctx: &mut ExecutionContext) -> Vec<u64> {
    let mut candidates = find_candidates(rule, ctx);
    if let Some(limit) = rule.limit {
        candidates.truncate(limit);
    }
    apply_pick(candidates, rule.pick, ctx)
}

/// Candidates surviving the strategy, status filter, and filter chain, in
/// ascending id order (before any cap or pick).
pub fn find_candidates(rule: &SelectionRule, ctx: &mut ExecutionContext) -> Vec<u64> {
    let candidates = strategy_candidates(&rule.strategy, ctx);
    let candidates = apply_status_filter(candidates, rule.status.as_ref(), ctx);
    apply_filters(candidates, &rule.filters, ctx)
}

pub fn apply_pick(candidates: Vec<u64>, pick: PickPolicy, ctx: &mut ExecutionContext) -> Vec<u64> {
    match pick {
        PickPolicy::All => candidates,
        PickPolicy::First => candidates.into_iter().take(1).collect(),
        PickPolicy::Random => {
            if candidates.is_empty() {
                candidates
            } else {
                let index = ctx.rng.random_range(0..candidates.len());
                vec![candidates[index]]
            }
        }
    }
}

pub fn apply_status_filter(
    candidates: Vec<u64>,
    status: Option<&EntityStatus>,
    ctx: &ExecutionContext,
) -> Vec<u64> {
    let Some(status) = status else {
        return candidates;
    };
    candidates
        .into_iter()
        .filter(|id| {
            ctx.graph
                .entity(*id)
                .is_some_and(|e| e.matches_filter(None, None, Some(status)))
        })
        .collect()
}

pub fn apply_filters(
    candidates: Vec<u64>,
    filters: &[SelectionFilter],
    ctx: &mut ExecutionContext,
) -> Vec<u64> {
    let mut kept = candidates;
    for filter in filters {
        kept = kept
            .into_iter()
            .filter(|id| passes_filter(*id, filter, ctx))
            .collect();
        if kept.is_empty() {
            break;
        }
    }
    kept
}

fn strategy_candidates(strategy: &SelectionStrategy, ctx: &mut ExecutionContext) -> Vec<u64> {
    match strategy {
        SelectionStrategy::ByKind { kind, subtypes } => {
            let ids = ctx.graph.entities_of_kind(kind);
            if subtypes.is_empty() {
                return ids;
            }
            ids.into_iter()
                .filter(|id| {
                    ctx.graph
                        .entity(*id)
                        .is_some_and(|e| subtypes.contains(&e.subtype))
                })
                .collect()
        }
        SelectionStrategy::ByPreferenceOrder { kind, preference } => {
            let ids = ctx.graph.entities_of_kind(kind);
            for subtype in preference {
                let matching: Vec<u64> = ids
                    .iter()
                    .copied()
                    .filter(|id| {
                        ctx.graph
                            .entity(*id)
                            .is_some_and(|e| e.subtype == *subtype)
                    })
                    .collect();
                if !matching.is_empty() {
                    return matching;
                }
            }
            ids
        }
        SelectionStrategy::ByRelationship {
            kind,
            relationship,
            direction,
            present,
        } => ctx
            .graph
            .entities_of_kind(kind)
            .into_iter()
            .filter(|id| {
                ctx.graph.has_relationship(*id, relationship, *direction, None) == *present
            })
            .collect(),
        SelectionStrategy::ByProximity {
            kind,
            reference,
            radius,
        } => {
            let Some(center) = ctx
                .resolve_entity(reference)
                .and_then(|id| ctx.graph.entity(id))
                .and_then(|e| e.position)
            else {
                return Vec::new();
            };
            let radius = radius.unwrap_or(DEFAULT_PROXIMITY_RADIUS);
            ctx.graph
                .entities_of_kind(kind)
                .into_iter()
                .filter(|id| {
                    // Entities lacking coordinates are excluded.
                    ctx.graph
                        .entity(*id)
                        .and_then(|e| e.position)
                        .is_some_and(|(x, y)| {
                            ((x - center.0).powi(2) + (y - center.1).powi(2)).sqrt() <= radius
                        })
                })
                .collect()
        }
        SelectionStrategy::ByProminence {
            kind,
            min_prominence,
        } => ctx
            .graph
            .entities_of_kind(kind)
            .into_iter()
            .filter(|id| {
                ctx.graph
                    .entity(*id)
                    .is_some_and(|e| e.prominence >= *min_prominence)
            })
            .collect(),
    }
}

fn passes_filter(id: u64, filter: &SelectionFilter, ctx: &mut ExecutionContext) -> bool {
    match filter {
        SelectionFilter::Exclude { refs } => !refs
            .iter()
            .flat_map(|r| ctx.resolve_entity_list(r))
            .any(|excluded| excluded == id),
        SelectionFilter::HasRelationship {
            relationship,
            other,
            direction,
        } => {
            let other_id = match other {
                Some(reference) => match ctx.resolve_entity(reference) {
                    Some(resolved) => Some(resolved),
                    None => return false,
                },
                None => None,
            };
            ctx.graph.has_relationship(id, relationship, *direction, other_id)
        }
        SelectionFilter::LacksRelationship {
            relationship,
            other,
            direction,
        } => {
            let other_id = match other {
                Some(reference) => match ctx.resolve_entity(reference) {
                    Some(resolved) => Some(resolved),
                    None => return true,
                },
                None => None,
            };
            !ctx.graph.has_relationship(id, relationship, *direction, other_id)
        }
        SelectionFilter::HasTag { tag, value } => ctx
            .graph
            .entity(id)
            .is_some_and(|e| e.has_tag(tag, value.as_ref())),
        SelectionFilter::HasAnyTag { tags } => ctx
            .graph
            .entity(id)
            .is_some_and(|e| tags.iter().any(|t| e.tags.contains_key(t))),
        SelectionFilter::SharesRelated {
            relationship,
            reference,
        } => {
            let Some(ref_id) = ctx.resolve_entity(reference) else {
                return false;
            };
            let shared: BTreeSet<u64> = ctx
                .graph
                .neighbors(ref_id, relationship, Direction::Out, None)
                .into_iter()
                .collect();
            ctx.graph
                .neighbors(id, relationship, Direction::Out, None)
                .into_iter()
                .any(|target| shared.contains(&target))
        }
        SelectionFilter::GraphPath { path } => evaluate_path(id, path, ctx),
    }
}
