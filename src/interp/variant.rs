//! Post-hoc conditional overlay: after the base expansion, matching variants
//! may override subtypes, merge tags, and append relationships and state
//! updates based on world state at expansion time.

use rand::Rng;

use super::context::ExecutionContext;
use super::relationships::run_relationship_rules;
use super::result::{PartialEntity, RelationshipDraft};
use super::state_update::run_state_updates;
use crate::graph::view::GraphView;
use crate::model::refs::PendingId;
use crate::model::template::{Variant, VariantBlock, VariantCondition, VariantMode};

pub fn apply_variant_block(
    template_id: &str,
    block: &VariantBlock,
    entities: &mut [PartialEntity],
    drafts: &mut Vec<RelationshipDraft>,
    ctx: &mut ExecutionContext,
) {
    for variant in &block.variants {
        if !condition_holds(&variant.condition, ctx) {
            continue;
        }
        apply_variant(template_id, variant, entities, drafts, ctx);
        if block.mode == VariantMode::FirstMatch {
            break;
        }
    }
}

fn apply_variant(
    template_id: &str,
    variant: &Variant,
    entities: &mut [PartialEntity],
    drafts: &mut Vec<RelationshipDraft>,
    ctx: &mut ExecutionContext,
) {
    tracing::debug!(
        template = template_id,
        variant = variant.name.as_deref().unwrap_or("<unnamed>"),
        "variant matched"
    );
    for (label, subtype) in &variant.effects.subtype_overrides {
        for pending in labeled(ctx, label) {
            if let Some(entity) = entities.get_mut(pending.0) {
                entity.subtype = subtype.clone();
            }
        }
    }
    for (label, tags) in &variant.effects.tags {
        for pending in labeled(ctx, label) {
            if let Some(entity) = entities.get_mut(pending.0) {
                entity
                    .tags
                    .extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
    }
    drafts.extend(run_relationship_rules(&variant.effects.relationships, ctx));
    run_state_updates(template_id, &variant.effects.state_updates, ctx);
}

fn labeled(ctx: &ExecutionContext, label: &str) -> Vec<PendingId> {
    ctx.created_for_label(label).to_vec()
}

fn condition_holds(condition: &VariantCondition, ctx: &mut ExecutionContext) -> bool {
    match condition {
        VariantCondition::PressureRange { pressure, min, max } => {
            let value = ctx.graph.pressure(pressure);
            min.is_none_or(|floor| value >= floor) && max.is_none_or(|ceiling| value <= ceiling)
        }
        VariantCondition::PressureCompare { greater, lesser } => {
            ctx.graph.pressure(greater) > ctx.graph.pressure(lesser)
        }
        VariantCondition::EntityCountRange {
            kind,
            subtype,
            min,
            max,
        } => {
            let population =
                ctx.graph.count_entities(kind, subtype.as_deref(), None) as u32;
            min.is_none_or(|floor| population >= floor)
                && max.is_none_or(|ceiling| population <= ceiling)
        }
        VariantCondition::TagPresent { entity, tag, value } => ctx
            .resolve_entity(entity)
            .and_then(|id| ctx.graph.entity(id))
            .is_some_and(|e| e.has_tag(tag, value.as_ref())),
        VariantCondition::Chance { chance } => ctx.rng.random_bool(chance.clamp(0.0, 1.0)),
        VariantCondition::Always => true,
        VariantCondition::And { conditions } => {
            conditions.iter().all(|c| condition_holds(c, ctx))
        }
        VariantCondition::Or { conditions } => {
            conditions.iter().any(|c| condition_holds(c, ctx))
        }
    }
}
