//! Boolean rule-tree evaluation deciding whether a template may fire.

use rand::Rng;

use super::context::ExecutionContext;
use super::path::evaluate_path;
use crate::graph::view::GraphView;
use crate::model::entity::{EntityKind, EntityStatus};
use crate::model::template::ApplicabilityRule;

/// Chance of firing anyway when a pressure sits above its extreme ceiling.
const DEFAULT_EXTREME_CHANCE: f64 = 0.3;
/// Entity-count ceilings tolerate this much overshoot of the configured
/// distribution target.
const COUNT_OVERSHOOT_FACTOR: f64 = 1.5;

/// AND-evaluate a rule list; an empty list always passes.
pub fn evaluate_all(
    rules: &[ApplicabilityRule],
    template_id: &str,
    ctx: &mut ExecutionContext,
) -> bool {
    rules.iter().all(|rule| evaluate(rule, template_id, ctx))
}

pub fn evaluate(rule: &ApplicabilityRule, template_id: &str, ctx: &mut ExecutionContext) -> bool {
    match rule {
        ApplicabilityRule::PressureThreshold {
            pressure,
            min,
            max,
            extreme_chance,
        } => {
            let value = ctx.graph.pressure(pressure);
            if value < *min {
                return false;
            }
            match max {
                Some(ceiling) if value > *ceiling => {
                    let chance = extreme_chance.unwrap_or(DEFAULT_EXTREME_CHANCE);
                    ctx.rng.random_bool(chance.clamp(0.0, 1.0))
                }
                _ => true,
            }
        }
        ApplicabilityRule::PressureAnyAbove {
            pressures,
            threshold,
        } => pressures.iter().any(|p| ctx.graph.pressure(p) > *threshold),
        ApplicabilityRule::PressureCompare { greater, lesser } => {
            ctx.graph.pressure(greater) > ctx.graph.pressure(lesser)
        }
        ApplicabilityRule::EntityCountMin {
            kind,
            subtype,
            status,
            min,
        } => count(ctx, kind, subtype.as_deref(), status.as_ref()) >= *min as usize,
        ApplicabilityRule::EntityCountMax {
            kind,
            subtype,
            status,
            max,
        } => {
            let population = count(ctx, kind, subtype.as_deref(), status.as_ref());
            (population as f64) < count_ceiling(ctx, kind, subtype.as_deref(), *max)
        }
        ApplicabilityRule::EraMatch { eras } => eras.contains(&ctx.graph.current_era()),
        ApplicabilityRule::RandomChance { chance } => {
            ctx.rng.random_bool(chance.clamp(0.0, 1.0))
        }
        ApplicabilityRule::CooldownElapsed { ticks } => {
            match ctx.graph.last_creation_tick(template_id) {
                Some(last) => ctx.graph.current_tick().saturating_sub(last) >= *ticks,
                None => true,
            }
        }
        ApplicabilityRule::CreationsPerEpoch { max } => {
            ctx.graph.creations_this_epoch(template_id) < *max
        }
        ApplicabilityRule::TagExists {
            tag,
            value,
            kind,
            subtype,
            min_count,
        } => {
            tagged_count(ctx, tag, value.as_ref(), kind.as_ref(), subtype.as_deref())
                >= *min_count as usize
        }
        ApplicabilityRule::TagAbsent {
            tag,
            value,
            kind,
            subtype,
        } => tagged_count(ctx, tag, value.as_ref(), kind.as_ref(), subtype.as_deref()) == 0,
        ApplicabilityRule::And { rules } => {
            rules.iter().all(|r| evaluate(r, template_id, ctx))
        }
        ApplicabilityRule::Or { rules } => {
            rules.iter().any(|r| evaluate(r, template_id, ctx))
        }
        ApplicabilityRule::GraphPath {
            start_kind,
            start_subtype,
            start_status,
            path,
        } => {
            let starts: Vec<u64> = ctx
                .graph
                .entity_ids()
                .into_iter()
                .filter(|id| {
                    ctx.graph.entity(*id).is_some_and(|e| {
                        e.matches_filter(
                            Some(start_kind),
                            start_subtype.as_deref(),
                            start_status.as_ref(),
                        )
                    })
                })
                .collect();
            starts.into_iter().any(|start| evaluate_path(start, path, ctx))
        }
    }
}

/// Render a human-readable reason why a rule deterministically fails right
/// now, or None when it passes (or could pass — chance-gated rules never
/// report a failure). Tooling aid; evaluation never consults it.
pub fn describe_failure(
    rule: &ApplicabilityRule,
    template_id: &str,
    ctx: &mut ExecutionContext,
) -> Option<String> {
    match rule {
        ApplicabilityRule::PressureThreshold { pressure, min, .. } => {
            let value = ctx.graph.pressure(pressure);
            (value < *min)
                .then(|| format!("pressure {pressure} at {value:.2} is below minimum {min:.2}"))
        }
        ApplicabilityRule::PressureAnyAbove {
            pressures,
            threshold,
        } => {
            if pressures.iter().any(|p| ctx.graph.pressure(p) > *threshold) {
                None
            } else {
                Some(format!(
                    "no pressure of {pressures:?} exceeds {threshold:.2}"
                ))
            }
        }
        ApplicabilityRule::PressureCompare { greater, lesser } => {
            let a = ctx.graph.pressure(greater);
            let b = ctx.graph.pressure(lesser);
            (a <= b).then(|| {
                format!("pressure {greater} at {a:.2} does not exceed {lesser} at {b:.2}")
            })
        }
        ApplicabilityRule::EntityCountMin {
            kind,
            subtype,
            status,
            min,
        } => {
            let population = count(ctx, kind, subtype.as_deref(), status.as_ref());
            (population < *min as usize).then(|| {
                format!("only {population} {} entities, need {min}", kind.as_str())
            })
        }
        ApplicabilityRule::EntityCountMax {
            kind,
            subtype,
            status,
            max,
        } => {
            let population = count(ctx, kind, subtype.as_deref(), status.as_ref());
            let ceiling = count_ceiling(ctx, kind, subtype.as_deref(), *max);
            ((population as f64) >= ceiling).then(|| {
                format!(
                    "{population} {} entities meets the ceiling {ceiling:.0}",
                    kind.as_str()
                )
            })
        }
        ApplicabilityRule::EraMatch { eras } => {
            let era = ctx.graph.current_era();
            (!eras.contains(&era)).then(|| format!("era {era:?} not in {eras:?}"))
        }
        ApplicabilityRule::RandomChance { .. } => None,
        ApplicabilityRule::CooldownElapsed { ticks } => {
            let last = ctx.graph.last_creation_tick(template_id)?;
            let elapsed = ctx.graph.current_tick().saturating_sub(last);
            (elapsed < *ticks)
                .then(|| format!("only {elapsed} ticks since last creation, need {ticks}"))
        }
        ApplicabilityRule::CreationsPerEpoch { max } => {
            let used = ctx.graph.creations_this_epoch(template_id);
            (used >= *max).then(|| format!("{used} creations this epoch reaches the cap {max}"))
        }
        ApplicabilityRule::TagExists {
            tag,
            value,
            kind,
            subtype,
            min_count,
        } => {
            let found = tagged_count(ctx, tag, value.as_ref(), kind.as_ref(), subtype.as_deref());
            (found < *min_count as usize)
                .then(|| format!("tag {tag:?} found on {found} entities, need {min_count}"))
        }
        ApplicabilityRule::TagAbsent {
            tag,
            value,
            kind,
            subtype,
        } => {
            let found = tagged_count(ctx, tag, value.as_ref(), kind.as_ref(), subtype.as_deref());
            (found > 0).then(|| format!("tag {tag:?} present on {found} entities"))
        }
        ApplicabilityRule::And { rules } => rules
            .iter()
            .find_map(|r| describe_failure(r, template_id, ctx)),
        ApplicabilityRule::Or { rules } => {
            let reasons: Vec<String> = rules
                .iter()
                .map(|r| describe_failure(r, template_id, ctx))
                .collect::<Option<Vec<_>>>()?;
            Some(format!("no alternative holds: {}", reasons.join("; ")))
        }
        ApplicabilityRule::GraphPath { start_kind, .. } => {
            if evaluate(rule, template_id, ctx) {
                None
            } else {
                Some(format!(
                    "no {} entity satisfies the graph path",
                    start_kind.as_str()
                ))
            }
        }
    }
}

fn count(
    ctx: &ExecutionContext,
    kind: &EntityKind,
    subtype: Option<&str>,
    status: Option<&EntityStatus>,
) -> usize {
    ctx.graph.count_entities(kind, subtype, status)
}

fn count_ceiling(
    ctx: &ExecutionContext,
    kind: &EntityKind,
    subtype: Option<&str>,
    literal_max: u32,
) -> f64 {
    let target = ctx
        .graph
        .distribution_target(kind, subtype)
        .unwrap_or(literal_max);
    target as f64 * COUNT_OVERSHOOT_FACTOR
}

fn tagged_count(
    ctx: &ExecutionContext,
    tag: &str,
    value: Option<&serde_json::Value>,
    kind: Option<&EntityKind>,
    subtype: Option<&str>,
) -> usize {
    ctx.graph
        .entity_ids()
        .into_iter()
        .filter_map(|id| ctx.graph.entity(id))
        .filter(|e| e.matches_filter(kind, subtype, None))
        .filter(|e| e.has_tag(tag, value))
        .count()
}
