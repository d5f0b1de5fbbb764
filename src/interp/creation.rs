//! Expands creation rules into partial entities: count resolution, subtype/
//! culture/description specs, and placement delegation with a uniform-random
//! fallback.

use rand::Rng;

use super::context::ExecutionContext;
use super::result::{CreationDebug, PartialEntity};
use crate::error::TemplateError;
use crate::graph::view::{GraphView, PlacementRequest};
use crate::model::entity::{EntityStatus, Prominence};
use crate::model::refs::PendingId;
use crate::model::template::{
    Count, CreationRule, CultureSpec, DescriptionSpec, PlacementAnchor, SubtypeFallback,
    SubtypeSpec,
};

pub fn run_creation_rules(
    template_id: &str,
    rules: &[CreationRule],
    ctx: &mut ExecutionContext,
) -> Result<(Vec<PartialEntity>, Vec<CreationDebug>), TemplateError> {
    let mut entities = Vec::new();
    let mut debug = Vec::new();
    for (rule_index, rule) in rules.iter().enumerate() {
        let count = resolve_count(template_id, rule_index, rule.count, ctx)?;
        for _ in 0..count {
            let (subtype, strategy) = resolve_subtype(rule.subtype.as_ref(), ctx);
            let culture =
                resolve_culture(template_id, rule_index, rule.culture.as_ref(), ctx)?;
            let description = resolve_description(rule.description.as_ref(), ctx);

            let mut tags = rule.tags.clone();
            let mut position = None;
            let mut region_ids = Vec::new();
            let mut placement_debug = None;
            if let Some(spec) = &rule.placement {
                let request = PlacementRequest {
                    kind: &rule.kind,
                    culture: culture.as_deref(),
                    spec,
                    anchors: resolve_anchors(spec, ctx),
                    avoid: spec
                        .avoid
                        .iter()
                        .flat_map(|r| ctx.resolve_entity_list(r))
                        .collect(),
                };
                match ctx.graph.place(&request, ctx.rng) {
                    Some(outcome) => {
                        position = Some(outcome.position);
                        region_ids = outcome.region_ids;
                        placement_debug = outcome.debug;
                        // Placement-derived tags win over template literals.
                        tags.extend(outcome.tags);
                    }
                    None => {
                        let point = random_fallback_point(ctx);
                        tracing::warn!(
                            template = template_id,
                            rule = rule_index,
                            "placement delegate failed, using random fallback point"
                        );
                        position = Some(point);
                        placement_debug = Some("random fallback".to_string());
                    }
                }
            }

            let placeholder = PendingId(ctx.created_count());
            ctx.register_created(rule.label.as_deref(), placeholder);
            entities.push(PartialEntity {
                placeholder,
                kind: rule.kind.clone(),
                subtype,
                culture,
                description,
                status: EntityStatus::Active,
                prominence: Prominence::default(),
                tags,
                position,
                region_ids,
            });
            debug.push(CreationDebug {
                placeholder,
                rule_index,
                strategy,
                placement: placement_debug,
            });
        }
    }
    Ok((entities, debug))
}

fn resolve_count(
    template_id: &str,
    rule_index: usize,
    count: Count,
    ctx: &mut ExecutionContext,
) -> Result<u32, TemplateError> {
    match count {
        Count::Fixed(n) => Ok(n),
        Count::Range { min, max } => {
            if min > max {
                return Err(TemplateError::InvalidCountRange {
                    template: template_id.to_string(),
                    rule: rule_index,
                    min,
                    max,
                });
            }
            Ok(ctx.rng.random_range(min..=max))
        }
    }
}

/// Resolve the subtype and a short strategy note for debug metadata.
fn resolve_subtype(spec: Option<&SubtypeSpec>, ctx: &mut ExecutionContext) -> (String, String) {
    match spec {
        None => (String::new(), "default".to_string()),
        Some(SubtypeSpec::Literal { value }) => (value.clone(), "literal".to_string()),
        Some(SubtypeSpec::Inherit {
            from,
            chance,
            fallback,
        }) => {
            let inherited = ctx
                .resolve_entity(from)
                .and_then(|id| ctx.graph.entity(id))
                .map(|e| e.subtype.clone());
            let gate = chance.unwrap_or(1.0).clamp(0.0, 1.0);
            if let Some(subtype) = inherited
                && ctx.rng.random_bool(gate)
            {
                return (subtype, "inherited".to_string());
            }
            match fallback {
                Some(SubtypeFallback::Literal { value }) => {
                    (value.clone(), "fallback:literal".to_string())
                }
                Some(SubtypeFallback::RandomFromDomain { options }) => {
                    (pick_option(options, ctx), "fallback:domain".to_string())
                }
                None => (String::new(), "fallback:none".to_string()),
            }
        }
        Some(SubtypeSpec::FromPressure { map }) => {
            let best = map.iter().max_by(|a, b| {
                ctx.graph
                    .pressure(&a.pressure)
                    .total_cmp(&ctx.graph.pressure(&b.pressure))
            });
            match best {
                Some(entry) => (
                    entry.subtype.clone(),
                    format!("pressure:{}", entry.pressure),
                ),
                None => (String::new(), "pressure:none".to_string()),
            }
        }
        Some(SubtypeSpec::Random { options }) => (pick_option(options, ctx), "random".to_string()),
    }
}

fn pick_option(options: &[String], ctx: &mut ExecutionContext) -> String {
    if options.is_empty() {
        return String::new();
    }
    options[ctx.rng.random_range(0..options.len())].clone()
}

/// A spec with neither `inherit` nor `fixed` is an authoring mistake and
/// aborts the expansion; an unresolvable `inherit` reference falls through to
/// `fixed` and then to no culture.
fn resolve_culture(
    template_id: &str,
    rule_index: usize,
    spec: Option<&CultureSpec>,
    ctx: &ExecutionContext,
) -> Result<Option<String>, TemplateError> {
    let Some(spec) = spec else {
        return Ok(None);
    };
    if spec.inherit.is_none() && spec.fixed.is_none() {
        return Err(TemplateError::InvalidCultureSpec {
            template: template_id.to_string(),
            rule: rule_index,
        });
    }
    if let Some(reference) = &spec.inherit
        && let Some(culture) = ctx
            .resolve_entity(reference)
            .and_then(|id| ctx.graph.entity(id))
            .and_then(|e| e.culture.clone())
    {
        return Ok(Some(culture));
    }
    Ok(spec.fixed.clone())
}

fn resolve_description(spec: Option<&DescriptionSpec>, ctx: &ExecutionContext) -> String {
    match spec {
        None => String::new(),
        Some(DescriptionSpec::Literal { text }) => text.clone(),
        Some(DescriptionSpec::Template { text }) => ctx.resolve_string(text),
    }
}

fn resolve_anchors(
    spec: &crate::model::template::PlacementSpec,
    ctx: &ExecutionContext,
) -> Vec<u64> {
    match &spec.anchor {
        PlacementAnchor::Entity { entity } => ctx.resolve_entity_list(entity),
        PlacementAnchor::Centroid { refs } => refs
            .iter()
            .flat_map(|r| ctx.resolve_entity_list(r))
            .collect(),
        PlacementAnchor::CultureRegion { .. }
        | PlacementAnchor::Bounds { .. }
        | PlacementAnchor::SparseArea => Vec::new(),
    }
}

fn random_fallback_point(ctx: &mut ExecutionContext) -> (f64, f64) {
    let (min_x, min_y, max_x, max_y) = ctx.graph.world_bounds();
    (
        ctx.rng.random_range(min_x..=max_x),
        ctx.rng.random_range(min_y..=max_y),
    )
}
