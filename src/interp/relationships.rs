//! Resolves relationship rules into drafts: condition gating, endpoint
//! resolution (existing entities, variables, or placeholders), cross-product
//! expansion, and bidirectional mirroring.

use rand::Rng;

use super::context::ExecutionContext;
use super::result::RelationshipDraft;
use crate::graph::view::GraphView;
use crate::model::template::{RelationCondition, RelationshipRule};

pub fn run_relationship_rules(
    rules: &[RelationshipRule],
    ctx: &mut ExecutionContext,
) -> Vec<RelationshipDraft> {
    let mut drafts = Vec::new();
    for rule in rules {
        run_rule(rule, ctx, &mut drafts);
    }
    drafts
}

pub fn run_rule(
    rule: &RelationshipRule,
    ctx: &mut ExecutionContext,
    drafts: &mut Vec<RelationshipDraft>,
) {
    if let Some(condition) = &rule.condition
        && !condition_holds(condition, ctx)
    {
        return;
    }

    let sources = ctx.resolve_endpoints(&rule.source);
    let dests = ctx.resolve_endpoints(&rule.dest);
    let catalyst = rule
        .catalyst
        .as_ref()
        .and_then(|r| ctx.resolve_endpoints(r).into_iter().next());

    for &source in &sources {
        for &dest in &dests {
            if source == dest {
                continue;
            }
            drafts.push(RelationshipDraft {
                source,
                dest,
                kind: rule.kind.clone(),
                strength: rule.strength,
                distance: rule.distance,
                catalyst,
            });
            if rule.bidirectional {
                drafts.push(RelationshipDraft {
                    source: dest,
                    dest: source,
                    kind: rule.kind.clone(),
                    strength: rule.strength,
                    distance: rule.distance,
                    catalyst,
                });
            }
        }
    }
}

fn condition_holds(condition: &RelationCondition, ctx: &mut ExecutionContext) -> bool {
    match condition {
        RelationCondition::Chance { chance } => ctx.rng.random_bool(chance.clamp(0.0, 1.0)),
        RelationCondition::Exists { entity } => !ctx.resolve_endpoints(entity).is_empty(),
        RelationCondition::HasRelationship {
            entity,
            relationship,
            direction,
        } => ctx
            .resolve_entity(entity)
            .is_some_and(|id| ctx.graph.has_relationship(id, relationship, *direction, None)),
    }
}
