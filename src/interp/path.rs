//! Multi-hop relationship traversal with constraint filtering, shared by
//! applicability rules and selection filters.

use std::collections::BTreeSet;

use super::context::ExecutionContext;
use crate::graph::view::GraphView;
use crate::model::template::{GraphPathAssertion, PathCheck, PathConstraint};

/// Walk the assertion's steps from `start` and test the check against the
/// constrained final frontier.
///
/// The step list length is unbounded; a frontier may fan out to many
/// entities per step. Step snapshots (`save_as`) are stored on the execution
/// context so constraints (and later rules) can reference them by name.
pub fn evaluate_path(
    start: u64,
    assertion: &GraphPathAssertion,
    ctx: &mut ExecutionContext,
) -> bool {
    let frontier = walk_constrained(start, assertion, ctx);
    match assertion.check {
        PathCheck::Exists => !frontier.is_empty(),
        PathCheck::NotExists => frontier.is_empty(),
        PathCheck::CountMin { count } => frontier.len() >= count as usize,
        PathCheck::CountMax { count } => frontier.len() <= count as usize,
    }
}

/// The final frontier after all steps and constraints.
pub fn walk_constrained(
    start: u64,
    assertion: &GraphPathAssertion,
    ctx: &mut ExecutionContext,
) -> BTreeSet<u64> {
    let mut frontier = BTreeSet::from([start]);
    for step in &assertion.steps {
        let mut next = BTreeSet::new();
        for &entity_id in &frontier {
            for neighbor in
                ctx.graph
                    .neighbors(entity_id, &step.relationship, step.direction, step.min_strength)
            {
                let Some(entity) = ctx.graph.entity(neighbor) else {
                    continue;
                };
                if entity.matches_filter(
                    step.target_kind.as_ref(),
                    step.target_subtype.as_deref(),
                    step.target_status.as_ref(),
                ) {
                    next.insert(neighbor);
                }
            }
        }
        if let Some(name) = &step.save_as {
            ctx.save_path_set(name, next.clone());
        }
        frontier = next;
        if frontier.is_empty() {
            break;
        }
    }

    for constraint in &assertion.constraints {
        frontier.retain(|&id| satisfies(id, start, constraint, ctx));
        if frontier.is_empty() {
            break;
        }
    }
    frontier
}

fn satisfies(id: u64, start: u64, constraint: &PathConstraint, ctx: &ExecutionContext) -> bool {
    match constraint {
        PathConstraint::NotIn { set } => !ctx.path_set(set).is_some_and(|s| s.contains(&id)),
        PathConstraint::In { set } => ctx.path_set(set).is_some_and(|s| s.contains(&id)),
        PathConstraint::NotSelf => id != start,
        PathConstraint::HasRelationship {
            relationship,
            other,
            direction,
        } => {
            let other_id = match other {
                Some(reference) => match ctx.resolve_entity(reference) {
                    Some(resolved) => Some(resolved),
                    // Unresolvable "other": nothing can have a
                    // relationship with it.
                    None => return false,
                },
                None => None,
            };
            ctx.graph.has_relationship(id, relationship, *direction, other_id)
        }
        PathConstraint::LacksRelationship {
            relationship,
            other,
            direction,
        } => {
            let other_id = match other {
                Some(reference) => match ctx.resolve_entity(reference) {
                    Some(resolved) => Some(resolved),
                    // Vacuously lacks a relationship with an unresolvable
                    // entity.
                    None => return true,
                },
                None => None,
            };
            !ctx.graph.has_relationship(id, relationship, *direction, other_id)
        }
        PathConstraint::KindEquals { kind } => {
            ctx.graph.entity(id).is_some_and(|e| e.kind == *kind)
        }
        PathConstraint::SubtypeEquals { subtype } => {
            ctx.graph.entity(id).is_some_and(|e| e.subtype == *subtype)
        }
    }
}
