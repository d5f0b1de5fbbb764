//! Direct, side-effect-only mutations against the graph view. Failures to
//! resolve a referenced entity skip the update; they never abort the
//! expansion.

use super::context::ExecutionContext;
use crate::graph::view::GraphView;
use crate::model::template::StateUpdateRule;

pub fn run_state_updates(
    template_id: &str,
    updates: &[StateUpdateRule],
    ctx: &mut ExecutionContext,
) {
    for update in updates {
        apply(template_id, update, ctx);
    }
}

fn apply(template_id: &str, update: &StateUpdateRule, ctx: &mut ExecutionContext) {
    match update {
        StateUpdateRule::RateLimitBump => {
            ctx.graph.record_creation(template_id);
        }
        StateUpdateRule::ArchiveRelationship { source, dest, kind } => {
            let (Some(source_id), Some(dest_id)) =
                (ctx.resolve_entity(source), ctx.resolve_entity(dest))
            else {
                tracing::debug!(template = template_id, "archive skipped: endpoint unresolved");
                return;
            };
            if !ctx.graph.archive_relationship(source_id, dest_id, kind) {
                tracing::debug!(
                    template = template_id,
                    source = source_id,
                    dest = dest_id,
                    "archive skipped: no live relationship"
                );
            }
        }
        StateUpdateRule::PressureDelta { pressure, delta } => {
            ctx.graph.adjust_pressure(pressure, *delta);
        }
        StateUpdateRule::SetStatus { entity, status } => {
            match ctx.resolve_entity(entity) {
                Some(id) => {
                    ctx.graph.set_status(id, status.clone());
                }
                None => tracing::debug!(
                    template = template_id,
                    "status update skipped: entity unresolved"
                ),
            }
        }
        StateUpdateRule::SetTag { entity, tag, value } => {
            match ctx.resolve_entity(entity) {
                Some(id) => {
                    ctx.graph.set_tag(id, tag, value.clone());
                }
                None => tracing::debug!(
                    template = template_id,
                    tag = tag.as_str(),
                    "tag update skipped: entity unresolved"
                ),
            }
        }
        StateUpdateRule::RemoveTag { entity, tag } => {
            match ctx.resolve_entity(entity) {
                Some(id) => {
                    ctx.graph.remove_tag(id, tag);
                }
                None => tracing::debug!(
                    template = template_id,
                    tag = tag.as_str(),
                    "tag removal skipped: entity unresolved"
                ),
            }
        }
    }
}
