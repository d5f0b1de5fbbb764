//! Orchestrates one template expansion — variable resolution, creation,
//! relationships, state updates, variant overlay — and exposes the
//! `can_apply` / `find_targets` / `expand` adapter the owning scheduler
//! drives.

use std::collections::BTreeMap;

use rand::RngCore;

use super::applicability::evaluate_all;
use super::context::ExecutionContext;
use super::creation::run_creation_rules;
use super::relationships::run_relationship_rules;
use super::result::{ExpansionResult, PartialEntity};
use super::selection::{apply_filters, apply_pick, find_candidates, select};
use super::state_update::run_state_updates;
use super::variant::apply_variant_block;
use crate::error::TemplateError;
use crate::graph::view::GraphView;
use crate::model::template::{Template, VariableDecl, VariableQuery};

/// Expand a template against a chosen target: resolve declared variables,
/// then run creations, relationships, state updates, and the variant overlay
/// in order. Graph mutations from state updates are applied immediately and
/// are not retracted if a later rule fails — committing (and rollback policy)
/// belongs to the caller.
pub fn expand(
    template: &Template,
    graph: &mut dyn GraphView,
    rng: &mut dyn RngCore,
    target: u64,
) -> Result<ExpansionResult, TemplateError> {
    let mut ctx = ExecutionContext::new(graph, rng, Some(target));
    resolve_variables(&template.variables, &mut ctx);

    let (mut entities, debug) = run_creation_rules(&template.id, &template.creations, &mut ctx)?;
    let mut relationships = run_relationship_rules(&template.relationships, &mut ctx);
    run_state_updates(&template.id, &template.state_updates, &mut ctx);
    if let Some(block) = &template.variants {
        apply_variant_block(&template.id, block, &mut entities, &mut relationships, &mut ctx);
    }

    Ok(ExpansionResult {
        description: summarize(&template.name, &entities),
        entities,
        relationships,
        debug,
    })
}

fn resolve_variables(variables: &[VariableDecl], ctx: &mut ExecutionContext) {
    for decl in variables {
        let candidates = match &decl.query {
            VariableQuery::Global {
                kind,
                subtype,
                status,
                filters,
                preferred,
            } => {
                let base: Vec<u64> = ctx
                    .graph
                    .entities_of_kind(kind)
                    .into_iter()
                    .filter(|id| {
                        ctx.graph.entity(*id).is_some_and(|e| {
                            e.matches_filter(None, subtype.as_deref(), status.as_ref())
                        })
                    })
                    .collect();
                let filtered = apply_filters(base, filters, ctx);
                if preferred.is_empty() {
                    filtered
                } else {
                    // Candidates passing the preferred sub-chain win; if none
                    // do, fall back to the full filtered set.
                    let favored = apply_filters(filtered.clone(), preferred, ctx);
                    if favored.is_empty() { filtered } else { favored }
                }
            }
            VariableQuery::Related {
                from,
                relationship,
                direction,
            } => match ctx.resolve_entity(from) {
                Some(id) => {
                    let mut ids = ctx.graph.neighbors(id, relationship, *direction, None);
                    ids.sort_unstable();
                    ids.dedup();
                    ids
                }
                None => Vec::new(),
            },
        };
        let mut picked = apply_pick(candidates, decl.pick, ctx);
        if picked.is_empty()
            && let Some(fallback) = &decl.fallback
        {
            picked = ctx.resolve_entity_list(fallback);
        }
        if picked.is_empty() {
            tracing::debug!(variable = decl.name.as_str(), "variable resolved to no entities");
        }
        ctx.set_var(&decl.name, picked);
    }
}

/// Human-readable one-line summary of what an expansion produced.
fn summarize(template_name: &str, entities: &[PartialEntity]) -> String {
    if entities.is_empty() {
        return template_name.to_string();
    }
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for entity in entities {
        let key = if entity.subtype.is_empty() {
            entity.kind.as_str().to_string()
        } else {
            format!("{} ({})", entity.kind.as_str(), entity.subtype)
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    let parts: Vec<String> = counts
        .into_iter()
        .map(|(key, n)| format!("{n} {key}"))
        .collect();
    format!("{template_name}: created {}", parts.join(", "))
}

/// The operations the external scheduler drives, built from one template
/// document. The scheduler calls `can_apply`, then `find_targets`, then
/// `expand` once per chosen target per tick.
pub struct TemplateAdapter {
    template: Template,
}

impl TemplateAdapter {
    pub fn new(template: Template) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Applicability rules AND a nonempty selection. Selection constraints
    /// are deliberately not duplicated into applicability rules; an
    /// applicable template with no candidates must not fire.
    pub fn can_apply(&self, graph: &mut dyn GraphView, rng: &mut dyn RngCore) -> bool {
        let mut ctx = ExecutionContext::new(graph, rng, None);
        evaluate_all(&self.template.applicability, &self.template.id, &mut ctx)
            && !find_candidates(&self.template.selection, &mut ctx).is_empty()
    }

    pub fn find_targets(&self, graph: &mut dyn GraphView, rng: &mut dyn RngCore) -> Vec<u64> {
        let mut ctx = ExecutionContext::new(graph, rng, None);
        select(&self.template.selection, &mut ctx)
    }

    pub fn expand(
        &self,
        graph: &mut dyn GraphView,
        rng: &mut dyn RngCore,
        target: u64,
    ) -> Result<ExpansionResult, TemplateError> {
        expand(&self.template, graph, rng, target)
    }
}
