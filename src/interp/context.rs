use std::collections::{BTreeMap, BTreeSet};

use rand::RngCore;

use super::result::Endpoint;
use crate::graph::view::GraphView;
use crate::model::refs::{EntityRef, PendingId};

/// Per-expansion scratch state: resolved variables, named path-sets from
/// graph traversal, the expansion target, the placeholder registry, plus the
/// graph view and RNG handles every evaluator draws on.
///
/// Bundled the way a tick context bundles world and RNG, so evaluator
/// signatures stay stable as state is added.
pub struct ExecutionContext<'a> {
    pub graph: &'a mut dyn GraphView,
    pub rng: &'a mut dyn RngCore,
    pub target: Option<u64>,
    vars: BTreeMap<String, Vec<u64>>,
    path_sets: BTreeMap<String, BTreeSet<u64>>,
    created_order: Vec<PendingId>,
    created_by_label: BTreeMap<String, Vec<PendingId>>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        graph: &'a mut dyn GraphView,
        rng: &'a mut dyn RngCore,
        target: Option<u64>,
    ) -> Self {
        Self {
            graph,
            rng,
            target,
            vars: BTreeMap::new(),
            path_sets: BTreeMap::new(),
            created_order: Vec::new(),
            created_by_label: BTreeMap::new(),
        }
    }

    pub fn set_var(&mut self, name: &str, ids: Vec<u64>) {
        self.vars.insert(name.to_string(), ids);
    }

    pub fn var(&self, name: &str) -> Option<&[u64]> {
        self.vars.get(name).map(Vec::as_slice)
    }

    pub fn save_path_set(&mut self, name: &str, ids: BTreeSet<u64>) {
        self.path_sets.insert(name.to_string(), ids);
    }

    pub fn path_set(&self, name: &str) -> Option<&BTreeSet<u64>> {
        self.path_sets.get(name)
    }

    /// Register a freshly created placeholder, optionally under its creation
    /// rule's label.
    pub fn register_created(&mut self, label: Option<&str>, pending: PendingId) {
        self.created_order.push(pending);
        if let Some(label) = label {
            self.created_by_label
                .entry(label.to_string())
                .or_default()
                .push(pending);
        }
    }

    pub fn created_count(&self) -> usize {
        self.created_order.len()
    }

    /// Placeholders created under a label, in creation order.
    pub fn created_for_label(&self, label: &str) -> &[PendingId] {
        self.created_by_label
            .get(label)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve a reference to a single existing entity. Placeholder
    /// references and unset variables resolve to None — a miss, not an
    /// error. Variables holding a list resolve to their first element.
    pub fn resolve_entity(&self, reference: &EntityRef) -> Option<u64> {
        match reference {
            EntityRef::Target => self.target,
            EntityRef::Var(name) => self.vars.get(name).and_then(|ids| ids.first().copied()),
            EntityRef::Entity(id) => self.graph.entity(*id).map(|e| e.id),
            EntityRef::Created(_) | EntityRef::Pending(_) => None,
        }
    }

    /// Resolve a reference to every existing entity it denotes.
    pub fn resolve_entity_list(&self, reference: &EntityRef) -> Vec<u64> {
        match reference {
            EntityRef::Target => self.target.into_iter().collect(),
            EntityRef::Var(name) => self.vars.get(name).cloned().unwrap_or_default(),
            EntityRef::Entity(id) => self.graph.entity(*id).map(|e| e.id).into_iter().collect(),
            EntityRef::Created(_) | EntityRef::Pending(_) => Vec::new(),
        }
    }

    /// Resolve a reference to relationship endpoints, which may include
    /// not-yet-committed placeholders.
    pub fn resolve_endpoints(&self, reference: &EntityRef) -> Vec<Endpoint> {
        match reference {
            EntityRef::Created(label) => self
                .created_for_label(label)
                .iter()
                .map(|p| Endpoint::Pending(*p))
                .collect(),
            EntityRef::Pending(p) => {
                if p.0 < self.created_order.len() {
                    vec![Endpoint::Pending(*p)]
                } else {
                    Vec::new()
                }
            }
            other => self
                .resolve_entity_list(other)
                .into_iter()
                .map(Endpoint::Existing)
                .collect(),
        }
    }

    /// Substitute `$name.property` placeholders in a string template.
    /// `$target.prop` reads the target; `$var.prop` reads the variable's
    /// first entity. Tokens that fail to resolve are left untouched.
    pub fn resolve_string(&self, text: &str) -> String {
        let bytes = text.as_bytes();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != b'$' {
                // Push the whole run up to the next '$'
                let start = i;
                while i < bytes.len() && bytes[i] != b'$' {
                    i += 1;
                }
                out.push_str(&text[start..i]);
                continue;
            }
            let token_start = i;
            i += 1;
            let name_start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let name = &text[name_start..i];
            if name.is_empty() || i >= bytes.len() || bytes[i] != b'.' {
                out.push_str(&text[token_start..i]);
                continue;
            }
            i += 1;
            let prop_start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let prop = &text[prop_start..i];
            let reference = if name == "target" {
                EntityRef::Target
            } else {
                EntityRef::Var(name.to_string())
            };
            let substituted = self
                .resolve_entity(&reference)
                .and_then(|id| self.graph.entity(id))
                .and_then(|e| e.property(prop));
            match substituted {
                Some(value) => out.push_str(&value),
                None => out.push_str(&text[token_start..i]),
            }
        }
        out
    }
}
