//! Loading and indexing template documents. Templates travel as JSON; the
//! library validates structure at parse time and rejects duplicate ids.

use std::collections::BTreeMap;

use crate::error::TemplateError;
use crate::model::template::Template;

#[derive(Debug, Default)]
pub struct TemplateLibrary {
    templates: Vec<Template>,
    by_id: BTreeMap<String, usize>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a library from already-parsed templates, rejecting duplicates.
    pub fn from_templates(templates: Vec<Template>) -> Result<Self, TemplateError> {
        let mut library = Self::new();
        for template in templates {
            library.add(template)?;
        }
        Ok(library)
    }

    /// Parse a JSON array of template documents.
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        let templates: Vec<Template> = serde_json::from_str(json)?;
        Self::from_templates(templates)
    }

    pub fn add(&mut self, template: Template) -> Result<(), TemplateError> {
        if self.by_id.contains_key(&template.id) {
            return Err(TemplateError::DuplicateTemplateId {
                id: template.id.clone(),
            });
        }
        self.by_id.insert(template.id.clone(), self.templates.len());
        self.templates.push(template);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.by_id.get(id).map(|&index| &self.templates[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
