//! Template id to report builder lookup

use std::collections::BTreeMap;

use xlreport_core::TemplateId;

use crate::builder::ReportBuilder;
use crate::catalog;

/// Registered report builders, keyed by template id.
#[derive(Default)]
pub struct ReportRegistry {
    builders: BTreeMap<TemplateId, Box<dyn ReportBuilder>>,
}

impl ReportRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every report in the standard catalog.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for builder in catalog::standard_reports() {
            registry.register(builder);
        }
        registry
    }

    /// Add a builder, returning the one it replaces.
    pub fn register(&mut self, builder: Box<dyn ReportBuilder>) -> Option<Box<dyn ReportBuilder>> {
        self.builders.insert(builder.template_id(), builder)
    }

    pub fn get(&self, id: TemplateId) -> Option<&dyn ReportBuilder> {
        self.builders.get(&id).map(|b| b.as_ref())
    }

    pub fn contains(&self, id: TemplateId) -> bool {
        self.builders.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = TemplateId> + '_ {
        self.builders.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ReportBuilder> {
        self.builders.values().map(|b| b.as_ref())
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

impl std::fmt::Debug for ReportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportRegistry")
            .field("templates", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}
