//! The `ReportBuilder` trait and its standard implementations

use bson::{Bson, Document};
use xlreport_core::{Params, Query, TemplateId, ValidationError};
use xlreport_render::{FilterSummary, WorksheetTemplate};

use crate::definition::{Filters, ReportDefinition};

/// One report type.
///
/// Every step has a default derived from [`ReportBuilder::definition`];
/// a report only overrides the step that differs.
pub trait ReportBuilder: Send + Sync {
    /// Static description of this report.
    fn definition(&self) -> &ReportDefinition;

    fn template_id(&self) -> TemplateId {
        self.definition().template_id
    }

    fn name(&self) -> &str {
        self.definition().name
    }

    /// Check parameters before any query runs.
    fn validate(&self, params: &Params) -> Result<Filters, ValidationError> {
        self.definition().validate(params)
    }

    fn query(&self, filters: &Filters) -> Query {
        self.definition().query(filters)
    }

    /// Post-process fetched records. Identity by default.
    fn shape(&self, records: Vec<Document>, _filters: &Filters) -> Vec<Document> {
        records
    }

    fn summary(&self, filters: &Filters) -> FilterSummary {
        self.definition().summary(filters)
    }

    fn template(&self) -> WorksheetTemplate {
        self.definition().template()
    }

    fn audit_filters(&self, filters: &Filters) -> Document {
        self.definition().audit_filters(filters)
    }
}

/// A report fully described by its definition.
#[derive(Clone, Debug)]
pub struct DefinedReport {
    definition: ReportDefinition,
}

impl DefinedReport {
    pub fn new(definition: ReportDefinition) -> Self {
        Self { definition }
    }
}

impl ReportBuilder for DefinedReport {
    fn definition(&self) -> &ReportDefinition {
        &self.definition
    }
}

// ============================================================================
// Approval rows
// ============================================================================

/// Emits one row per approval entry.
///
/// Records carry an `approve` array of `{approval_type, approved_by, ...}`
/// sub-documents. Each entry is flattened onto a copy of the parent record.
/// When the `approval_type` filter is set, only matching entries are kept.
#[derive(Clone, Debug)]
pub struct ApprovalReport {
    definition: ReportDefinition,
    array_field: &'static str,
    type_param: &'static str,
}

impl ApprovalReport {
    pub fn new(definition: ReportDefinition, array_field: &'static str, type_param: &'static str) -> Self {
        Self {
            definition,
            array_field,
            type_param,
        }
    }

    fn flatten(&self, record: &Document, wanted: Option<&str>) -> Vec<Document> {
        let entries: Vec<&Document> = match record.get(self.array_field) {
            Some(Bson::Array(items)) => items.iter().filter_map(Bson::as_document).collect(),
            Some(Bson::Document(entry)) => vec![entry],
            _ => Vec::new(),
        };
        entries
            .into_iter()
            .filter(|entry| match wanted {
                Some(t) => entry.get_str(self.type_param).is_ok_and(|v| v == t),
                None => true,
            })
            .map(|entry| {
                let mut row = record.clone();
                row.remove(self.array_field);
                for (key, value) in entry {
                    row.insert(key.clone(), value.clone());
                }
                row
            })
            .collect()
    }
}

impl ReportBuilder for ApprovalReport {
    fn definition(&self) -> &ReportDefinition {
        &self.definition
    }

    fn shape(&self, records: Vec<Document>, filters: &Filters) -> Vec<Document> {
        let wanted = filters.text(self.type_param);
        records
            .iter()
            .flat_map(|record| self.flatten(record, wanted))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ParamSpec, Target};
    use bson::doc;
    use pretty_assertions::assert_eq;
    use xlreport_render::Column;

    fn approvals() -> ApprovalReport {
        let definition = ReportDefinition::new(33, "drc_approval", "DRC APPROVAL", "Template_forwarded_approver")
            .param(
                ParamSpec::choice("approval_type", "approval_type", &["DRC Assign", "DRC Re-Assign"])
                    .target(Target::Shape),
            )
            .columns(vec![Column::new("approver_reference"), Column::new("approval_type")]);
        ApprovalReport::new(definition, "approve", "approval_type")
    }

    fn record() -> Document {
        doc! {
            "approver_reference": 7,
            "approve": [
                { "approval_type": "DRC Assign", "approved_by": "a" },
                { "approval_type": "DRC Re-Assign", "approved_by": "b" },
            ],
        }
    }

    #[test]
    fn defined_report_uses_definition() {
        let report = DefinedReport::new(ReportDefinition::new(20, "incidents_details", "INCIDENT REPORT", "Incident_log"));
        assert_eq!(report.template_id(), TemplateId(20));
        assert_eq!(report.name(), "incidents_details");
        let filters = report.validate(&Params::default()).unwrap();
        assert!(report.query(&filters).is_empty());
        assert_eq!(report.shape(vec![doc! { "a": 1 }], &filters), vec![doc! { "a": 1 }]);
    }

    #[test]
    fn approvals_flatten_one_row_per_entry() {
        let report = approvals();
        let filters = report.validate(&Params::default()).unwrap();
        let rows = report.shape(vec![record()], &filters);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_str("approved_by").unwrap(), "a");
        assert_eq!(rows[1].get_str("approval_type").unwrap(), "DRC Re-Assign");
        assert_eq!(rows[1].get_i32("approver_reference").unwrap(), 7);
        assert!(rows[0].get("approve").is_none());
    }

    #[test]
    fn approval_type_filters_entries() {
        let report = approvals();
        let filters = report
            .validate(&Params::from_pairs([("approval_type", "DRC Re-Assign")]))
            .unwrap();
        assert!(report.query(&filters).is_empty());
        let rows = report.shape(vec![record()], &filters);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("approved_by").unwrap(), "b");
    }

    #[test]
    fn records_without_entries_produce_no_rows() {
        let report = approvals();
        let filters = report.validate(&Params::default()).unwrap();
        assert!(report.shape(vec![doc! { "approver_reference": 1 }], &filters).is_empty());
    }
}
