//! Declarative report definitions
//!
//! A `ReportDefinition` names the collection, the fixed base conditions, the
//! accepted filter parameters and the column schema of one report. The
//! generic validate / query / summary logic in this module is shared by every
//! report.

use bson::{Bson, Document};
use xlreport_core::{Condition, DateRange, MatchMode, Params, Query, TemplateId, ValidationError};
use xlreport_render::{title_case, Column, FilterSummary, WorksheetTemplate};

// ============================================================================
// Parameters
// ============================================================================

/// Accepted shape of one filter parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// One of a fixed set of strings.
    Choice(&'static [&'static str]),
    /// One of a fixed set of integers.
    IntChoice(&'static [i64]),
    /// Free text; blank means absent.
    Text,
    /// Non-empty list of strings, matched with `$in`.
    List,
    /// `YYYY-MM-DD` from/to pair.
    Dates { from: &'static str, to: &'static str },
}

/// Where a validated value is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// Condition on one record field.
    Field(&'static str),
    /// Condition that any of these fields satisfies.
    AnyField(&'static [&'static str]),
    /// Not part of the query; used by row shaping only.
    Shape,
}

/// One accepted filter parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub target: Target,
    pub mode: MatchMode,
    label: Option<&'static str>,
    audit_key: Option<&'static str>,
}

impl ParamSpec {
    pub fn new(name: &'static str, kind: ParamKind, target: Target) -> Self {
        Self {
            name,
            kind,
            target,
            mode: MatchMode::Exact,
            label: None,
            audit_key: None,
        }
    }

    pub fn choice(name: &'static str, field: &'static str, values: &'static [&'static str]) -> Self {
        Self::new(name, ParamKind::Choice(values), Target::Field(field))
    }

    pub fn int_choice(name: &'static str, field: &'static str, values: &'static [i64]) -> Self {
        Self::new(name, ParamKind::IntChoice(values), Target::Field(field))
    }

    pub fn text(name: &'static str, field: &'static str) -> Self {
        Self::new(name, ParamKind::Text, Target::Field(field))
    }

    pub fn list(name: &'static str, field: &'static str) -> Self {
        Self::new(name, ParamKind::List, Target::Field(field))
    }

    /// `from_date` / `to_date` on one field.
    pub fn dates(field: &'static str) -> Self {
        Self::new(
            "date_range",
            ParamKind::Dates {
                from: "from_date",
                to: "to_date",
            },
            Target::Field(field),
        )
        .label("Date Range:")
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn audit_as(mut self, key: &'static str) -> Self {
        self.audit_key = Some(key);
        self
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Match with an anchored regex instead of equality.
    pub fn anchored(mut self) -> Self {
        self.mode = MatchMode::Anchored;
        self
    }

    /// Keys read from task parameters.
    pub fn keys(&self) -> Vec<&'static str> {
        match self.kind {
            ParamKind::Dates { from, to } => vec![from, to],
            _ => vec![self.name],
        }
    }

    /// Summary label, e.g. `"Status:"`.
    pub fn summary_label(&self) -> String {
        self.label
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}:", title_case(&self.name.replace('_', " "))))
    }

    fn read(&self, params: &Params) -> Result<Option<FilterValue>, ValidationError> {
        match &self.kind {
            ParamKind::Choice(allowed) => match params.text(self.name)? {
                None => Ok(None),
                Some(v) if allowed.contains(&v.as_str()) => Ok(Some(FilterValue::Text(v))),
                Some(v) => Err(ValidationError::InvalidChoice {
                    param: self.name.to_string(),
                    value: v,
                    allowed: allowed.join(", "),
                }),
            },
            ParamKind::IntChoice(allowed) => match params.integer(self.name)? {
                None => Ok(None),
                Some(v) if allowed.contains(&v) => Ok(Some(FilterValue::Int(v))),
                Some(v) => Err(ValidationError::InvalidChoice {
                    param: self.name.to_string(),
                    value: v.to_string(),
                    allowed: allowed.iter().map(i64::to_string).collect::<Vec<_>>().join(", "),
                }),
            },
            ParamKind::Text => Ok(params.text(self.name)?.map(FilterValue::Text)),
            ParamKind::List => Ok(params.list(self.name)?.map(FilterValue::List)),
            ParamKind::Dates { from, to } => {
                let range = params.date_range(from, to)?;
                Ok((!range.is_unbounded()).then_some(FilterValue::Dates(range)))
            }
        }
    }

    fn condition(&self, value: &FilterValue) -> Option<Condition> {
        match value {
            FilterValue::Text(s) => Some(Condition::matching(self.mode, s)),
            FilterValue::Int(n) => Some(Condition::eq(Bson::Int64(*n))),
            FilterValue::List(items) => Some(Condition::one_of(items.iter().map(String::as_str))),
            FilterValue::Dates(range) => range.condition(),
        }
    }
}

// ============================================================================
// Validated filters
// ============================================================================

/// A validated parameter value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Int(i64),
    List(Vec<String>),
    Dates(DateRange),
}

impl FilterValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn display(&self) -> String {
        match self {
            FilterValue::Text(s) => s.clone(),
            FilterValue::Int(n) => n.to_string(),
            FilterValue::List(items) => items.join(", "),
            FilterValue::Dates(range) => range.describe(),
        }
    }
}

/// Filters that passed validation, keyed by parameter name. Absent
/// parameters are not stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filters {
    values: Vec<(&'static str, FilterValue)>,
}

impl Filters {
    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FilterValue::as_text)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

// ============================================================================
// Definition
// ============================================================================

/// Everything that distinguishes one report from another.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportDefinition {
    pub template_id: TemplateId,
    /// File name prefix
    pub name: &'static str,
    pub title: &'static str,
    pub sheet_name: Option<&'static str>,
    pub collection: &'static str,
    pub base: Query,
    pub params: Vec<ParamSpec>,
    pub columns: Vec<Column>,
    /// Collection receiving one audit record per export
    pub audit: Option<&'static str>,
}

impl ReportDefinition {
    pub fn new(template_id: u32, name: &'static str, title: &'static str, collection: &'static str) -> Self {
        Self {
            template_id: TemplateId(template_id),
            name,
            title,
            sheet_name: None,
            collection,
            base: Query::new(),
            params: Vec::new(),
            columns: Vec::new(),
            audit: None,
        }
    }

    /// Fixed condition applied to every run
    pub fn base(mut self, field: &'static str, condition: Condition) -> Self {
        self.base.push(field, condition);
        self
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn sheet_name(mut self, name: &'static str) -> Self {
        self.sheet_name = Some(name);
        self
    }

    pub fn audit(mut self, collection: &'static str) -> Self {
        self.audit = Some(collection);
        self
    }

    /// Validate every declared parameter. Undeclared keys are ignored.
    pub fn validate(&self, params: &Params) -> Result<Filters, ValidationError> {
        let mut filters = Filters::default();
        for spec in &self.params {
            if let Some(value) = spec.read(params)? {
                filters.values.push((spec.name, value));
            }
        }
        Ok(filters)
    }

    /// Base conditions plus one condition per applied filter.
    pub fn query(&self, filters: &Filters) -> Query {
        let mut query = self.base.clone();
        for spec in &self.params {
            let Some(condition) = filters.get(spec.name).and_then(|v| spec.condition(v)) else {
                continue;
            };
            match spec.target {
                Target::Field(field) => query.push(field, condition),
                Target::AnyField(fields) => query.push_any_of(
                    fields
                        .iter()
                        .map(|f| Query::new().with(*f, condition.clone()))
                        .collect(),
                ),
                Target::Shape => {}
            }
        }
        query
    }

    /// Applied filters in declaration order.
    pub fn summary(&self, filters: &Filters) -> FilterSummary {
        let mut summary = FilterSummary::new();
        for spec in &self.params {
            if let Some(value) = filters.get(spec.name) {
                summary.push(spec.summary_label(), value.display());
            }
        }
        summary
    }

    /// Every declared parameter, null when not given.
    pub fn audit_filters(&self, filters: &Filters) -> Document {
        let mut doc = Document::new();
        for spec in &self.params {
            let value = filters.get(spec.name);
            match (&spec.kind, value) {
                (ParamKind::Dates { .. }, value) => {
                    let range = match value {
                        Some(FilterValue::Dates(r)) => *r,
                        _ => DateRange::default(),
                    };
                    let fmt = |d: Option<chrono::NaiveDate>| {
                        d.map_or(Bson::Null, |d| Bson::String(d.format("%Y-%m-%d").to_string()))
                    };
                    doc.insert("From_Date", fmt(range.from));
                    doc.insert("To_Date", fmt(range.to));
                }
                (_, value) => {
                    let key = spec.audit_key.unwrap_or(spec.name);
                    let bson = match value {
                        None => Bson::Null,
                        Some(FilterValue::Text(s)) => Bson::String(s.clone()),
                        Some(FilterValue::Int(n)) => Bson::Int64(*n),
                        Some(FilterValue::List(items)) => {
                            Bson::Array(items.iter().cloned().map(Bson::String).collect())
                        }
                        Some(FilterValue::Dates(r)) => Bson::String(r.describe()),
                    };
                    doc.insert(key, bson);
                }
            }
        }
        doc
    }

    pub fn template(&self) -> WorksheetTemplate {
        let template = WorksheetTemplate::new(self.title, self.columns.clone());
        match self.sheet_name {
            Some(name) => template.sheet_name(name),
            None => template,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
