//! Filter summary block

use std::fmt::Display;
use xlreport_core::DateRange;

/// Ordered `label: value` pairs shown above the data table.
///
/// Only filters that were actually applied are pushed; absent ones are
/// silently skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSummary {
    entries: Vec<(String, String)>,
}

impl FilterSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.entries.push((label.into(), value.into()));
    }

    pub fn push_opt<V: Display>(&mut self, label: impl Into<String>, value: Option<V>) {
        if let Some(v) = value {
            self.push(label, v.to_string());
        }
    }

    /// Adds `"<from> to <to>"` unless both ends are open.
    pub fn push_range(&mut self, label: impl Into<String>, range: &DateRange) {
        if !range.is_unbounded() {
            self.push(label, range.describe());
        }
    }

    pub fn with(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(label, value);
        self
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn skips_absent_values_and_open_ranges() {
        let mut s = FilterSummary::new();
        s.push_opt("Action:", None::<String>);
        s.push_opt("Status:", Some("Reject"));
        s.push_range("Date Range:", &DateRange::default());
        assert_eq!(s.entries(), &[("Status:".to_string(), "Reject".to_string())]);
    }

    #[test]
    fn range_rendering() {
        let range = DateRange::new(NaiveDate::from_ymd_opt(2024, 1, 1), None).unwrap();
        let mut s = FilterSummary::new();
        s.push_range("Date Range:", &range);
        assert_eq!(s.entries()[0].1, "2024-01-01 to Now");
    }
}
