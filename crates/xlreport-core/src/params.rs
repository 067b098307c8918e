//! Filter parameter access and date-range validation

use bson::{Bson, Document};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::ValidationError;
use crate::query::Condition;

/// Accepted date format for filter parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(param: &str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        param: param.to_string(),
        value: value.to_string(),
    })
}

// ============================================================================
// Params
// ============================================================================

/// Raw filter parameters from a task or the command line.
///
/// Missing keys, nulls and blank strings all read as "not given".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(Document);

impl Params {
    pub fn new(doc: Document) -> Self {
        Self(doc)
    }

    /// Build from `key=value` style pairs; all values are strings.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut doc = Document::new();
        for (k, v) in pairs {
            doc.insert(k.into(), Bson::String(v.into()));
        }
        Self(doc)
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn into_document(self) -> Document {
        self.0
    }

    fn present(&self, name: &str) -> Option<&Bson> {
        match self.0.get(name) {
            None | Some(Bson::Null) => None,
            Some(Bson::String(s)) if s.trim().is_empty() => None,
            Some(other) => Some(other),
        }
    }

    /// A trimmed text value.
    pub fn text(&self, name: &str) -> Result<Option<String>, ValidationError> {
        match self.present(name) {
            None => Ok(None),
            Some(Bson::String(s)) => Ok(Some(s.trim().to_string())),
            Some(Bson::Int32(n)) => Ok(Some(n.to_string())),
            Some(Bson::Int64(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(wrong_type(name, "a string")),
        }
    }

    pub fn integer(&self, name: &str) -> Result<Option<i64>, ValidationError> {
        match self.present(name) {
            None => Ok(None),
            Some(Bson::Int32(n)) => Ok(Some(i64::from(*n))),
            Some(Bson::Int64(n)) => Ok(Some(*n)),
            Some(Bson::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| wrong_type(name, "an integer")),
            Some(_) => Err(wrong_type(name, "an integer")),
        }
    }

    /// A list of strings. A comma-separated string is accepted as a list.
    pub fn list(&self, name: &str) -> Result<Option<Vec<String>>, ValidationError> {
        let items: Vec<String> = match self.0.get(name) {
            None | Some(Bson::Null) => return Ok(None),
            Some(Bson::Array(values)) => values
                .iter()
                .map(|v| match v {
                    Bson::String(s) => Ok(s.trim().to_string()),
                    _ => Err(wrong_type(name, "a list of strings")),
                })
                .collect::<Result<_, _>>()?,
            Some(Bson::String(s)) => s.split(',').map(|p| p.trim().to_string()).collect(),
            Some(_) => return Err(wrong_type(name, "a list of strings")),
        };
        let items: Vec<String> = items.into_iter().filter(|s| !s.is_empty()).collect();
        if items.is_empty() {
            return Err(ValidationError::EmptyList {
                param: name.to_string(),
            });
        }
        Ok(Some(items))
    }

    pub fn date(&self, name: &str) -> Result<Option<NaiveDate>, ValidationError> {
        match self.present(name) {
            None => Ok(None),
            Some(Bson::String(s)) => parse_date(name, s).map(Some),
            Some(Bson::DateTime(dt)) => Ok(Some(dt.to_chrono().date_naive())),
            Some(_) => Err(wrong_type(name, "a YYYY-MM-DD date")),
        }
    }

    /// Read and validate a from/to pair.
    pub fn date_range(&self, from: &str, to: &str) -> Result<DateRange, ValidationError> {
        DateRange::new(self.date(from)?, self.date(to)?)
    }
}

fn wrong_type(param: &str, expected: &'static str) -> ValidationError {
    ValidationError::WrongType {
        param: param.to_string(),
        expected,
    }
}

// ============================================================================
// DateRange
// ============================================================================

/// Inclusive calendar-day range; either end may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, ValidationError> {
        if let (Some(f), Some(t)) = (from, to) {
            if t < f {
                return Err(ValidationError::InvertedRange);
            }
        }
        Ok(Self { from, to })
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// 00:00:00 on the from-date.
    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        self.from.map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
    }

    /// 23:59:59 on the to-date.
    pub fn upper_bound(&self) -> Option<DateTime<Utc>> {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)?;
        self.to.map(|d| Utc.from_utc_datetime(&d.and_time(end_of_day)))
    }

    pub fn condition(&self) -> Option<Condition> {
        if self.is_unbounded() {
            return None;
        }
        let to_bson = |dt: DateTime<Utc>| Bson::DateTime(bson::DateTime::from_chrono(dt));
        Some(Condition::between(
            self.lower_bound().map(to_bson),
            self.upper_bound().map(to_bson),
        ))
    }

    /// `"<from> to <to>"` with open ends shown as `Beginning` / `Now`.
    pub fn describe(&self) -> String {
        let from = self
            .from
            .map_or_else(|| "Beginning".to_string(), |d| d.format(DATE_FORMAT).to_string());
        let to = self
            .to
            .map_or_else(|| "Now".to_string(), |d| d.format(DATE_FORMAT).to_string());
        format!("{from} to {to}")
    }
}

// ============================================================================
// Tests
// ============================================================================
