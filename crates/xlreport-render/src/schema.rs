//! Column schema and value formatting

use bson::{Bson, Document};
use serde::Serialize;
use std::fmt;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const US_DATE_FORMAT: &str = "%m/%d/%Y";

/// How a column's values are rendered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    /// Value as stored; numbers stay numeric.
    #[default]
    Text,
    /// Always a string; ObjectIds become hex.
    Identifier,
    /// `YYYY-MM-DD HH:MM:SS`
    DateTime,
    /// `MM/DD/YYYY`
    UsDate,
    /// Thousands separators, two decimals.
    Amount,
    /// `MM/DD/YYYY - MM/DD/YYYY` built from two date fields.
    Span { start: String, end: String },
}

/// One worksheet column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Record field read for this column.
    pub field: String,
    /// Header text before title-casing; defaults to `field`.
    pub header: Option<String>,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            header: None,
            kind: ColumnKind::Text,
        }
    }

    pub fn kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn identifier(field: impl Into<String>) -> Self {
        Self::new(field).kind(ColumnKind::Identifier)
    }

    pub fn datetime(field: impl Into<String>) -> Self {
        Self::new(field).kind(ColumnKind::DateTime)
    }

    pub fn us_date(field: impl Into<String>) -> Self {
        Self::new(field).kind(ColumnKind::UsDate)
    }

    pub fn amount(field: impl Into<String>) -> Self {
        Self::new(field).kind(ColumnKind::Amount)
    }

    pub fn span(label: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self::new(label).kind(ColumnKind::Span {
            start: start.into(),
            end: end.into(),
        })
    }

    /// Header cell text: underscores become spaces, words title-cased.
    pub fn header_text(&self) -> String {
        title_case(&self.header.as_deref().unwrap_or(&self.field).replace('_', " "))
    }

    /// Format this column's value from a record.
    pub fn value(&self, record: &Document) -> CellValue {
        match &self.kind {
            ColumnKind::Span { start, end } => {
                match (
                    field(record, start).and_then(|v| format_date(v, US_DATE_FORMAT)),
                    field(record, end).and_then(|v| format_date(v, US_DATE_FORMAT)),
                ) {
                    (Some(s), Some(e)) => CellValue::Text(format!("{s} - {e}")),
                    _ => CellValue::Empty,
                }
            }
            kind => match field(record, &self.field) {
                None | Some(Bson::Null) => CellValue::Empty,
                Some(value) => format_value(kind, value),
            },
        }
    }
}

/// Title-case each run of letters: first letter upper, rest lower.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

// ============================================================================
// Cell values
// ============================================================================

/// A rendered cell value.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Empty,
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Display width in characters.
    pub fn width(&self) -> usize {
        match self {
            CellValue::Empty => 0,
            other => other.to_string().chars().count(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(n) => write!(f, "{n}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Empty => Ok(()),
        }
    }
}

fn field<'a>(record: &'a Document, name: &str) -> Option<&'a Bson> {
    if let Some(v) = record.get(name) {
        return Some(v);
    }
    let (head, rest) = name.split_once('.')?;
    match record.get(head)? {
        Bson::Document(inner) => field(inner, rest),
        _ => None,
    }
}

fn format_date(value: &Bson, pattern: &str) -> Option<String> {
    match value {
        Bson::DateTime(dt) => Some(dt.to_chrono().format(pattern).to_string()),
        Bson::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn format_value(kind: &ColumnKind, value: &Bson) -> CellValue {
    match (kind, value) {
        (ColumnKind::DateTime, Bson::DateTime(_)) => {
            format_date(value, DATETIME_FORMAT).map_or(CellValue::Empty, CellValue::Text)
        }
        (ColumnKind::UsDate, Bson::DateTime(_)) => {
            format_date(value, US_DATE_FORMAT).map_or(CellValue::Empty, CellValue::Text)
        }
        (ColumnKind::Amount, _) => match as_number(value) {
            Some(n) => CellValue::Text(format_amount(n)),
            None => plain(value),
        },
        (ColumnKind::Identifier, Bson::Int32(n)) => CellValue::Text(n.to_string()),
        (ColumnKind::Identifier, Bson::Int64(n)) => CellValue::Text(n.to_string()),
        (ColumnKind::Identifier, Bson::Double(n)) => CellValue::Text(n.to_string()),
        _ => plain(value),
    }
}

fn plain(value: &Bson) -> CellValue {
    match value {
        Bson::String(s) => CellValue::Text(s.clone()),
        Bson::Int32(n) => CellValue::Integer(i64::from(*n)),
        Bson::Int64(n) => CellValue::Integer(*n),
        Bson::Double(n) => CellValue::Number(*n),
        Bson::ObjectId(oid) => CellValue::Text(oid.to_hex()),
        Bson::DateTime(dt) => CellValue::Text(dt.to_chrono().format(DATETIME_FORMAT).to_string()),
        Bson::Boolean(b) => CellValue::Text(b.to_string()),
        Bson::Null | Bson::Undefined => CellValue::Empty,
        Bson::Array(items) => CellValue::Text(
            items
                .iter()
                .map(|item| plain(item).to_string())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => CellValue::Text(other.to_string()),
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        Bson::Decimal128(d) => d.to_string().parse().ok(),
        Bson::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

/// `1234567.5` -> `1,234,567.50`
pub fn format_amount(n: f64) -> String {
    let fixed = format!("{:.2}", n.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if n < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}
