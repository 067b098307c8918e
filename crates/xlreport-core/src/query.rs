//! Store-neutral query and update documents
//!
//! A `Query` is an ordered list of field conditions that every backend can
//! use: `MongoStore` sends `to_document()` to the server, and `MemoryStore`
//! evaluates `matches()` locally. The two must agree; the tests at the bottom
//! of this file check both sides against the same inputs.

use bson::{doc, Bson, Document};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashSet;

// ============================================================================
// Conditions
// ============================================================================

/// How a categorical filter value is matched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Plain equality.
    #[default]
    Exact,
    /// Case-sensitive regex anchored at both ends, value escaped.
    Anchored,
}

/// A condition on a single field.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Eq(Bson),
    Pattern(String),
    In(Vec<Bson>),
    Range { gte: Option<Bson>, lte: Option<Bson> },
}

impl Condition {
    pub fn eq(value: impl Into<Bson>) -> Self {
        Condition::Eq(value.into())
    }

    /// Match a string value using the given mode.
    pub fn matching(mode: MatchMode, value: &str) -> Self {
        match mode {
            MatchMode::Exact => Condition::Eq(Bson::String(value.to_string())),
            MatchMode::Anchored => Condition::Pattern(format!("^{}$", regex::escape(value))),
        }
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        Condition::In(values.into_iter().map(Into::into).collect())
    }

    pub fn between(gte: Option<Bson>, lte: Option<Bson>) -> Self {
        Condition::Range { gte, lte }
    }

    fn to_bson(&self) -> Option<Bson> {
        match self {
            Condition::Eq(v) => Some(v.clone()),
            Condition::Pattern(p) => Some(Bson::Document(doc! { "$regex": p.as_str() })),
            Condition::In(values) => Some(Bson::Document(doc! { "$in": values.clone() })),
            Condition::Range { gte, lte } => {
                let mut range = Document::new();
                if let Some(lo) = gte {
                    range.insert("$gte", lo.clone());
                }
                if let Some(hi) = lte {
                    range.insert("$lte", hi.clone());
                }
                (!range.is_empty()).then_some(Bson::Document(range))
            }
        }
    }

    fn matches(&self, value: Option<&Bson>) -> bool {
        match self {
            Condition::Eq(expected) => match value {
                None => matches!(expected, Bson::Null),
                Some(actual) => any_element(actual, |v| bson_eq(v, expected)),
            },
            Condition::Pattern(pattern) => {
                let Ok(re) = Regex::new(pattern) else {
                    return false;
                };
                value.is_some_and(|actual| {
                    any_element(actual, |v| matches!(v, Bson::String(s) if re.is_match(s)))
                })
            }
            Condition::In(options) => value.is_some_and(|actual| {
                any_element(actual, |v| options.iter().any(|o| bson_eq(v, o)))
            }),
            Condition::Range { gte, lte } => {
                if gte.is_none() && lte.is_none() {
                    return true;
                }
                value.is_some_and(|actual| {
                    any_element(actual, |v| {
                        let lower = gte.as_ref().map_or(true, |lo| {
                            matches!(compare_bson(v, lo), Some(Ordering::Greater | Ordering::Equal))
                        });
                        let upper = lte.as_ref().map_or(true, |hi| {
                            matches!(compare_bson(v, hi), Some(Ordering::Less | Ordering::Equal))
                        });
                        lower && upper
                    })
                })
            }
        }
    }
}

// ============================================================================
// Query
// ============================================================================

/// One clause of a query.
#[derive(Clone, Debug, PartialEq)]
pub enum Clause {
    Field { field: String, condition: Condition },
    AnyOf(Vec<Query>),
}

/// A conjunction of clauses.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field condition
    pub fn with(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.push(field, condition);
        self
    }

    pub fn push(&mut self, field: impl Into<String>, condition: Condition) {
        self.clauses.push(Clause::Field {
            field: field.into(),
            condition,
        });
    }

    /// Require at least one of the alternatives to match.
    pub fn any_of(mut self, alternatives: Vec<Query>) -> Self {
        self.push_any_of(alternatives);
        self
    }

    pub fn push_any_of(&mut self, alternatives: Vec<Query>) {
        if !alternatives.is_empty() {
            self.clauses.push(Clause::AnyOf(alternatives));
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Render as a MongoDB filter document.
    ///
    /// Clauses that share a key are combined under `$and`.
    pub fn to_document(&self) -> Document {
        let pairs: Vec<(String, Bson)> = self
            .clauses
            .iter()
            .filter_map(|clause| match clause {
                Clause::Field { field, condition } => {
                    condition.to_bson().map(|b| (field.clone(), b))
                }
                Clause::AnyOf(alternatives) => Some((
                    "$or".to_string(),
                    Bson::Array(
                        alternatives
                            .iter()
                            .map(|q| Bson::Document(q.to_document()))
                            .collect(),
                    ),
                )),
            })
            .collect();

        let unique = {
            let mut seen = HashSet::new();
            pairs.iter().all(|(k, _)| seen.insert(k.as_str()))
        };
        if unique {
            return pairs.into_iter().collect();
        }

        let parts: Vec<Bson> = pairs
            .into_iter()
            .map(|(k, v)| {
                let mut single = Document::new();
                single.insert(k, v);
                Bson::Document(single)
            })
            .collect();
        doc! { "$and": parts }
    }

    /// Evaluate against a document in memory.
    pub fn matches(&self, doc: &Document) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Field { field, condition } => condition.matches(lookup(doc, field)),
            Clause::AnyOf(alternatives) => alternatives.iter().any(|q| q.matches(doc)),
        })
    }
}

// ============================================================================
// Update
// ============================================================================

/// Field assignments and increments applied to one document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Update {
    set: Document,
    inc: Document,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.set.insert(field, value.into());
        self
    }

    pub fn inc(mut self, field: &str, by: i32) -> Self {
        self.inc.insert(field, Bson::Int32(by));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.inc.is_empty()
    }

    /// Render as a MongoDB update document.
    pub fn to_document(&self) -> Document {
        let mut out = Document::new();
        if !self.set.is_empty() {
            out.insert("$set", self.set.clone());
        }
        if !self.inc.is_empty() {
            out.insert("$inc", self.inc.clone());
        }
        out
    }

    /// Apply in place.
    pub fn apply_to(&self, doc: &mut Document) {
        for (k, v) in &self.set {
            doc.insert(k.clone(), v.clone());
        }
        for (k, v) in &self.inc {
            let by = as_f64(v).unwrap_or(0.0);
            let next = match doc.get(k) {
                Some(Bson::Int32(n)) => Bson::Int32(*n + by as i32),
                Some(Bson::Int64(n)) => Bson::Int64(*n + by as i64),
                Some(Bson::Double(n)) => Bson::Double(*n + by),
                _ => v.clone(),
            };
            doc.insert(k.clone(), next);
        }
    }
}

// ============================================================================
// Value comparison
// ============================================================================

fn lookup<'a>(doc: &'a Document, field: &str) -> Option<&'a Bson> {
    if let Some(v) = doc.get(field) {
        return Some(v);
    }
    let mut parts = field.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

fn any_element(value: &Bson, pred: impl Fn(&Bson) -> bool) -> bool {
    match value {
        Bson::Array(items) => items.iter().any(&pred) || pred(value),
        other => pred(other),
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

fn bson_eq(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare_bson(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
