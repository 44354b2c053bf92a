//! Composable storage predicates.
//!
//! A [`Predicate`] is the logical AND of [`Clause`]s. Each clause names a
//! field, an [`Operator`], the expected [`FilterValue`] and a plain function
//! pointer that reads the field from an entity. Predicates are built with
//! [`PredicateBuilder`], evaluate in memory with [`Predicate::matches`], and
//! render as a SQL-like `WHERE` fragment through `Display`.

use std::cmp::Ordering;
use std::fmt;

use uuid::Uuid;

use crate::aggregate::Aggregate;

/// Name of the implicit status clause.
pub const IS_ENABLED_FIELD: &str = "is_enabled";

/// A value a clause compares against.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterValue {
    Text(String),
    Id(Uuid),
    Bool(bool),
    Int(i64),
}

impl FilterValue {
    /// Renders the value for use inside a cache key.
    ///
    /// Text is percent-encoded so separators in user input cannot collide
    /// with the key layout.
    pub fn key_fragment(&self) -> String {
        match self {
            FilterValue::Text(text) => urlencoding::encode(text).into_owned(),
            FilterValue::Id(id) => id.to_string(),
            FilterValue::Bool(b) => b.to_string(),
            FilterValue::Int(n) => n.to_string(),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(text) => write!(f, "'{}'", text.replace('\'', "''")),
            FilterValue::Id(id) => write!(f, "'{id}'"),
            FilterValue::Bool(b) => write!(f, "{b}"),
            FilterValue::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<&String> for FilterValue {
    fn from(value: &String) -> Self {
        FilterValue::Text(value.clone())
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        FilterValue::Id(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<u16> for FilterValue {
    fn from(value: u16) -> Self {
        FilterValue::Int(value as i64)
    }
}

/// Comparison applied by a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operator {
    /// Exact equality.
    Eq,
    /// Case-insensitive substring match (text only).
    Contains,
}

impl Operator {
    /// Symbol used in cache keys.
    pub fn key_symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Contains => "~",
        }
    }

    fn test(&self, actual: &FilterValue, expected: &FilterValue) -> bool {
        match self {
            Operator::Eq => actual == expected,
            Operator::Contains => match (actual, expected) {
                (FilterValue::Text(actual), FilterValue::Text(expected)) => actual
                    .to_lowercase()
                    .contains(&expected.to_lowercase()),
                _ => false,
            },
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Eq => write!(f, "="),
            Operator::Contains => write!(f, "ILIKE"),
        }
    }
}

/// Reads a field from an entity. `None` stands for a null column.
pub type Accessor<T> = fn(&T) -> Option<FilterValue>;

/// A single `field <op> value` condition.
pub struct Clause<T> {
    field: &'static str,
    op: Operator,
    value: FilterValue,
    accessor: Accessor<T>,
}

impl<T> Clause<T> {
    pub fn new(
        field: &'static str,
        op: Operator,
        value: FilterValue,
        accessor: Accessor<T>,
    ) -> Self {
        Self {
            field,
            op,
            value,
            accessor,
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    /// Evaluates the clause. A null field never matches.
    pub fn matches(&self, entity: &T) -> bool {
        (self.accessor)(entity).is_some_and(|actual| self.op.test(&actual, &self.value))
    }

    fn sort_key(&self, other: &Self) -> Ordering {
        (self.field, self.op, &self.value).cmp(&(other.field, other.op, &other.value))
    }
}

impl<T> Clone for Clause<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field,
            op: self.op,
            value: self.value.clone(),
            accessor: self.accessor,
        }
    }
}

impl<T> fmt::Debug for Clause<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clause")
            .field("field", &self.field)
            .field("op", &self.op)
            .field("value", &self.value)
            .finish()
    }
}

impl<T> fmt::Display for Clause<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.op, &self.value) {
            (Operator::Contains, FilterValue::Text(text)) => write!(
                f,
                "{} {} '%{}%'",
                self.field,
                self.op,
                text.replace('\'', "''")
            ),
            _ => write!(f, "{} {} {}", self.field, self.op, self.value),
        }
    }
}

/// Conjunction of clauses, kept sorted by field so equal filters compare equal.
pub struct Predicate<T> {
    clauses: Vec<Clause<T>>,
}

impl<T> Predicate<T> {
    /// A predicate without clauses; matches every entity.
    pub fn all() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    pub fn clauses(&self) -> &[Clause<T>] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, entity: &T) -> bool {
        self.clauses.iter().all(|clause| clause.matches(entity))
    }

    /// Combines two predicates with AND.
    pub fn and(mut self, other: Predicate<T>) -> Self {
        self.clauses.extend(other.clauses);
        self.clauses.sort_by(|a, b| a.sort_key(b));
        self
    }

    /// Deterministic rendering used inside cache keys.
    pub fn key_fragment(&self) -> String {
        if self.clauses.is_empty() {
            return "all".to_string();
        }
        self.clauses
            .iter()
            .map(|c| format!("{}{}{}", c.field, c.op.key_symbol(), c.value.key_fragment()))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            clauses: self.clauses.clone(),
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.clauses).finish()
    }
}

impl<T> fmt::Display for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return write!(f, "TRUE");
        }
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

/// Builds a [`Predicate`] one optional filter at a time.
///
/// Every `None` filter is skipped, so the result holds exactly one clause
/// per provided value.
pub struct PredicateBuilder<T> {
    clauses: Vec<Clause<T>>,
}

impl<T> PredicateBuilder<T> {
    pub fn new() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    /// Adds an exact-equality clause when `value` is present.
    pub fn eq<V>(mut self, field: &'static str, value: Option<V>, accessor: Accessor<T>) -> Self
    where
        V: Into<FilterValue>,
    {
        if let Some(value) = value {
            self.clauses
                .push(Clause::new(field, Operator::Eq, value.into(), accessor));
        }
        self
    }

    /// Adds a case-insensitive substring clause when `value` is present and not blank.
    pub fn contains(mut self, field: &'static str, value: Option<&str>, accessor: Accessor<T>) -> Self {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.clauses.push(Clause::new(
                field,
                Operator::Contains,
                FilterValue::from(value),
                accessor,
            ));
        }
        self
    }

    pub fn build(mut self) -> Predicate<T> {
        self.clauses.sort_by(|a, b| a.sort_key(b));
        Predicate {
            clauses: self.clauses,
        }
    }
}

impl<T: Aggregate> PredicateBuilder<T> {
    /// Adds the status clause. An omitted filter restricts to enabled entities.
    pub fn enabled(self, is_enabled: Option<bool>) -> Self {
        self.eq(
            IS_ENABLED_FIELD,
            Some(is_enabled.unwrap_or(true)),
            |entity: &T| Some(FilterValue::Bool(entity.is_enabled())),
        )
    }
}

impl<T> Default for PredicateBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
