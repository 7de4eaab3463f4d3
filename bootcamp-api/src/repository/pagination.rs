//! Pagination, ordering and filtering types for repository queries
//!
//! A [`Filter`] is a conjunction of [`FilterCondition`]s. Conditions are
//! plain data; the storage backend decides how each operator is rendered.
//!
//! ```rust
//! use bootcamp_api::repository::{Filter, FilterCondition, Pagination};
//!
//! let filter = Filter::new()
//!     .and(FilterCondition::eq("housing", true))
//!     .and(FilterCondition::gte("averageCost", 10000));
//! assert_eq!(filter.len(), 2);
//!
//! let window = Pagination::new(40, 20);
//! assert_eq!(window.limit, 20);
//! ```

use std::fmt;

use serde_json::Value;

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    Descending,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "ASC"),
            Self::Descending => write!(f, "DESC"),
        }
    }
}

/// A single ordering term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Field path, dot separated for nested fields
    pub field: String,
    /// Direction
    pub direction: OrderDirection,
}

impl SortKey {
    /// Ascending order on `field`
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Ascending,
        }
    }

    /// Descending order on `field`
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Descending,
        }
    }
}

/// Pagination parameters for limiting query results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of results to skip
    pub offset: u64,
    /// Maximum number of results to return
    pub limit: u64,
}

impl Pagination {
    /// Create new pagination parameters
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }
}

/// Comparison operators for filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to
    Equal,
    /// Greater than
    GreaterThan,
    /// Greater than or equal to
    GreaterThanOrEqual,
    /// Less than
    LessThan,
    /// Less than or equal to
    LessThanOrEqual,
    /// Value is one of a list
    In,
}

impl FilterOperator {
    /// Parse a query-string operator keyword (`gt`, `gte`, `lt`, `lte`, `in`)
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "gt" => Some(Self::GreaterThan),
            "gte" => Some(Self::GreaterThanOrEqual),
            "lt" => Some(Self::LessThan),
            "lte" => Some(Self::LessThanOrEqual),
            "in" => Some(Self::In),
            _ => None,
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqual => write!(f, "<="),
            Self::In => write!(f, "IN"),
        }
    }
}

/// A value that can be used in filter conditions
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// String value
    String(String),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// List of values (for IN)
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Infer a typed value from raw query-string text.
    ///
    /// Tries integer, then decimal, then boolean, and falls back to the
    /// original string. Integers must be in canonical form so that values
    /// such as postal codes with leading zeros stay strings.
    pub fn infer(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<i64>() {
            if n.to_string() == raw {
                return Self::Integer(n);
            }
        }

        if is_decimal(raw) {
            if let Ok(f) = raw.parse::<f64>() {
                return Self::Float(f);
            }
        }

        match raw {
            "true" => Self::Boolean(true),
            "false" => Self::Boolean(false),
            _ => Self::String(raw.to_string()),
        }
    }

    /// JSON form, used when binding the value as a query parameter
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::from(s.as_str()),
            Self::Integer(n) => Value::from(*n),
            Self::Float(f) => Value::from(*f),
            Self::Boolean(b) => Value::from(*b),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

fn is_decimal(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    match digits.split_once('.') {
        Some((whole, frac)) => {
            !whole.is_empty()
                && !frac.is_empty()
                && whole.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for FilterValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// A single predicate on one field
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// Field path, dot separated for nested fields
    pub field: String,
    /// Comparison operator
    pub operator: FilterOperator,
    /// Right-hand value
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create a new filter condition
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Equality condition
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value)
    }

    /// Greater-than condition
    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value)
    }

    /// Greater-than-or-equal condition
    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value)
    }

    /// Less-than condition
    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThan, value)
    }

    /// Less-than-or-equal condition
    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value)
    }

    /// Membership condition
    pub fn is_in(field: impl Into<String>, values: Vec<FilterValue>) -> Self {
        Self::new(field, FilterOperator::In, FilterValue::List(values))
    }
}

/// Conjunction of filter conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<FilterCondition>,
}

impl Filter {
    /// Empty filter, matching everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition
    #[must_use]
    pub fn and(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Conditions in insertion order
    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    /// Number of conditions
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Whether the filter matches everything
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether any condition targets `field`
    #[cfg(test)]
    pub(crate) fn mentions(&self, field: &str) -> bool {
        self.conditions.iter().any(|c| c.field == field)
    }
}

impl FromIterator<FilterCondition> for Filter {
    fn from_iter<I: IntoIterator<Item = FilterCondition>>(iter: I) -> Self {
        Self {
            conditions: iter.into_iter().collect(),
        }
    }
}
