//! Row filters.
//!
//! A [`Filter`] is a single predicate: a field name, an [`Op`] and a
//! comparison [`Value`]. Filters narrow the bound set before it is counted,
//! sorted or paged. In-memory drivers evaluate them with [`Filter::matches`];
//! the SQL driver translates them with [`Op::sql`].

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::ordering::compare_values;
use crate::record::Record;
use crate::value::Value;

/// Comparison operator for a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// String contains substring.
    Contains,
    /// String starts with prefix.
    StartsWith,
    /// String ends with suffix.
    EndsWith,
}

impl Op {
    /// Returns `true` for the substring operators.
    pub fn is_string_op(self) -> bool {
        matches!(self, Op::Contains | Op::StartsWith | Op::EndsWith)
    }

    /// Evaluates a comparison given an ordering result.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            _ => false,
        }
    }

    /// SQL operator text. Substring operators map to `LIKE`.
    pub fn sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Contains | Op::StartsWith | Op::EndsWith => "LIKE",
        }
    }
}

/// A single filter predicate.
///
/// ```
/// use datagrid_source::{Filter, Op, Record};
///
/// let adults = Filter::new("age", Op::Gte, 18);
/// assert!(adults.matches(&Record::new().with("age", 30)));
/// assert!(!adults.matches(&Record::new().with("age", 12)));
///
/// // A missing field never matches
/// assert!(!adults.matches(&Record::new()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// The field name to compare.
    pub field: String,
    /// The comparison operator.
    pub op: Op,
    /// The value to compare against.
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Filter {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Shorthand for an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::new(field, Op::Eq, value)
    }

    /// Evaluates this filter against a record.
    ///
    /// Null fields never match; neither do incomparable value kinds.
    pub fn matches(&self, record: &Record) -> bool {
        let field_value = record.value(&self.field);
        if field_value.is_null() {
            return false;
        }

        if self.op.is_string_op() {
            let haystack = field_value.to_string();
            let needle = self.value.to_string();
            return match self.op {
                Op::Contains => haystack.contains(&needle),
                Op::StartsWith => haystack.starts_with(&needle),
                Op::EndsWith => haystack.ends_with(&needle),
                _ => false,
            };
        }

        match compare_values(field_value, &self.value) {
            Some(ordering) => self.op.eval_ordering(ordering),
            None => false,
        }
    }

    /// The bound parameter for a SQL translation of this filter.
    ///
    /// Substring operators wrap the value with `%` wildcards.
    pub fn sql_param(&self) -> Value {
        match self.op {
            Op::Contains => Value::String(format!("%{}%", self.value)),
            Op::StartsWith => Value::String(format!("{}%", self.value)),
            Op::EndsWith => Value::String(format!("%{}", self.value)),
            _ => self.value.clone(),
        }
    }
}

/// Returns `true` if the record satisfies every filter.
pub fn matches_all(filters: &[Filter], record: &Record) -> bool {
    filters.iter().all(|filter| filter.matches(record))
}
