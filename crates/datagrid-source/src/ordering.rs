//! Sort direction, sort state and the stable in-memory sort.
//!
//! Provides [`Dir`] for sort direction, [`OrderBy`] for a field ordering and
//! [`SortState`], the zero-or-one ordering a grid is currently sorted by.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    #[serde(alias = "ASC", alias = "ascending")]
    Asc,
    /// Descending order (largest first).
    #[serde(alias = "DESC", alias = "descending")]
    Desc,
}

impl Dir {
    /// Returns `true` if this is ascending order.
    pub fn is_asc(self) -> bool {
        matches!(self, Dir::Asc)
    }

    /// Returns `true` if this is descending order.
    pub fn is_desc(self) -> bool {
        matches!(self, Dir::Desc)
    }

    /// Returns the other direction.
    pub fn opposite(self) -> Dir {
        match self {
            Dir::Asc => Dir::Desc,
            Dir::Desc => Dir::Asc,
        }
    }

    /// Applies this direction to an ordering.
    ///
    /// For `Asc`, returns the ordering unchanged.
    /// For `Desc`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the parameter spelling of this direction (`ASC`/`DESC`).
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "ASC",
            Dir::Desc => "DESC",
        }
    }
}

impl fmt::Display for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a direction string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDirError(pub String);

impl fmt::Display for ParseDirError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sort direction: {}", self.0)
    }
}

impl std::error::Error for ParseDirError {}

impl FromStr for Dir {
    type Err = ParseDirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Dir::Asc),
            "desc" | "descending" => Ok(Dir::Desc),
            _ => Err(ParseDirError(s.to_string())),
        }
    }
}

/// A single ordering clause specifying a field and direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderBy {
    /// The field to sort by.
    pub field: String,
    /// The sort direction.
    #[serde(default)]
    pub dir: Dir,
}

impl OrderBy {
    /// Creates a new ascending ordering for the given field.
    pub fn asc(field: impl Into<String>) -> Self {
        OrderBy::new(field, Dir::Asc)
    }

    /// Creates a new descending ordering for the given field.
    pub fn desc(field: impl Into<String>) -> Self {
        OrderBy::new(field, Dir::Desc)
    }

    /// Creates a new ordering with the given direction.
    pub fn new(field: impl Into<String>, dir: Dir) -> Self {
        OrderBy {
            field: field.into(),
            dir,
        }
    }

    /// Compares two records on this ordering's field.
    ///
    /// Incomparable values compare equal, so a stable sort keeps their
    /// original relative order.
    pub fn compare_records(&self, a: &Record, b: &Record) -> Ordering {
        compare_values(a.value(&self.field), b.value(&self.field))
            .map(|ordering| self.dir.apply(ordering))
            .unwrap_or(Ordering::Equal)
    }
}

/// The grid's current sort: nothing (source-defined order) or one field.
///
/// ```
/// use datagrid_source::{Dir, SortState};
///
/// let sort = SortState::by("age", Dir::Asc);
/// assert_eq!(sort.field(), Some("age"));
///
/// // Clicking the active column flips it; other columns use their default
/// assert_eq!(sort.next_direction("age", Dir::Asc), Dir::Desc);
/// assert_eq!(sort.next_direction("name", Dir::Desc), Dir::Desc);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SortState {
    order: Option<OrderBy>,
}

impl SortState {
    /// No sort: the source's default order.
    pub fn unsorted() -> Self {
        SortState::default()
    }

    /// Sort by one field.
    pub fn by(field: impl Into<String>, dir: Dir) -> Self {
        SortState {
            order: Some(OrderBy::new(field, dir)),
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.order.is_some()
    }

    pub fn order(&self) -> Option<&OrderBy> {
        self.order.as_ref()
    }

    /// The active sort field, if any.
    pub fn field(&self) -> Option<&str> {
        self.order.as_ref().map(|o| o.field.as_str())
    }

    /// The active direction, if any.
    pub fn dir(&self) -> Option<Dir> {
        self.order.as_ref().map(|o| o.dir)
    }

    /// Direction `field` is currently sorted in, or `None` if it is not the
    /// active sort field.
    pub fn direction_of(&self, field: &str) -> Option<Dir> {
        self.order
            .as_ref()
            .filter(|o| o.field == field)
            .map(|o| o.dir)
    }

    /// The direction a click on `field`'s header should request.
    ///
    /// The active field toggles between ascending and descending; any other
    /// field starts at its configured default.
    pub fn next_direction(&self, field: &str, default: Dir) -> Dir {
        match self.direction_of(field) {
            Some(dir) => dir.opposite(),
            None => default,
        }
    }
}

impl From<OrderBy> for SortState {
    fn from(order: OrderBy) -> Self {
        SortState { order: Some(order) }
    }
}

impl From<Option<OrderBy>> for SortState {
    fn from(order: Option<OrderBy>) -> Self {
        SortState { order }
    }
}

/// Compares two values.
///
/// - Same-kind values use their natural order.
/// - Strings that both parse as numbers compare numerically, as do a number
///   and a numeric string.
/// - `Null` sorts after every other value.
///
/// Returns `None` when the values cannot be compared (kind mismatch or NaN).
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Greater),
        (_, Value::Null) => Some(Ordering::Less),

        (Value::String(x), Value::String(y)) => match (parse_number(x), parse_number(y)) {
            (Some(nx), Some(ny)) => nx.partial_cmp(&ny),
            _ => Some(x.cmp(y)),
        },
        (Value::Number(x), Value::Number(y)) => x.compare(*y),
        (Value::Number(x), Value::String(y)) => parse_number(y)?.partial_cmp(&x.to_f64()).map(Ordering::reverse),
        (Value::String(x), Value::Number(y)) => parse_number(x)?.partial_cmp(&y.to_f64()),
        (Value::Timestamp(x), Value::Timestamp(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),

        _ => None,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Sorts records in place by one ordering.
///
/// The sort is stable: records whose values compare equal keep their
/// relative order, so sorting twice by the same ordering changes nothing.
pub fn sort_records(records: &mut [Record], order: &OrderBy) {
    records.sort_by(|a, b| order.compare_records(a, b));
}
