//! Multi-key ordering of flattened records.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::schema::RecordSchema;
use super::value::{Number, Record, Value};

/// Accepted `direction` literals.
pub const SORT_DIRECTIONS: [&str; 2] = ["asc", "desc"];

/// Sort direction of one key.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Direction {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl Direction {
    /// Wire name of the direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = SortError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else if value.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else {
            Err(SortError::InvalidDirection {
                direction: value.to_owned(),
            })
        }
    }
}

impl TryFrom<String> for Direction {
    type Error = SortError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A `sort` block as written by the user.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SortSpec {
    /// Record attribute to sort by (case-sensitive).
    pub attribute: String,
    /// Direction for this key; ascending when omitted.
    #[serde(default)]
    pub direction: Direction,
}

impl SortSpec {
    /// Ascending sort on `attribute`.
    #[must_use]
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: Direction::Asc,
        }
    }

    /// Descending sort on `attribute`.
    #[must_use]
    pub fn desc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: Direction::Desc,
        }
    }
}

/// Errors raised while expanding sort blocks.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SortError {
    /// The attribute is not declared by the record schema.
    #[error("field '{attribute}' does not exist in record schema")]
    UnknownAttribute {
        /// Attribute named by the sort.
        attribute: String,
    },
    /// The attribute is not a string, bool, int, or float.
    #[error("field '{attribute}' of type {field_type} cannot be sorted")]
    NotSortable {
        /// Attribute named by the sort.
        attribute: String,
        /// Declared type of the attribute.
        field_type: &'static str,
    },
    /// The direction literal is neither `asc` nor `desc`.
    #[error("invalid sort direction '{direction}', expected asc or desc")]
    InvalidDirection {
        /// Literal supplied by the user.
        direction: String,
    },
}

/// A validated sort key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sort {
    attribute: String,
    direction: Direction,
}

impl Sort {
    /// Attribute the key reads.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Direction of the key.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

/// Validates sort blocks against the record schema.
///
/// # Errors
///
/// Returns [`SortError`] when an attribute is undeclared or not primitive.
pub fn expand_sorts(record_schema: &RecordSchema, specs: &[SortSpec]) -> Result<Vec<Sort>, SortError> {
    specs
        .iter()
        .map(|spec| {
            let field =
                record_schema
                    .get(&spec.attribute)
                    .ok_or_else(|| SortError::UnknownAttribute {
                        attribute: spec.attribute.clone(),
                    })?;
            if !field.field_type.is_primitive() {
                return Err(SortError::NotSortable {
                    attribute: spec.attribute.clone(),
                    field_type: field.field_type.name(),
                });
            }
            Ok(Sort {
                attribute: spec.attribute.clone(),
                direction: spec.direction,
            })
        })
        .collect()
}

/// Rank used when two values of different kinds meet in one column.
const fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Int(_) | Value::Float(_) => 1,
        Value::String(_) => 2,
        Value::List(_) => 3,
        Value::Map(_) => 4,
    }
}

/// Three-way comparison of two attribute values. Missing values sort before
/// present ones.
fn compare_values(lhs: Option<&Value>, rhs: Option<&Value>) -> Ordering {
    let (lhs_value, rhs_value) = match (lhs, rhs) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(left), Some(right)) => (left, right),
    };
    match (lhs_value, rhs_value) {
        (Value::String(left), Value::String(right)) => left.cmp(right),
        (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
        _ => match (Number::from_value(lhs_value), Number::from_value(rhs_value)) {
            (Some(left), Some(right)) => left.sort_order(right),
            _ => kind_rank(lhs_value).cmp(&kind_rank(rhs_value)),
        },
    }
}

/// Compares two records key by key; the first non-equal key decides.
fn compare_records(lhs: &Record, rhs: &Record, sorts: &[Sort]) -> Ordering {
    sorts
        .iter()
        .map(|sort| {
            let ordering = compare_values(lhs.get(&sort.attribute), rhs.get(&sort.attribute));
            match sort.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Orders records by the sort keys. The sort is stable: records equal on
/// every key keep their input order.
#[must_use]
pub fn apply_sorts(mut records: Vec<Record>, sorts: &[Sort]) -> Vec<Record> {
    records.sort_by(|lhs, rhs| compare_records(lhs, rhs, sorts));
    debug!(keys = sorts.len(), records = records.len(), "applied sort");
    records
}
