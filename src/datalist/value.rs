//! Dynamic values held by flattened records.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One flattened record: attribute name to value. Absent keys carry no value.
pub type Record = BTreeMap<String, Value>;

/// Values of the extra query attributes declared by a list data source.
pub type ExtraParams = BTreeMap<String, Value>;

/// A single attribute value inside a flattened record.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    String(String),
    /// Ordered collection (lists and sets).
    List(Vec<Value>),
    /// Nested string-keyed mapping.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the text payload when the value is a string.
    #[must_use]
    pub const fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Returns the elements when the value is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Name of the variant, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Int(number) => write!(f, "{number}"),
            Self::Float(number) => write!(f, "{number}"),
            Self::String(text) => f.write_str(text),
            Self::List(_) | Self::Map(_) => {
                let rendered = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&rendered)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Numeric view over int and float values so mixed comparisons stay numeric.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub(crate) const fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(number) => Some(Self::Int(*number)),
            Value::Float(number) => Some(Self::Float(*number)),
            Value::Bool(_) | Value::String(_) | Value::List(_) | Value::Map(_) => None,
        }
    }

    /// Ordering used by filters; `None` when a NaN is involved.
    pub(crate) fn compare(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(lhs), Self::Int(rhs)) => Some(lhs.cmp(&rhs)),
            (Self::Float(lhs), Self::Float(rhs)) => lhs.partial_cmp(&rhs),
            (Self::Int(lhs), Self::Float(rhs)) => compare_int_float(lhs, rhs),
            (Self::Float(lhs), Self::Int(rhs)) => {
                compare_int_float(rhs, lhs).map(Ordering::reverse)
            }
        }
    }

    /// Total ordering used by sorts. Agrees with [`f64::total_cmp`] among
    /// floats: NaNs sit at the ends by sign and `-0.0` sorts below `0`.
    pub(crate) fn sort_order(self, other: Self) -> Ordering {
        match (self, other) {
            (Self::Int(lhs), Self::Int(rhs)) => lhs.cmp(&rhs),
            (Self::Float(lhs), Self::Float(rhs)) => lhs.total_cmp(&rhs),
            (Self::Int(lhs), Self::Float(rhs)) => sort_int_float(lhs, rhs),
            (Self::Float(lhs), Self::Int(rhs)) => sort_int_float(rhs, lhs).reverse(),
        }
    }
}

/// `2^63`, the first float above every `i64`.
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;
/// `-2^63`, equal to `i64::MIN`.
const I64_LOWER_BOUND: f64 = -9_223_372_036_854_775_808.0;

/// Exact ordering of `int` against `float` without rounding the integer.
fn compare_int_float(int: i64, float: f64) -> Option<Ordering> {
    if float.is_nan() {
        return None;
    }
    if float >= I64_UPPER_BOUND {
        return Some(Ordering::Less);
    }
    if float < I64_LOWER_BOUND {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc();
    #[expect(
        clippy::cast_possible_truncation,
        reason = "whole is integral and within the i64 range"
    )]
    let whole_int = whole as i64;
    Some(int.cmp(&whole_int).then_with(|| {
        if float > whole {
            Ordering::Less
        } else if float < whole {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }))
}

fn sort_int_float(int: i64, float: f64) -> Ordering {
    match compare_int_float(int, float) {
        None if float.is_sign_negative() => Ordering::Greater,
        None => Ordering::Less,
        Some(Ordering::Equal) if float.is_sign_negative() => Ordering::Greater,
        Some(ordering) => ordering,
    }
}
