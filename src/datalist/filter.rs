//! Filter expansion and evaluation over flattened records.
//!
//! User-supplied filter values are strings. Each one is expanded once into a
//! typed [`Matcher`] chosen by the declared field type and the requested
//! `match_by` mode; records are then narrowed filter by filter.

use std::cmp::Ordering;
use std::fmt;
use std::num::{ParseFloatError, ParseIntError};
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::schema::{Element, FieldSchema, FieldType, RecordSchema};
use super::value::{Number, Record, Value};

/// Comparison applied between a record attribute and a filter value.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBy {
    /// Exact equality.
    #[default]
    In,
    /// Regular expression match on string attributes.
    Re,
    /// Substring match on string attributes.
    Substring,
    /// Attribute is strictly below the value.
    LessThan,
    /// Attribute is below or equal to the value.
    LessThanOrEqual,
    /// Attribute is strictly above the value.
    GreaterThan,
    /// Attribute is above or equal to the value.
    GreaterThanOrEqual,
}

/// Modes that compare text.
pub const MATCH_BY_STRING_COMPARISON: [MatchBy; 3] =
    [MatchBy::In, MatchBy::Re, MatchBy::Substring];

/// Modes that compare numbers and accept exactly one value.
pub const MATCH_BY_NUMBER_COMPARISON: [MatchBy; 4] = [
    MatchBy::LessThan,
    MatchBy::LessThanOrEqual,
    MatchBy::GreaterThan,
    MatchBy::GreaterThanOrEqual,
];

impl MatchBy {
    /// Wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Re => "re",
            Self::Substring => "substring",
            Self::LessThan => "less_than",
            Self::LessThanOrEqual => "less_than_or_equal",
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
        }
    }

    /// Ordering comparison behind a numeric mode.
    const fn comparison(self) -> Option<Comparison> {
        match self {
            Self::LessThan => Some(Comparison::LessThan),
            Self::LessThanOrEqual => Some(Comparison::LessThanOrEqual),
            Self::GreaterThan => Some(Comparison::GreaterThan),
            Self::GreaterThanOrEqual => Some(Comparison::GreaterThanOrEqual),
            Self::In | Self::Re | Self::Substring => None,
        }
    }

    /// Returns true for the `less_than` family.
    #[must_use]
    pub const fn is_numeric_comparison(self) -> bool {
        self.comparison().is_some()
    }
}

impl fmt::Display for MatchBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchBy {
    type Err = FilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        MATCH_BY_STRING_COMPARISON
            .iter()
            .chain(MATCH_BY_NUMBER_COMPARISON.iter())
            .copied()
            .find(|mode| mode.as_str() == value)
            .ok_or_else(|| FilterError::UnknownMatchBy {
                match_by: value.to_owned(),
            })
    }
}

/// A `filter` block as written by the user.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FilterSpec {
    /// Record attribute to filter on (case-sensitive).
    pub attribute: String,
    /// Raw filter values.
    pub values: Vec<String>,
    /// Join values with AND instead of OR.
    #[serde(default)]
    pub all: bool,
    /// Comparison to apply.
    #[serde(default)]
    pub match_by: MatchBy,
}

impl FilterSpec {
    /// Creates a filter with OR semantics and `in` matching.
    #[must_use]
    pub fn new<I, S>(attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attribute: attribute.into(),
            values: values.into_iter().map(Into::into).collect(),
            all: false,
            match_by: MatchBy::In,
        }
    }

    /// Joins the values with AND.
    #[must_use]
    pub const fn all(mut self) -> Self {
        self.all = true;
        self
    }

    /// Sets the comparison mode.
    #[must_use]
    pub const fn match_by(mut self, match_by: MatchBy) -> Self {
        self.match_by = match_by;
        self
    }
}

/// Errors raised while expanding filter blocks.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The attribute is not declared by the record schema.
    #[error("field '{attribute}' does not exist in record schema")]
    UnknownAttribute {
        /// Attribute named by the filter.
        attribute: String,
    },
    /// The attribute exists but cannot be filtered on.
    #[error("field '{attribute}' of type {field_type} cannot be filtered")]
    NotFilterable {
        /// Attribute named by the filter.
        attribute: String,
        /// Declared type of the attribute.
        field_type: &'static str,
    },
    /// The `match_by` literal is not a known mode.
    #[error("unknown match_by '{match_by}'")]
    UnknownMatchBy {
        /// Literal supplied by the user.
        match_by: String,
    },
    /// A numeric comparison was given zero or several values.
    #[error("field '{match_by}' works with only one value")]
    SingleValueRequired {
        /// Mode that requires a single value.
        match_by: MatchBy,
    },
    /// The mode does not apply to the attribute's type.
    #[error("field '{attribute}' of type {field_type} does not support match_by '{match_by}'")]
    UnsupportedComparison {
        /// Attribute named by the filter.
        attribute: String,
        /// Declared primitive type of the attribute.
        field_type: &'static str,
        /// Requested mode.
        match_by: MatchBy,
    },
    /// A container attribute whose element is itself a container.
    #[error("cannot filter on aggregate type with non-primitive type (field '{attribute}')")]
    NonPrimitiveElement {
        /// Attribute named by the filter.
        attribute: String,
    },
    /// A container attribute whose element is a nested block.
    #[error(
        "cannot filter on aggregate type with non-Schema element type (field '{attribute}')"
    )]
    NonSchemaElement {
        /// Attribute named by the filter.
        attribute: String,
    },
    /// The value is not a valid regular expression.
    #[error("unable to parse value for field '{attribute}' as regular expression: {value}: {source}")]
    InvalidPattern {
        /// Attribute named by the filter.
        attribute: String,
        /// Offending pattern.
        value: String,
        /// Compiler error.
        #[source]
        source: Box<regex::Error>,
    },
    /// The value is not a boolean literal.
    #[error("unable to parse value for field '{attribute}' as bool: {value}")]
    InvalidBool {
        /// Attribute named by the filter.
        attribute: String,
        /// Offending literal.
        value: String,
    },
    /// The value is not a base-10 integer.
    #[error("unable to parse value for field '{attribute}' as integer: {value}: {source}")]
    InvalidInt {
        /// Attribute named by the filter.
        attribute: String,
        /// Offending literal.
        value: String,
        /// Parser error.
        #[source]
        source: ParseIntError,
    },
    /// The value is not a floating point number.
    #[error("unable to parse value for field '{attribute}' as floating point: {value}: {source}")]
    InvalidFloat {
        /// Attribute named by the filter.
        attribute: String,
        /// Offending literal.
        value: String,
        /// Parser error.
        #[source]
        source: ParseFloatError,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Comparison {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Comparison {
    const fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::LessThan => ordering.is_lt(),
            Self::LessThanOrEqual => ordering.is_le(),
            Self::GreaterThan => ordering.is_gt(),
            Self::GreaterThanOrEqual => ordering.is_ge(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Primitive {
    String,
    Bool,
    Int,
    Float,
}

impl Primitive {
    const fn of(field_type: &FieldType) -> Option<Self> {
        match field_type {
            FieldType::String => Some(Self::String),
            FieldType::Bool => Some(Self::Bool),
            FieldType::Int => Some(Self::Int),
            FieldType::Float => Some(Self::Float),
            FieldType::List(_) | FieldType::Set(_) | FieldType::Map(_) => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
        }
    }
}

/// Typed comparison target produced from one filter value.
#[derive(Clone, Debug)]
pub enum Matcher {
    /// Exact text equality.
    Text(String),
    /// Exact boolean equality.
    Bool(bool),
    /// Numeric equality.
    Equals(NumberValue),
    /// Text contains the needle.
    Substring(String),
    /// Text matches the compiled expression.
    Pattern(Regex),
    /// Numeric ordering against the target.
    Compare(NumberComparison),
}

/// Number parsed from a filter value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NumberValue(Number);

/// Ordered numeric comparison produced by the `less_than` family.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NumberComparison {
    comparison: Comparison,
    target: Number,
}

impl Matcher {
    /// Tests a single (non-container) attribute value.
    fn matches_scalar(&self, value: &Value) -> bool {
        match self {
            Self::Text(expected) => value.as_str() == Some(expected.as_str()),
            Self::Bool(expected) => matches!(value, Value::Bool(actual) if actual == expected),
            Self::Equals(NumberValue(expected)) => Number::from_value(value)
                .and_then(|actual| actual.compare(*expected))
                .is_some_and(Ordering::is_eq),
            Self::Substring(needle) => value
                .as_str()
                .is_some_and(|text| text.contains(needle.as_str())),
            Self::Pattern(pattern) => value.as_str().is_some_and(|text| pattern.is_match(text)),
            Self::Compare(NumberComparison { comparison, target }) => Number::from_value(value)
                .and_then(|actual| actual.compare(*target))
                .is_some_and(|ordering| comparison.accepts(ordering)),
        }
    }

    /// Tests an attribute value; list and set values match when any element
    /// does. Absent values never match.
    #[must_use]
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Map(_)) => false,
            Some(Value::List(items)) => items.iter().any(|item| self.matches_scalar(item)),
            Some(scalar) => self.matches_scalar(scalar),
        }
    }
}

/// A filter block whose values have been expanded against the record schema.
#[derive(Clone, Debug)]
pub struct Filter {
    attribute: String,
    matchers: Vec<Matcher>,
    all: bool,
    match_by: MatchBy,
}

impl Filter {
    /// Attribute the filter applies to.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Mode the values were expanded for.
    #[must_use]
    pub const fn match_by(&self) -> MatchBy {
        self.match_by
    }

    /// Expanded values, in the order supplied.
    #[must_use]
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// OR across values by default, AND when `all` is set.
    #[must_use]
    pub fn accepts(&self, record: &Record) -> bool {
        let value = record.get(&self.attribute);
        if self.all {
            self.matchers.iter().all(|matcher| matcher.matches(value))
        } else {
            self.matchers.iter().any(|matcher| matcher.matches(value))
        }
    }
}

/// Parses booleans the way Terraform providers historically accepted them.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn expand_number(match_by: MatchBy, number: Number) -> Matcher {
    match match_by.comparison() {
        Some(comparison) => Matcher::Compare(NumberComparison {
            comparison,
            target: number,
        }),
        None => Matcher::Equals(NumberValue(number)),
    }
}

/// Expands one raw value for a primitive field.
fn expand_primitive_value(
    attribute: &str,
    value: &str,
    primitive: Primitive,
    match_by: MatchBy,
) -> Result<Matcher, FilterError> {
    match primitive {
        Primitive::String => match match_by {
            MatchBy::In => Ok(Matcher::Text(value.to_owned())),
            MatchBy::Substring => Ok(Matcher::Substring(value.to_owned())),
            MatchBy::Re => Regex::new(value)
                .map(Matcher::Pattern)
                .map_err(|err| FilterError::InvalidPattern {
                    attribute: attribute.to_owned(),
                    value: value.to_owned(),
                    source: Box::new(err),
                }),
            MatchBy::LessThan
            | MatchBy::LessThanOrEqual
            | MatchBy::GreaterThan
            | MatchBy::GreaterThanOrEqual => Err(FilterError::UnsupportedComparison {
                attribute: attribute.to_owned(),
                field_type: primitive.name(),
                match_by,
            }),
        },
        Primitive::Bool => parse_bool(value)
            .map(Matcher::Bool)
            .ok_or_else(|| FilterError::InvalidBool {
                attribute: attribute.to_owned(),
                value: value.to_owned(),
            }),
        Primitive::Int => value
            .parse::<i64>()
            .map(|number| expand_number(match_by, Number::Int(number)))
            .map_err(|err| FilterError::InvalidInt {
                attribute: attribute.to_owned(),
                value: value.to_owned(),
                source: err,
            }),
        Primitive::Float => value
            .parse::<f64>()
            .map(|number| expand_number(match_by, Number::Float(number)))
            .map_err(|err| FilterError::InvalidFloat {
                attribute: attribute.to_owned(),
                value: value.to_owned(),
                source: err,
            }),
    }
}

/// Resolves the primitive type values are compared as: the field's own type,
/// or the element type of a list or set.
fn comparison_type(attribute: &str, field: &FieldSchema) -> Result<Primitive, FilterError> {
    if let Some(primitive) = Primitive::of(&field.field_type) {
        return Ok(primitive);
    }
    let (FieldType::List(element) | FieldType::Set(element)) = &field.field_type else {
        return Err(FilterError::NotFilterable {
            attribute: attribute.to_owned(),
            field_type: field.field_type.name(),
        });
    };
    match element {
        Element::Schema(inner) => {
            Primitive::of(&inner.field_type).ok_or_else(|| FilterError::NonPrimitiveElement {
                attribute: attribute.to_owned(),
            })
        }
        Element::Resource(_) => Err(FilterError::NonSchemaElement {
            attribute: attribute.to_owned(),
        }),
    }
}

/// Expands the raw values of one filter for `field`.
///
/// # Errors
///
/// Returns [`FilterError`] when a value does not parse for the field's type,
/// when the mode does not apply to it, or when the field is an unsupported
/// aggregate.
pub fn expand_filter_values(
    attribute: &str,
    values: &[String],
    field: &FieldSchema,
    match_by: MatchBy,
) -> Result<Vec<Matcher>, FilterError> {
    let primitive = comparison_type(attribute, field)?;
    values
        .iter()
        .map(|value| expand_primitive_value(attribute, value, primitive, match_by))
        .collect()
}

/// Validates filter blocks against the record schema and expands their
/// values.
///
/// # Errors
///
/// Returns [`FilterError::UnknownAttribute`] for undeclared attributes,
/// [`FilterError::SingleValueRequired`] when a numeric comparison carries a
/// value count other than one, and any expansion error.
pub fn expand_filters(
    record_schema: &RecordSchema,
    specs: &[FilterSpec],
) -> Result<Vec<Filter>, FilterError> {
    specs
        .iter()
        .map(|spec| {
            let field =
                record_schema
                    .get(&spec.attribute)
                    .ok_or_else(|| FilterError::UnknownAttribute {
                        attribute: spec.attribute.clone(),
                    })?;
            let matchers = expand_filter_values(&spec.attribute, &spec.values, field, spec.match_by)?;
            if spec.match_by.is_numeric_comparison() && matchers.len() != 1 {
                return Err(FilterError::SingleValueRequired {
                    match_by: spec.match_by,
                });
            }
            Ok(Filter {
                attribute: spec.attribute.clone(),
                matchers,
                all: spec.all,
                match_by: spec.match_by,
            })
        })
        .collect()
}

/// Applies filters in order; a record must pass every filter. Relative order
/// is preserved.
#[must_use]
pub fn apply_filters(mut records: Vec<Record>, filters: &[Filter]) -> Vec<Record> {
    for filter in filters {
        let before = records.len();
        records.retain(|record| filter.accepts(record));
        debug!(
            attribute = filter.attribute(),
            match_by = %filter.match_by(),
            before,
            after = records.len(),
            "applied filter"
        );
    }
    records
}
