//! Attribute schemas for list data sources and the flattened records they
//! expose.

use std::collections::BTreeMap;

use serde::Serialize;

use super::filter::{MATCH_BY_NUMBER_COMPARISON, MATCH_BY_STRING_COMPARISON};
use super::sort::SORT_DIRECTIONS;
use super::value::Value;

/// Name of the `filter` block on every list data source.
pub const FILTER_ATTRIBUTE: &str = "filter";

/// Name of the `sort` block on every list data source.
pub const SORT_ATTRIBUTE: &str = "sort";

/// Type tag of a schema attribute.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "element", rename_all = "snake_case")]
pub enum FieldType {
    /// Text attribute.
    String,
    /// Boolean attribute.
    Bool,
    /// Integer attribute.
    Int,
    /// Floating point attribute.
    Float,
    /// Ordered collection of elements.
    List(Element),
    /// Unordered collection of unique elements.
    Set(Element),
    /// String-keyed mapping.
    Map(Element),
}

impl FieldType {
    /// Returns true for string, bool, int, and float.
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(self, Self::String | Self::Bool | Self::Int | Self::Float)
    }

    /// Returns the element descriptor of a container type.
    #[must_use]
    pub const fn element(&self) -> Option<&Element> {
        match self {
            Self::List(element) | Self::Set(element) | Self::Map(element) => Some(element),
            Self::String | Self::Bool | Self::Int | Self::Float => None,
        }
    }

    /// Human readable name of the type tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
        }
    }
}

/// Element descriptor of a container attribute.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    /// Single-level element type.
    Schema(Box<FieldSchema>),
    /// Nested block with its own attributes.
    Resource(RecordSchema),
}

/// Declaration of one attribute.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldSchema {
    /// Type tag of the attribute.
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Documentation shown to users.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// The attribute must be supplied.
    pub required: bool,
    /// The attribute may be supplied.
    pub optional: bool,
    /// The attribute is populated by the data source.
    pub computed: bool,
    /// Value used when the attribute is omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Case-sensitive allow-list for string attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

impl FieldSchema {
    /// Creates an attribute of the given type with no flags set.
    #[must_use]
    pub const fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            description: String::new(),
            required: false,
            optional: false,
            computed: false,
            default: None,
            allowed_values: None,
        }
    }

    /// Text attribute.
    #[must_use]
    pub const fn string() -> Self {
        Self::new(FieldType::String)
    }

    /// Boolean attribute.
    #[must_use]
    pub const fn bool() -> Self {
        Self::new(FieldType::Bool)
    }

    /// Integer attribute.
    #[must_use]
    pub const fn int() -> Self {
        Self::new(FieldType::Int)
    }

    /// Floating point attribute.
    #[must_use]
    pub const fn float() -> Self {
        Self::new(FieldType::Float)
    }

    /// List whose elements follow `element`.
    #[must_use]
    pub fn list_of(element: Self) -> Self {
        Self::new(FieldType::List(Element::Schema(Box::new(element))))
    }

    /// Set whose elements follow `element`.
    #[must_use]
    pub fn set_of(element: Self) -> Self {
        Self::new(FieldType::Set(Element::Schema(Box::new(element))))
    }

    /// Map whose values follow `element`.
    #[must_use]
    pub fn map_of(element: Self) -> Self {
        Self::new(FieldType::Map(Element::Schema(Box::new(element))))
    }

    /// List of nested blocks.
    #[must_use]
    pub const fn list_of_blocks(block: RecordSchema) -> Self {
        Self::new(FieldType::List(Element::Resource(block)))
    }

    /// Set of nested blocks.
    #[must_use]
    pub const fn set_of_blocks(block: RecordSchema) -> Self {
        Self::new(FieldType::Set(Element::Resource(block)))
    }

    /// Sets the description.
    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks the attribute as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the attribute as optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Marks the attribute as computed.
    #[must_use]
    pub const fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restricts the attribute to the given case-sensitive values.
    #[must_use]
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Returns true when `value` passes the allow-list, or when there is none.
    #[must_use]
    pub fn allows(&self, value: &str) -> bool {
        self.allowed_values
            .as_ref()
            .is_none_or(|allowed| allowed.iter().any(|candidate| candidate == value))
    }
}

/// Attribute declarations of a single flattened record.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordSchema(BTreeMap<String, FieldSchema>);

impl RecordSchema {
    /// Creates an empty schema.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds or replaces a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.0.insert(name.into(), field);
        self
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.0.get(name)
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSchema)> {
        self.0.iter()
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no field is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every field that is not a map may be filtered on.
    #[must_use]
    pub fn filter_attributes(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, field)| !matches!(field.field_type, FieldType::Map(_)))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Only primitive fields may be sorted on.
    #[must_use]
    pub fn sort_attributes(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, field)| field.field_type.is_primitive())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Read-only copy used for the result attribute: every field becomes
    /// computed and loses its required/optional flags.
    #[must_use]
    pub fn computed_copy(&self) -> Self {
        self.0
            .iter()
            .map(|(name, field)| {
                let mut copy = field.clone();
                copy.computed = true;
                copy.required = false;
                copy.optional = false;
                (name.clone(), copy)
            })
            .collect()
    }
}

impl FromIterator<(String, FieldSchema)> for RecordSchema {
    fn from_iter<T: IntoIterator<Item = (String, FieldSchema)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Top-level attributes of an assembled list data source.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DataSourceSchema {
    attributes: BTreeMap<String, FieldSchema>,
}

impl DataSourceSchema {
    pub(crate) const fn new(attributes: BTreeMap<String, FieldSchema>) -> Self {
        Self { attributes }
    }

    /// Looks up a top-level attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.attributes.get(name)
    }

    /// Looks up an attribute of the nested block behind `block`.
    #[must_use]
    pub fn block_field(&self, block: &str, name: &str) -> Option<&FieldSchema> {
        match self.get(block)?.field_type.element()? {
            Element::Resource(fields) => fields.get(name),
            Element::Schema(_) => None,
        }
    }

    /// Iterates top-level attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSchema)> {
        self.attributes.iter()
    }
}

/// Builds the `filter` block, restricting `attribute` to `allowed_attributes`.
#[must_use]
pub fn filter_schema(allowed_attributes: Vec<String>) -> FieldSchema {
    let match_modes = MATCH_BY_NUMBER_COMPARISON
        .iter()
        .chain(MATCH_BY_STRING_COMPARISON.iter())
        .map(|mode| mode.as_str());
    let block = RecordSchema::new()
        .with_field(
            "attribute",
            FieldSchema::string()
                .described("The attribute used to filter. Filter attributes are case-sensitive")
                .required()
                .one_of(allowed_attributes),
        )
        .with_field(
            "values",
            FieldSchema::list_of(FieldSchema::string())
                .described(concat!(
                    "The filter values. Filter values are case-sensitive. If you specify ",
                    "multiple values for a filter, the values are joined with an OR by ",
                    "default, and the request returns all results that match any of the ",
                    "specified values"
                ))
                .required(),
        )
        .with_field(
            "all",
            FieldSchema::bool()
                .described(concat!(
                    "If is set to true, the values are joined with an AND, and the requests ",
                    "returns only the results that match all specified values"
                ))
                .optional()
                .with_default(false),
        )
        .with_field(
            "match_by",
            FieldSchema::string()
                .described(concat!(
                    "The type of comparison to apply. One of: in (default), re, substring, ",
                    "less_than, less_than_or_equal, greater_than, greater_than_or_equal"
                ))
                .optional()
                .with_default("in")
                .one_of(match_modes),
        );
    FieldSchema::set_of_blocks(block)
        .optional()
        .described("One or more attribute/values pairs on which to filter results")
}

/// Builds the `sort` block, restricting `attribute` to `allowed_attributes`.
#[must_use]
pub fn sort_schema(allowed_attributes: Vec<String>) -> FieldSchema {
    let block = RecordSchema::new()
        .with_field(
            "attribute",
            FieldSchema::string()
                .described("The attribute used to sort the results. Sort attributes are case-sensitive")
                .required()
                .one_of(allowed_attributes),
        )
        .with_field(
            "direction",
            FieldSchema::string()
                .described("Sort results in ascending or descending order. Strings are sorted in alphabetical order. One of: asc, desc")
                .optional()
                .one_of(SORT_DIRECTIONS.iter().copied()),
        );
    FieldSchema::list_of_blocks(block)
        .optional()
        .described("One or more attribute/direction pairs on which to sort results. If multiple sorts are provided, they will be applied in order")
}
