//! Generic filterable, sortable list data sources.
//!
//! A concrete list data source supplies a [`RecordSchema`], a result
//! attribute name, and a [`RecordSource`] that fetches raw records and
//! flattens each into a [`Record`]. [`ListDataSource`] derives the `filter`
//! and `sort` blocks from the record schema and, on every read, fetches,
//! flattens, filters, and sorts the records before handing back a
//! [`ListState`]. Nothing is cached between reads.

pub mod filter;
pub mod schema;
pub mod sort;
pub mod value;

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub use filter::{
    Filter, FilterError, FilterSpec, MATCH_BY_NUMBER_COMPARISON, MATCH_BY_STRING_COMPARISON,
    MatchBy, Matcher, apply_filters, expand_filter_values, expand_filters,
};
pub use schema::{
    DataSourceSchema, Element, FILTER_ATTRIBUTE, FieldSchema, FieldType, RecordSchema,
    SORT_ATTRIBUTE, filter_schema, sort_schema,
};
pub use sort::{Direction, SORT_DIRECTIONS, Sort, SortError, SortSpec, apply_sorts, expand_sorts};
pub use value::{ExtraParams, Record, Value};

/// Name of the identifier attribute assigned on every read.
pub const ID_ATTRIBUTE: &str = "id";

/// Future returned by [`RecordSource::get_records`].
pub type SourceFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Fetches and flattens the records a list data source operates on.
pub trait RecordSource {
    /// Provider state handed to every call (typically an API client).
    type Meta: ?Sized + Sync;
    /// Raw domain object returned by the API.
    type Record;
    /// Error raised by fetching or flattening.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns every record the data source should operate on.
    fn get_records<'a>(
        &'a self,
        meta: &'a Self::Meta,
        extra: &'a ExtraParams,
    ) -> SourceFuture<'a, Vec<Self::Record>, Self::Error>;

    /// Flattens one raw record into filterable attributes.
    ///
    /// # Errors
    ///
    /// Returns the source error when the record cannot be represented.
    fn flatten_record(
        &self,
        record: &Self::Record,
        meta: &Self::Meta,
        extra: &ExtraParams,
    ) -> Result<Record, Self::Error>;
}

/// Declaration of one list data source.
#[derive(Clone, Debug)]
pub struct ListResourceConfig<S> {
    /// Attributes of a single record.
    pub record_schema: RecordSchema,
    /// Attribute through which results are exposed.
    pub result_attribute_name: String,
    /// Documentation of the result attribute.
    pub result_attribute_description: String,
    /// Fetch and flatten callbacks.
    pub source: S,
    /// Extra query parameters exposed alongside `filter` and `sort`.
    pub extra_query_schema: BTreeMap<String, FieldSchema>,
}

impl<S> ListResourceConfig<S> {
    /// Starts a configuration with no description and no extra parameters.
    #[must_use]
    pub fn new(
        record_schema: RecordSchema,
        result_attribute_name: impl Into<String>,
        source: S,
    ) -> Self {
        Self {
            record_schema,
            result_attribute_name: result_attribute_name.into(),
            result_attribute_description: String::new(),
            source,
            extra_query_schema: BTreeMap::new(),
        }
    }

    /// Sets the result attribute description.
    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.result_attribute_description = description.into();
        self
    }

    /// Declares an extra query parameter.
    #[must_use]
    pub fn with_extra_query_field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.extra_query_schema.insert(name.into(), field);
        self
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.result_attribute_name.is_empty() {
            return Err(ConfigurationError::MissingResultAttributeName);
        }
        let reserved = [FILTER_ATTRIBUTE, SORT_ATTRIBUTE, ID_ATTRIBUTE];
        if reserved.contains(&self.result_attribute_name.as_str()) {
            return Err(ConfigurationError::ReservedName {
                name: self.result_attribute_name.clone(),
            });
        }
        if let Some(name) = self.extra_query_schema.keys().find(|name| {
            reserved.contains(&name.as_str()) || **name == self.result_attribute_name
        }) {
            return Err(ConfigurationError::ReservedName { name: name.clone() });
        }
        Ok(())
    }
}

/// Errors raised by an unusable list data source declaration.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigurationError {
    /// The result attribute name is empty.
    #[error("ResultAttributeName must be specified")]
    MissingResultAttributeName,
    /// A declared attribute collides with one the engine manages.
    #[error("attribute '{name}' collides with a reserved attribute")]
    ReservedName {
        /// Colliding attribute name.
        name: String,
    },
}

/// The user's query: filter blocks, sort blocks, and extra parameters.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Query {
    /// Filter blocks; a set, so duplicates collapse.
    #[serde(default)]
    pub filter: Vec<FilterSpec>,
    /// Sort blocks, primary key first.
    #[serde(default)]
    pub sort: Vec<SortSpec>,
    /// Extra query parameters keyed by attribute name.
    #[serde(default, flatten)]
    pub extra: ExtraParams,
}

impl Query {
    /// Empty query: every record, in fetch order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter block.
    #[must_use]
    pub fn filter(mut self, spec: FilterSpec) -> Self {
        self.filter.push(spec);
        self
    }

    /// Adds a sort block.
    #[must_use]
    pub fn sort(mut self, spec: SortSpec) -> Self {
        self.sort.push(spec);
        self
    }

    /// Sets an extra query parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// Errors raised when a query does not conform to the data source schema.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum QueryError {
    /// A filter names an attribute outside the filter allow-list.
    #[error("filter attribute '{attribute}' must be one of: {}", allowed.join(", "))]
    FilterAttribute {
        /// Attribute supplied by the user.
        attribute: String,
        /// Filterable attributes.
        allowed: Vec<String>,
    },
    /// A sort names an attribute outside the sort allow-list.
    #[error("sort attribute '{attribute}' must be one of: {}", allowed.join(", "))]
    SortAttribute {
        /// Attribute supplied by the user.
        attribute: String,
        /// Sortable attributes.
        allowed: Vec<String>,
    },
    /// An extra parameter is not declared by the data source.
    #[error("unsupported query parameter '{name}'")]
    UnknownParameter {
        /// Parameter supplied by the user.
        name: String,
    },
    /// A required extra parameter is missing.
    #[error("missing required query parameter '{name}'")]
    MissingParameter {
        /// Declared parameter name.
        name: String,
    },
    /// An extra parameter has the wrong type.
    #[error("query parameter '{name}' expects {expected}, got {actual}")]
    ParameterType {
        /// Declared parameter name.
        name: String,
        /// Declared type.
        expected: &'static str,
        /// Supplied value kind.
        actual: &'static str,
    },
    /// An extra parameter is outside its allow-list.
    #[error("query parameter '{name}' does not accept '{value}'")]
    ParameterValue {
        /// Declared parameter name.
        name: String,
        /// Rejected value.
        value: String,
    },
}

/// Errors surfaced by [`ListDataSource::read`]. Every error ends the read;
/// no partial results are returned.
#[derive(Debug, Error)]
pub enum ReadError<E>
where
    E: std::error::Error + 'static,
{
    /// The query failed schema validation.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// Fetching the records failed.
    #[error("Unable to load records: {0}")]
    Fetch(#[source] E),
    /// Flattening a record failed.
    #[error("{0}")]
    Flatten(#[source] E),
    /// A filter block could not be expanded.
    #[error(transparent)]
    Filter(#[from] FilterError),
    /// A sort block could not be expanded.
    #[error(transparent)]
    Sort(#[from] SortError),
}

/// State written by one read.
#[derive(Clone, Debug, PartialEq)]
pub struct ListState {
    /// Fresh identifier of this read.
    pub id: String,
    /// Attribute under which `results` are exposed.
    pub result_attribute_name: String,
    /// Query the results were produced for, with defaults applied.
    pub query: Query,
    /// Filtered and sorted records.
    pub results: Vec<Record>,
}

impl ListState {
    /// Renders the state document: `id`, `filter`, `sort`, extra parameters,
    /// and the results under the result attribute name.
    ///
    /// # Errors
    ///
    /// Returns the serialiser error when a value cannot be represented in
    /// JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for ListState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.query.extra.len() + 4))?;
        map.serialize_entry(ID_ATTRIBUTE, &self.id)?;
        map.serialize_entry(FILTER_ATTRIBUTE, &self.query.filter)?;
        map.serialize_entry(SORT_ATTRIBUTE, &self.query.sort)?;
        for (name, value) in &self.query.extra {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(&self.result_attribute_name, &self.results)?;
        map.end()
    }
}

/// Checks that `value` can populate an attribute of `field_type`.
const fn value_fits(field_type: &FieldType, value: &Value) -> bool {
    matches!(
        (field_type, value),
        (FieldType::String, Value::String(_))
            | (FieldType::Bool, Value::Bool(_))
            | (FieldType::Int, Value::Int(_))
            | (FieldType::Float, Value::Int(_) | Value::Float(_))
            | (FieldType::List(_) | FieldType::Set(_), Value::List(_))
            | (FieldType::Map(_), Value::Map(_))
    )
}

/// A list data source assembled from a [`ListResourceConfig`].
#[derive(Clone, Debug)]
pub struct ListDataSource<S> {
    config: ListResourceConfig<S>,
    schema: DataSourceSchema,
    filter_attributes: Vec<String>,
    sort_attributes: Vec<String>,
}

impl<S: RecordSource> ListDataSource<S> {
    /// Assembles the data source.
    ///
    /// # Panics
    ///
    /// Panics when the configuration is invalid (for example an empty result
    /// attribute name): such a declaration can never serve a read.
    #[must_use]
    pub fn new(config: ListResourceConfig<S>) -> Self {
        Self::try_new(config).unwrap_or_else(|err| {
            panic!("datalist::ListDataSource::new: invalid resource configuration: {err}")
        })
    }

    /// Assembles the data source, reporting configuration errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the result attribute name is empty
    /// or an attribute collides with `filter`, `sort`, or `id`.
    pub fn try_new(config: ListResourceConfig<S>) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let record_schema = config.record_schema.computed_copy();
        let filter_attributes = record_schema.filter_attributes();
        let sort_attributes = record_schema.sort_attributes();

        let mut attributes = BTreeMap::new();
        attributes.insert(
            FILTER_ATTRIBUTE.to_owned(),
            filter_schema(filter_attributes.clone()),
        );
        attributes.insert(
            SORT_ATTRIBUTE.to_owned(),
            sort_schema(sort_attributes.clone()),
        );
        attributes.insert(
            ID_ATTRIBUTE.to_owned(),
            FieldSchema::string()
                .computed()
                .described("Identifier of the last read"),
        );
        attributes.insert(
            config.result_attribute_name.clone(),
            FieldSchema::list_of_blocks(record_schema)
                .computed()
                .described(config.result_attribute_description.clone()),
        );
        for (name, field) in &config.extra_query_schema {
            attributes.insert(name.clone(), field.clone());
        }

        Ok(Self {
            config,
            schema: DataSourceSchema::new(attributes),
            filter_attributes,
            sort_attributes,
        })
    }

    /// Assembled top-level schema.
    #[must_use]
    pub const fn schema(&self) -> &DataSourceSchema {
        &self.schema
    }

    /// Declaration the data source was built from.
    #[must_use]
    pub const fn config(&self) -> &ListResourceConfig<S> {
        &self.config
    }

    /// Attributes accepted by `filter.attribute`.
    #[must_use]
    pub fn filter_attributes(&self) -> &[String] {
        &self.filter_attributes
    }

    /// Attributes accepted by `sort.attribute`.
    #[must_use]
    pub fn sort_attributes(&self) -> &[String] {
        &self.sort_attributes
    }

    /// Checks a query against the schema and returns the extra parameters
    /// with defaults applied.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when a filter or sort names an attribute outside
    /// its allow-list, or an extra parameter is undeclared, missing, mistyped,
    /// or not allowed.
    pub fn validate_query(&self, query: &Query) -> Result<ExtraParams, QueryError> {
        if let Some(spec) = query
            .filter
            .iter()
            .find(|spec| !self.filter_attributes.contains(&spec.attribute))
        {
            return Err(QueryError::FilterAttribute {
                attribute: spec.attribute.clone(),
                allowed: self.filter_attributes.clone(),
            });
        }
        if let Some(spec) = query
            .sort
            .iter()
            .find(|spec| !self.sort_attributes.contains(&spec.attribute))
        {
            return Err(QueryError::SortAttribute {
                attribute: spec.attribute.clone(),
                allowed: self.sort_attributes.clone(),
            });
        }
        if let Some(name) = query
            .extra
            .keys()
            .find(|name| !self.config.extra_query_schema.contains_key(*name))
        {
            return Err(QueryError::UnknownParameter { name: name.clone() });
        }

        let mut extra = ExtraParams::new();
        for (name, field) in &self.config.extra_query_schema {
            let Some(value) = query.extra.get(name).or_else(|| field.default.as_ref()) else {
                if field.required {
                    return Err(QueryError::MissingParameter { name: name.clone() });
                }
                continue;
            };
            if !value_fits(&field.field_type, value) {
                return Err(QueryError::ParameterType {
                    name: name.clone(),
                    expected: field.field_type.name(),
                    actual: value.kind(),
                });
            }
            if let Some(text) = value.as_str().filter(|text| !field.allows(text)) {
                return Err(QueryError::ParameterValue {
                    name: name.clone(),
                    value: text.to_owned(),
                });
            }
            extra.insert(name.clone(), value.clone());
        }
        Ok(extra)
    }

    /// Runs one read: validate, fetch, flatten, filter, sort, and stamp a
    /// fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError`] on the first failure; fetch and flatten errors
    /// are passed through from the source.
    pub async fn read(
        &self,
        meta: &S::Meta,
        query: Query,
    ) -> Result<ListState, ReadError<S::Error>> {
        let name = self.config.result_attribute_name.as_str();
        let extra = self.validate_query(&query)?;

        let raw_records = self
            .config
            .source
            .get_records(meta, &extra)
            .await
            .map_err(ReadError::Fetch)?;
        debug!(data_source = name, count = raw_records.len(), "fetched records");

        let mut records = raw_records
            .iter()
            .map(|raw| self.config.source.flatten_record(raw, meta, &extra))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ReadError::Flatten)?;

        let mut filter_specs: Vec<FilterSpec> = Vec::with_capacity(query.filter.len());
        for spec in &query.filter {
            if !filter_specs.contains(spec) {
                filter_specs.push(spec.clone());
            }
        }
        if !filter_specs.is_empty() {
            let filters = expand_filters(&self.config.record_schema, &filter_specs)?;
            records = apply_filters(records, &filters);
        }

        if !query.sort.is_empty() {
            let sorts = expand_sorts(&self.config.record_schema, &query.sort)?;
            records = apply_sorts(records, &sorts);
        }

        let id = format!("datalist-{}", Uuid::new_v4().simple());
        debug!(data_source = name, id = %id, count = records.len(), "read complete");

        Ok(ListState {
            id,
            result_attribute_name: self.config.result_attribute_name.clone(),
            query: Query {
                filter: filter_specs,
                sort: query.sort,
                extra,
            },
            results: records,
        })
    }
}
