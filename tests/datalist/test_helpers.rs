//! Shared fixtures and helpers for list data source scenarios.

use std::cell::RefCell;

use equinix_datalist::datalist::{
    FieldSchema, ListDataSource, ListResourceConfig, Query, Record, RecordSchema, Value,
};
use equinix_datalist::test_support::{ScriptedSource, record};
use rstest::fixture;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReadOutcome {
    Success(Vec<String>),
    Failure(String),
}

/// Scenario state. Steps borrow the context and record progress through
/// interior mutability.
#[derive(Debug)]
pub struct DatalistContext {
    pub source: RefCell<ScriptedSource>,
    pub query: RefCell<Query>,
    pub outcome: RefCell<Option<ReadOutcome>>,
}

#[fixture]
pub fn datalist_context() -> DatalistContext {
    DatalistContext {
        source: RefCell::new(ScriptedSource::new(Vec::new())),
        query: RefCell::new(Query::new()),
        outcome: RefCell::new(None),
    }
}

pub fn server_schema() -> RecordSchema {
    RecordSchema::new()
        .with_field("name", FieldSchema::string())
        .with_field("size", FieldSchema::int())
        .with_field("tags", FieldSchema::set_of(FieldSchema::string()))
}

fn server(name: &str, size: i64, tags: &[&str]) -> Record {
    record([
        ("name", Value::from(name)),
        ("size", Value::from(size)),
        ("tags", Value::from(tags.to_vec())),
    ])
}

pub fn servers() -> Vec<Record> {
    vec![
        server("alpha", 8, &["arm"]),
        server("beta", 32, &["gpu", "x86"]),
        server("gamma", 16, &["x86"]),
        server("delta", 32, &["arm", "gpu"]),
    ]
}

pub fn data_source(source: ScriptedSource) -> ListDataSource<ScriptedSource> {
    ListDataSource::new(ListResourceConfig::new(server_schema(), "servers", source))
}

pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}
