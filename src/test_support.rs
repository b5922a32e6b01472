//! Test support utilities shared across unit and integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::datalist::{ExtraParams, Record, RecordSource, SourceFuture, Value};

/// Error raised by [`ScriptedSource`] when a failure has been scripted.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{0}")]
pub struct ScriptedSourceError(pub String);

/// Record source that serves pre-seeded records and counts every call.
///
/// Raw records are already flat, so flattening clones them unless a failure
/// has been scripted for that position.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    records: Vec<Record>,
    fetch_failure: Option<String>,
    flatten_failure: Option<(usize, String)>,
    fetch_calls: Arc<AtomicUsize>,
    flatten_calls: Arc<AtomicUsize>,
    seen_extra: Arc<Mutex<VecDeque<ExtraParams>>>,
}

impl ScriptedSource {
    /// Creates a source serving `records` in order.
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Makes every fetch fail with `message`.
    #[must_use]
    pub fn failing_fetch(mut self, message: impl Into<String>) -> Self {
        self.fetch_failure = Some(message.into());
        self
    }

    /// Makes flattening the record at `index` fail with `message`.
    #[must_use]
    pub fn failing_flatten(mut self, index: usize, message: impl Into<String>) -> Self {
        self.flatten_failure = Some((index, message.into()));
        self
    }

    /// Number of fetches performed so far.
    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of flatten calls performed so far.
    #[must_use]
    pub fn flatten_calls(&self) -> usize {
        self.flatten_calls.load(Ordering::SeqCst)
    }

    /// Extra parameters handed to each fetch, oldest first.
    #[must_use]
    pub fn seen_extra(&self) -> Vec<ExtraParams> {
        self.seen_extra
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl RecordSource for ScriptedSource {
    type Meta = ();
    type Record = (usize, Record);
    type Error = ScriptedSourceError;

    fn get_records<'a>(
        &'a self,
        _meta: &'a Self::Meta,
        extra: &'a ExtraParams,
    ) -> SourceFuture<'a, Vec<Self::Record>, Self::Error> {
        Box::pin(async move {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.seen_extra
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(extra.clone());
            if let Some(message) = &self.fetch_failure {
                return Err(ScriptedSourceError(message.clone()));
            }
            Ok(self.records.iter().cloned().enumerate().collect())
        })
    }

    fn flatten_record(
        &self,
        record: &Self::Record,
        _meta: &Self::Meta,
        _extra: &ExtraParams,
    ) -> Result<Record, Self::Error> {
        self.flatten_calls.fetch_add(1, Ordering::SeqCst);
        let (index, fields) = record;
        match &self.flatten_failure {
            Some((failing, message)) if failing == index => {
                Err(ScriptedSourceError(message.clone()))
            }
            _ => Ok(fields.clone()),
        }
    }
}

/// Builds a record from `(attribute, value)` pairs.
#[must_use]
pub fn record<I, K, V>(fields: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    fields
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}

/// Builds records holding only a `name` string attribute.
#[must_use]
pub fn named_records(names: &[&str]) -> Vec<Record> {
    names
        .iter()
        .map(|name| record([("name", *name)]))
        .collect()
}

/// Reads the `name` attribute of every record, in order.
#[must_use]
pub fn record_names(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.get("name").and_then(Value::as_str))
        .map(str::to_owned)
        .collect()
}
