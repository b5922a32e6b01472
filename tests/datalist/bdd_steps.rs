//! BDD step definitions for list data source reads.

use equinix_datalist::datalist::{FilterSpec, MatchBy, Query, SortSpec};
use equinix_datalist::test_support::{ScriptedSource, record_names};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{DatalistContext, ReadOutcome, data_source, servers, split_list};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn push_filter(datalist_context: &DatalistContext, spec: FilterSpec) {
    datalist_context
        .query
        .replace_with(|query| std::mem::take(query).filter(spec));
}

#[given("a catalogue of four servers")]
fn catalogue_of_servers(datalist_context: &DatalistContext) {
    datalist_context
        .source
        .replace(ScriptedSource::new(servers()));
}

#[given("a catalogue that fails with \"{message}\"")]
fn failing_catalogue(datalist_context: &DatalistContext, message: String) {
    datalist_context
        .source
        .replace(ScriptedSource::new(servers()).failing_fetch(message));
}

#[given("a filter on \"{attribute}\" matching \"{values}\"")]
fn filter_matching(datalist_context: &DatalistContext, attribute: String, values: String) {
    push_filter(
        datalist_context,
        FilterSpec::new(attribute, split_list(&values)),
    );
}

#[given("a filter on \"{attribute}\" requiring all of \"{values}\"")]
fn filter_requiring_all(datalist_context: &DatalistContext, attribute: String, values: String) {
    push_filter(
        datalist_context,
        FilterSpec::new(attribute, split_list(&values)).all(),
    );
}

#[given("a \"{mode}\" filter on \"{attribute}\" with \"{values}\"")]
fn filter_with_mode(
    datalist_context: &DatalistContext,
    mode: String,
    attribute: String,
    values: String,
) {
    let match_by: MatchBy = mode
        .parse()
        .unwrap_or_else(|err| panic!("scenario uses a known match_by: {err}"));
    push_filter(
        datalist_context,
        FilterSpec::new(attribute, split_list(&values)).match_by(match_by),
    );
}

#[given("a sort on \"{attribute}\" in \"{direction}\" order")]
fn sort_on(datalist_context: &DatalistContext, attribute: String, direction: String) {
    let spec = SortSpec {
        attribute,
        direction: direction
            .parse()
            .unwrap_or_else(|err| panic!("scenario uses a known direction: {err}")),
    };
    datalist_context
        .query
        .replace_with(|query| std::mem::take(query).sort(spec));
}

#[when("I read the data source")]
fn read_data_source(datalist_context: &DatalistContext) -> Result<(), StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))?;
    let data_source = data_source(datalist_context.source.borrow().clone());
    let query: Query = datalist_context.query.borrow().clone();
    let result = runtime.block_on(async move { data_source.read(&(), query).await });
    datalist_context.outcome.replace(Some(match result {
        Ok(state) => ReadOutcome::Success(record_names(&state.results)),
        Err(err) => ReadOutcome::Failure(err.to_string()),
    }));
    Ok(())
}

#[then("the result names are \"{names}\"")]
fn result_names(datalist_context: &DatalistContext, names: String) -> Result<(), StepError> {
    let expected = split_list(&names);
    match datalist_context.outcome.borrow().as_ref() {
        Some(ReadOutcome::Success(actual)) if *actual == expected => Ok(()),
        Some(ReadOutcome::Success(actual)) => Err(StepError::Assertion(format!(
            "expected {expected:?}, got {actual:?}"
        ))),
        Some(ReadOutcome::Failure(message)) => Err(StepError::Assertion(format!(
            "expected success, got failure: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the read fails mentioning \"{text}\"")]
fn read_fails(datalist_context: &DatalistContext, text: String) -> Result<(), StepError> {
    let outcome = datalist_context.outcome.borrow();
    let Some(ReadOutcome::Failure(message)) = outcome.as_ref() else {
        return Err(StepError::Assertion(format!(
            "expected failure, got {outcome:?}"
        )));
    };
    if message.contains(text.as_str()) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected error mentioning '{text}', got: {message}"
        )))
    }
}

#[then("the catalogue was fetched once")]
fn fetched_once(datalist_context: &DatalistContext) -> Result<(), StepError> {
    match datalist_context.source.borrow().fetch_calls() {
        1 => Ok(()),
        calls => Err(StepError::Assertion(format!(
            "expected one fetch, got {calls}"
        ))),
    }
}
