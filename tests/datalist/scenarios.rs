//! BDD scenarios for filtered and sorted list reads.

use rstest_bdd_macros::scenario;

use super::test_helpers::{DatalistContext, datalist_context};

#[scenario(
    path = "tests/features/datalist.feature",
    name = "Filter values are joined with OR"
)]
fn scenario_or_values(datalist_context: DatalistContext) {
    let _ = datalist_context;
}

#[scenario(
    path = "tests/features/datalist.feature",
    name = "The all flag requires every value to match"
)]
fn scenario_all_values(datalist_context: DatalistContext) {
    let _ = datalist_context;
}

#[scenario(
    path = "tests/features/datalist.feature",
    name = "Separate filters narrow the results together"
)]
fn scenario_chained_filters(datalist_context: DatalistContext) {
    let _ = datalist_context;
}

#[scenario(
    path = "tests/features/datalist.feature",
    name = "Numeric comparisons compare numbers"
)]
fn scenario_numeric_comparison(datalist_context: DatalistContext) {
    let _ = datalist_context;
}

#[scenario(
    path = "tests/features/datalist.feature",
    name = "Sort keys break ties in declaration order"
)]
fn scenario_sort_tie_break(datalist_context: DatalistContext) {
    let _ = datalist_context;
}

#[scenario(
    path = "tests/features/datalist.feature",
    name = "An empty query keeps fetch order"
)]
fn scenario_empty_query(datalist_context: DatalistContext) {
    let _ = datalist_context;
}

#[scenario(
    path = "tests/features/datalist.feature",
    name = "Invalid regular expressions are reported"
)]
fn scenario_invalid_regex(datalist_context: DatalistContext) {
    let _ = datalist_context;
}

#[scenario(
    path = "tests/features/datalist.feature",
    name = "Numeric comparisons accept a single value"
)]
fn scenario_single_value(datalist_context: DatalistContext) {
    let _ = datalist_context;
}

#[scenario(
    path = "tests/features/datalist.feature",
    name = "Fetch failures abort the read"
)]
fn scenario_fetch_failure(datalist_context: DatalistContext) {
    let _ = datalist_context;
}
