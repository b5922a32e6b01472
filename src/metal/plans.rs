//! The `plans` list data source.

use std::collections::BTreeSet;

use super::client::PlanCatalog;
use super::error::MetalError;
use super::types::{LocationRef, Plan};
use crate::datalist::{
    ExtraParams, FieldSchema, ListDataSource, ListResourceConfig, Record, RecordSchema,
    RecordSource, SourceFuture, Value,
};

/// Attribute under which plans are exposed.
pub const PLANS_ATTRIBUTE: &str = "plans";

/// Attributes of a single plan record.
#[must_use]
pub fn plan_schema() -> RecordSchema {
    RecordSchema::new()
        .with_field("id", FieldSchema::string().described("id of the plan"))
        .with_field("name", FieldSchema::string().described("name of the plan"))
        .with_field("slug", FieldSchema::string().described("plan slug"))
        .with_field(
            "description",
            FieldSchema::string().described("Description of the plan"),
        )
        .with_field(
            "line",
            FieldSchema::string().described("plan line, e.g. baremetal"),
        )
        .with_field(
            "legacy",
            FieldSchema::bool().described("flag showing if it's a legacy plan"),
        )
        .with_field("class", FieldSchema::string().described("plan class"))
        .with_field(
            "pricing_hour",
            FieldSchema::float().described("plan hourly price"),
        )
        .with_field(
            "pricing_month",
            FieldSchema::float().described("plan monthly price"),
        )
        .with_field(
            "deployment_types",
            FieldSchema::set_of(FieldSchema::string())
                .described("list of deployment types, e.g. on_demand, spot_market"),
        )
        .with_field(
            "available_in",
            FieldSchema::set_of(FieldSchema::string())
                .described("list of facilities where the plan is available"),
        )
        .with_field(
            "available_in_metros",
            FieldSchema::set_of(FieldSchema::string())
                .described("list of metros where the plan is available"),
        )
}

/// Flattens set members: unique, in sorted order.
fn string_set<'a>(items: impl IntoIterator<Item = &'a str>) -> Value {
    let unique: BTreeSet<&str> = items.into_iter().collect();
    Value::List(unique.into_iter().map(Value::from).collect())
}

fn location_codes(locations: &[LocationRef]) -> Value {
    string_set(locations.iter().map(|location| location.code.as_str()))
}

/// Flattens one plan. Pricing attributes are only present when the plan
/// publishes pricing.
#[must_use]
pub fn flatten_plan(plan: &Plan) -> Record {
    let mut record = Record::new();
    record.insert(String::from("id"), Value::from(plan.id.as_str()));
    record.insert(String::from("name"), Value::from(plan.name.as_str()));
    record.insert(String::from("slug"), Value::from(plan.slug.as_str()));
    record.insert(
        String::from("description"),
        Value::from(plan.description.as_str()),
    );
    record.insert(String::from("line"), Value::from(plan.line.as_str()));
    record.insert(String::from("legacy"), Value::from(plan.legacy));
    record.insert(String::from("class"), Value::from(plan.class.as_str()));
    record.insert(
        String::from("deployment_types"),
        string_set(plan.deployment_types.iter().map(String::as_str)),
    );
    record.insert(
        String::from("available_in"),
        location_codes(&plan.available_in),
    );
    record.insert(
        String::from("available_in_metros"),
        location_codes(&plan.available_in_metros),
    );
    if let Some(pricing) = &plan.pricing {
        record.insert(String::from("pricing_hour"), Value::from(pricing.hour));
        record.insert(String::from("pricing_month"), Value::from(pricing.month));
    }
    record
}

/// Fetches plans through a [`PlanCatalog`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PlansSource;

impl RecordSource for PlansSource {
    type Meta = dyn PlanCatalog + Sync;
    type Record = Plan;
    type Error = MetalError;

    fn get_records<'a>(
        &'a self,
        meta: &'a Self::Meta,
        _extra: &'a ExtraParams,
    ) -> SourceFuture<'a, Vec<Self::Record>, Self::Error> {
        meta.list_plans()
    }

    fn flatten_record(
        &self,
        record: &Self::Record,
        _meta: &Self::Meta,
        _extra: &ExtraParams,
    ) -> Result<Record, Self::Error> {
        Ok(flatten_plan(record))
    }
}

/// Builds the `plans` list data source.
#[must_use]
pub fn data_source() -> ListDataSource<PlansSource> {
    ListDataSource::new(
        ListResourceConfig::new(plan_schema(), PLANS_ATTRIBUTE, PlansSource).described(
            "Sorted list of available server plans that match the specified filters",
        ),
    )
}
