//! Wire models returned by the Equinix Metal API.

use serde::Deserialize;

/// Hourly and monthly price of a plan.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Pricing {
    /// Price per hour.
    #[serde(default)]
    pub hour: f64,
    /// Price per month.
    #[serde(default)]
    pub month: f64,
}

/// Facility or metro reference; `code` is only present when the relation was
/// requested through `include`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct LocationRef {
    /// Short location code (for example `da11` or `da`).
    #[serde(default)]
    pub code: String,
    /// API link to the location.
    #[serde(default)]
    pub href: String,
}

/// A server plan.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Plan {
    /// Plan identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Plan slug.
    #[serde(default)]
    pub slug: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Product line, for example `baremetal`.
    #[serde(default)]
    pub line: String,
    /// Whether the plan is a legacy offering.
    #[serde(default)]
    pub legacy: bool,
    /// Plan class.
    #[serde(default)]
    pub class: String,
    /// Pricing, when published.
    #[serde(default)]
    pub pricing: Option<Pricing>,
    /// Deployment types such as `on_demand` and `spot_market`.
    #[serde(default)]
    pub deployment_types: Vec<String>,
    /// Facilities the plan is available in.
    #[serde(default)]
    pub available_in: Vec<LocationRef>,
    /// Metros the plan is available in.
    #[serde(default)]
    pub available_in_metros: Vec<LocationRef>,
}

/// Body of `GET /plans`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct PlanList {
    /// Plans returned by the API.
    #[serde(default)]
    pub plans: Vec<Plan>,
}
