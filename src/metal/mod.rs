//! Equinix Metal list data sources built on the [`crate::datalist`] engine.

mod client;
mod error;
pub mod plans;
mod types;

pub use client::{MetalClient, PlanCatalog};
pub use error::MetalError;
pub use plans::{PLANS_ATTRIBUTE, PlansSource, flatten_plan, plan_schema};
pub use types::{LocationRef, Plan, PlanList, Pricing};
