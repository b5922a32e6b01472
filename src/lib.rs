//! Filterable, sortable list data sources for Equinix APIs.
//!
//! The [`datalist`] module holds the generic engine: a record schema plus a
//! fetch and flatten source become a data source whose reads are narrowed by
//! typed filters and ordered by multi-key sorts. The [`metal`] module wires
//! the engine to the Equinix Metal plan catalogue.

pub mod config;
pub mod datalist;
pub mod metal;
pub mod query_args;
pub mod test_support;

pub use config::{ConfigError, MetalConfig};
pub use datalist::{
    Direction, FilterSpec, ListDataSource, ListResourceConfig, ListState, MatchBy, Query,
    ReadError, RecordSource, SortSpec, Value,
};
pub use metal::{MetalClient, MetalError, PlanCatalog};
pub use query_args::{QueryArgError, build_query, parse_filter_arg, parse_sort_arg};
