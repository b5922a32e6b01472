//! Command-line interface definitions for the `equinix-datalist` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Top-level CLI for the `equinix-datalist` binary.
#[derive(Debug, Parser)]
#[command(
    name = "equinix-datalist",
    about = "Query Equinix list data sources with filters and sorts",
    version,
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// List server plans that match the given filters.
    #[command(name = "plans", about = "List server plans that match the given filters")]
    Plans(ListCommand),
    /// Print the schema of a list data source as JSON.
    #[command(name = "schema", about = "Print the schema of a list data source as JSON")]
    Schema(SchemaCommand),
}

/// Arguments shared by list subcommands.
#[derive(Debug, Parser)]
pub(crate) struct ListCommand {
    /// Filter as `ATTRIBUTE[:MATCH_BY][:all]=VALUE[,VALUE...]`.
    ///
    /// Values of one filter are joined with OR unless `all` is given; separate
    /// filters are joined with AND. `MATCH_BY` is one of `in`, `re`,
    /// `substring`, `less_than`, `less_than_or_equal`, `greater_than`, or
    /// `greater_than_or_equal`. Values are used verbatim; write a literal
    /// comma as `\,`.
    #[arg(long = "filter", value_name = "FILTER")]
    pub(crate) filters: Vec<String>,
    /// Sort key as `ATTRIBUTE[:asc|desc]`; repeat for tie-breakers.
    #[arg(long = "sort", value_name = "SORT")]
    pub(crate) sorts: Vec<String>,
    /// Read a JSON query document with `filter` and `sort` arrays.
    ///
    /// Flag values are appended to the document's blocks.
    #[arg(long, value_name = "PATH")]
    pub(crate) query: Option<PathBuf>,
}

/// Arguments for the `schema` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct SchemaCommand {
    /// Data source to describe.
    #[arg(value_enum)]
    pub(crate) data_source: DataSourceName,
}

/// List data sources known to the binary.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum DataSourceName {
    /// Equinix Metal server plans.
    Plans,
}
