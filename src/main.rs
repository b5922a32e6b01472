//! Binary entry point for the `equinix-datalist` CLI.

use std::fs;
use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use equinix_datalist::metal::plans;
use equinix_datalist::{
    MetalClient, MetalConfig, MetalError, PlanCatalog, Query, QueryArgError, ReadError,
    build_query,
};

mod cli;

use cli::{Cli, DataSourceName, ListCommand, SchemaCommand};

const LOG_ENV: &str = "EQUINIX_DATALIST_LOG";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid query: {0}")]
    Query(#[from] QueryArgError),
    #[error("unable to read query file '{path}': {message}")]
    QueryFile { path: String, message: String },
    #[error("read failed: {0}")]
    Read(#[from] ReadError<MetalError>),
    #[error("failed to render output: {0}")]
    Render(String),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(&cli).await {
        Ok(output) => {
            writeln!(io::stdout(), "{output}").ok();
            0
        }
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

/// Logs go to stderr so stdout stays valid JSON.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

async fn dispatch(cli: &Cli) -> Result<String, CliError> {
    match cli {
        Cli::Plans(command) => {
            let query = load_query(command)?;
            let config = MetalConfig::load_without_cli_args()
                .map_err(|err| CliError::Config(err.to_string()))?;
            let client =
                MetalClient::new(&config).map_err(|err| CliError::Config(err.to_string()))?;
            list_plans(&client, query).await
        }
        Cli::Schema(command) => render_schema(command),
    }
}

fn load_query(command: &ListCommand) -> Result<Query, CliError> {
    let document = command
        .query
        .as_ref()
        .map(|path| {
            fs::read_to_string(path).map_err(|err| CliError::QueryFile {
                path: path.display().to_string(),
                message: err.to_string(),
            })
        })
        .transpose()?;
    Ok(build_query(
        document.as_deref(),
        &command.filters,
        &command.sorts,
    )?)
}

async fn list_plans(
    catalog: &(dyn PlanCatalog + Sync + 'static),
    query: Query,
) -> Result<String, CliError> {
    let state = plans::data_source().read(catalog, query).await?;
    debug!(id = %state.id, count = state.results.len(), "rendering plans");
    state
        .to_json()
        .and_then(|document| serde_json::to_string_pretty(&document))
        .map_err(|err| CliError::Render(err.to_string()))
}

fn render_schema(command: &SchemaCommand) -> Result<String, CliError> {
    match command.data_source {
        DataSourceName::Plans => serde_json::to_string_pretty(plans::data_source().schema())
            .map_err(|err| CliError::Render(err.to_string())),
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
