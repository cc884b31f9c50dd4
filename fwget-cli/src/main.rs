//! fwget - search, locate and download firmware from a repository
//!
//! Every command starts from the repository index, fetched fresh on each run
//! (or read from the local copy with `--cached`).

use clap::Parser;
use std::path::PathBuf;

use fwget_cli::logging::{initialize_tracing, LogLevel};
use fwget_cli::report::exit_with_failure;
use fwget_core::config::CONFIG_FILE_NAME;
use fwget_core::error::TOKEN_HELP_URL;

mod catalog_cli;

#[derive(Parser, Debug)]
#[clap(
    name = "fwget",
    about = "Search, locate and download firmware from an HPE firmware repository",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: catalog_cli::CatalogSubcommand,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Override the configuration file path (default: ~/.fwget.conf)
    #[clap(long, env = "FWGET_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Use the last downloaded index instead of fetching it again
    #[clap(long, global = true)]
    cached: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);

    let verbose = cli.log_level.is_verbose();
    let options = catalog_cli::GlobalOptions {
        config: cli.config,
        cached: cli.cached,
    };

    if let Err(e) = cli.command.execute(options).await {
        let hint = format!(
            "A valid warranty or support contract is required to access HPE firmware. \
             Generate an access token at {TOKEN_HELP_URL} and add it to ~/{CONFIG_FILE_NAME}."
        );
        exit_with_failure(&e, &hint, verbose);
    }
}
