//! fwinventory - export the firmware installed on a Redfish-managed server
//!
//! Controller settings come from the `ilo` section of `~/.fwget.conf` and
//! may be overridden by flags or `FWINVENTORY_*` environment variables.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use fwget_cli::logging::{initialize_tracing, LogLevel};
use fwget_cli::report::exit_with_failure;
use fwget_core::config::FwgetConfig;
use fwget_core::inventory::{collect_inventory, export_to_file, ExportFormat};

#[derive(Parser, Debug)]
#[clap(
    name = "fwinventory",
    about = "Export the firmware inventory of a server through its Redfish interface",
    version
)]
struct Cli {
    /// Controller address (host, host:port or URL; https:// is assumed)
    #[clap(long, short, env = "FWINVENTORY_ADDRESS")]
    address: Option<String>,

    /// Controller user name
    #[clap(long, short, env = "FWINVENTORY_USERNAME")]
    username: Option<String>,

    /// Controller password
    #[clap(long, short, env = "FWINVENTORY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Accept self-signed controller certificates
    #[clap(long)]
    insecure: bool,

    /// Output format: spaced or json
    #[clap(long, short, default_value = "spaced")]
    format: String,

    /// Write to FILE instead of stdout; the file is only created on success
    #[clap(long, short)]
    output: Option<PathBuf>,

    /// Override the configuration file path (default: ~/.fwget.conf)
    #[clap(long, env = "FWGET_CONFIG")]
    config: Option<PathBuf>,

    /// Set log level
    #[clap(long, default_value = "warn")]
    log_level: LogLevel,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);
    let verbose = cli.log_level.is_verbose();

    if let Err(e) = run(cli).await {
        exit_with_failure(
            &e,
            "Check the controller username and password.",
            verbose,
        );
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Reject the format before touching the network
    let format = ExportFormat::from_str(&cli.format)?;

    let config_path = match cli.config {
        Some(path) => path,
        None => FwgetConfig::default_path()?,
    };
    let config = FwgetConfig::load_optional(&config_path)?.unwrap_or_default();
    let credentials = config.ilo_credentials(
        &config_path,
        cli.address,
        cli.username,
        cli.password,
        cli.insecure,
    )?;

    match cli.output {
        Some(path) => {
            let count = export_to_file(&credentials, format, &path)
                .await
                .with_context(|| {
                    format!("Unable to export firmware inventory of {}", credentials.address)
                })?;
            println!("{count} firmware items written to {}", path.display());
        }
        None => {
            let inventory = collect_inventory(&credentials).await.with_context(|| {
                format!("Unable to read firmware inventory of {}", credentials.address)
            })?;
            print!("{}", inventory.export(format)?);
        }
    }

    Ok(())
}
