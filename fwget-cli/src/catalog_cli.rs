//! fwget catalog commands
//!
//! Provides commands for searching the firmware repository index and
//! downloading packages from it.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use fwget_core::catalog::{
    load_cached_catalog, validate_token, Catalog, CatalogClient, CatalogEntry, ExclusionSet,
    SignatureOutcome,
};
use fwget_core::config::{FwgetConfig, DEFAULT_REPO_URL};
use fwget_core::error::TOKEN_HELP_URL;

/// Column widths used by the plain-text listings
const SEARCH_ID_WIDTH: usize = 66;
const LIST_ID_WIDTH: usize = 33;

#[derive(Subcommand, Debug)]
pub enum CatalogSubcommand {
    /// Search filenames, descriptions, targets and device classes (newest first)
    Search {
        /// Search term (case-insensitive substring)
        term: String,

        /// Comma-separated words; hide packages whose filename or description contains any
        #[clap(long)]
        exclude: Option<String>,

        /// Output results as JSON
        #[clap(long, conflicts_with = "table")]
        json: bool,

        /// Output results as a table with all fields
        #[clap(long)]
        table: bool,
    },

    /// Print download URLs for packages whose filename or description matches
    Locate {
        /// Search term (case-insensitive substring)
        term: String,

        /// Comma-separated words; hide packages whose filename or description contains any
        #[clap(long)]
        exclude: Option<String>,
    },

    /// Download one package by exact filename (no wildcards)
    Download {
        /// Package filename, as printed by `search` or `list`
        package: String,

        /// Directory to save into
        #[clap(long, short, default_value = ".")]
        output: PathBuf,
    },

    /// List every package, sorted by filename
    List,
}

/// Flags shared by every command
#[derive(Debug)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub cached: bool,
}

impl CatalogSubcommand {
    pub async fn execute(self, options: GlobalOptions) -> Result<()> {
        let client = connect(&options).await?;

        match self {
            CatalogSubcommand::Search {
                term,
                exclude,
                json,
                table,
            } => {
                let catalog = load_catalog(&client, options.cached).await?;
                execute_search(&catalog, &term, exclude.as_deref(), json, table)
            }
            CatalogSubcommand::Locate { term, exclude } => {
                let catalog = load_catalog(&client, options.cached).await?;
                execute_locate(&client, &catalog, &term, exclude.as_deref())
            }
            CatalogSubcommand::Download { package, output } => {
                execute_download(&client, &package, &output).await
            }
            CatalogSubcommand::List => {
                let catalog = load_catalog(&client, options.cached).await?;
                execute_list(&catalog)
            }
        }
    }
}

/// Load (or create) the config and build a repository client from it
async fn connect(options: &GlobalOptions) -> Result<CatalogClient> {
    let config_path = match &options.config {
        Some(path) => path.clone(),
        None => FwgetConfig::default_path()?,
    };

    let config = match FwgetConfig::load_optional(&config_path)? {
        Some(config) => config,
        None => bootstrap_config(&config_path).await?,
    };

    let access = config.catalog_access(&config_path)?;
    tracing::debug!("Using repository {}", access.url);
    Ok(CatalogClient::new(access)?)
}

/// First run: ask for a token, check it and write the config file
async fn bootstrap_config(path: &Path) -> Result<FwgetConfig> {
    println!("A valid warranty or support contract is required to acquire HPE firmware.");
    println!("If you have a contract associated with your HPE Passport ID, please generate");
    println!("an access token at {TOKEN_HELP_URL}");
    println!("and enter it here.");
    print!("access token: ");
    io::stdout().flush()?;

    let mut token = String::new();
    io::stdin()
        .lock()
        .read_line(&mut token)
        .context("Failed to read access token")?;

    validate_token(&token).await.with_context(|| {
        format!(
            "Unable to validate token. Is a warranty or support contract associated with \
             the Passport ID used to generate it? See {TOKEN_HELP_URL}"
        )
    })?;

    let config = FwgetConfig::with_token(&token);
    config.save(path)?;

    println!("Token accepted.");
    println!(
        "Using default repository {DEFAULT_REPO_URL}. Edit {} to change it.",
        path.display()
    );
    Ok(config)
}

async fn load_catalog(client: &CatalogClient, cached: bool) -> Result<Catalog> {
    let cache_path = FwgetConfig::default_cache_path()?;

    if cached {
        return load_cached_catalog(&cache_path).with_context(|| {
            format!(
                "Unable to open cached copy of the index {}",
                cache_path.display()
            )
        });
    }

    client
        .fetch_catalog(&cache_path)
        .await
        .with_context(|| format!("Unable to download firmware index {}", client.index_url()))
}

/// Table row for search results
#[derive(Tabled)]
struct SearchResultRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Package")]
    id: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Class")]
    deviceclass: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn execute_search(
    catalog: &Catalog,
    term: &str,
    exclude: Option<&str>,
    json_output: bool,
    table_output: bool,
) -> Result<()> {
    let exclude = ExclusionSet::parse(exclude.unwrap_or_default());
    let results = catalog.search(term, &exclude);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if table_output {
        let rows: Vec<SearchResultRow> = results
            .iter()
            .map(|entry| SearchResultRow {
                date: entry.date.clone(),
                id: entry.id.clone(),
                target: entry.target.clone(),
                deviceclass: entry.deviceclass.clone(),
                description: entry.ascii_description(),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string();
        println!("{table}");
    } else {
        for entry in &results {
            println!("{}", plain_line(entry, SEARCH_ID_WIDTH));
        }
    }

    Ok(())
}

fn execute_locate(
    client: &CatalogClient,
    catalog: &Catalog,
    term: &str,
    exclude: Option<&str>,
) -> Result<()> {
    let exclude = ExclusionSet::parse(exclude.unwrap_or_default());

    for id in catalog.locate(term, &exclude) {
        println!("{}", client.authenticated_url(id)?);
    }
    Ok(())
}

async fn execute_download(client: &CatalogClient, package: &str, output: &Path) -> Result<()> {
    println!("{}", output.join(package).display());

    let download = client
        .download(package, output)
        .await
        .with_context(|| format!("Unable to download firmware {}", client.content_url(package)))?;

    match download.signature {
        SignatureOutcome::NotApplicable => Ok(()),
        SignatureOutcome::Saved(path) => {
            println!("{}", path.display());
            Ok(())
        }
        SignatureOutcome::Failed(e) => Err(anyhow::Error::new(e).context(format!(
            "Downloaded {} but not its signature file",
            download.package.display()
        ))),
    }
}

fn execute_list(catalog: &Catalog) -> Result<()> {
    for entry in catalog.list() {
        println!("{}", plain_line(entry, LIST_ID_WIDTH));
    }
    Ok(())
}

fn plain_line(entry: &CatalogEntry, width: usize) -> String {
    format!(
        "{:<width$}   {}",
        entry.id,
        entry.ascii_description(),
        width = width
    )
}
