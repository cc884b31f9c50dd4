//! Firmware repository access
//!
//! Fetches the catalog index, keeps a copy of the last fetched index on
//! disk and downloads packages. The repository authenticates with HTTP basic
//! auth: the access token is the user name and the password is `null`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::Catalog;
use crate::config::{CatalogAccess, TOKEN_CHECK_URL};
use crate::error::{FwgetError, Result};

/// Index location relative to the repository base
pub const INDEX_PATH: &str = "fwrepodata/fwrepo.json";

/// Packages with this extension ship a detached signature in current repositories
pub const PACKAGE_EXTENSION: &str = ".rpm";

/// Extension of the detached signature file
pub const SIGNATURE_EXTENSION: &str = ".compsig";

/// Older repository generations that publish no signature files
pub const LEGACY_REPOSITORIES: &[&str] = &["fwpp-gen9", "fwpp-gen8", "fwpp-G7"];

const BASIC_AUTH_PASSWORD: &str = "null";
const INDEX_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of downloading a package
#[derive(Debug)]
pub struct Download {
    /// Where the package was written
    pub package: PathBuf,

    pub signature: SignatureOutcome,
}

/// What happened to the detached signature of a downloaded package
#[derive(Debug)]
pub enum SignatureOutcome {
    /// Package type or repository generation has no signature
    NotApplicable,
    Saved(PathBuf),
    /// The package was kept; only the signature is missing
    Failed(FwgetError),
}

/// HTTP client bound to one repository and token
pub struct CatalogClient {
    client: reqwest::Client,
    access: CatalogAccess,
}

impl CatalogClient {
    pub fn new(access: CatalogAccess) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            access,
        })
    }

    /// Repository base location, without credentials
    pub fn base_url(&self) -> &str {
        &self.access.url
    }

    pub fn index_url(&self) -> String {
        format!("{}/{}", self.access.url, INDEX_PATH)
    }

    pub fn content_url(&self, id: &str) -> String {
        format!("{}/{}", self.access.url, id)
    }

    /// Content URL with the token embedded, usable directly with curl or wget
    pub fn authenticated_url(&self, id: &str) -> Result<String> {
        let mut url = reqwest::Url::parse(&self.content_url(id))
            .map_err(|e| FwgetError::malformed("repository url", e))?;

        url.set_username(&self.access.token)
            .and_then(|_| url.set_password(Some(BASIC_AUTH_PASSWORD)))
            .map_err(|_| {
                FwgetError::malformed("repository url", "cannot carry credentials")
            })?;

        Ok(url.to_string())
    }

    /// Fetch the index, overwrite the local copy with it and parse it
    pub async fn fetch_catalog(&self, cache_path: &Path) -> Result<Catalog> {
        let content = self.fetch_index_text().await?;

        tokio::fs::write(cache_path, &content)
            .await
            .map_err(|e| FwgetError::io(cache_path, e))?;
        tracing::debug!("Saved index to cache: {}", cache_path.display());

        Catalog::from_json(&content)
    }

    /// Fetch the raw index document
    pub async fn fetch_index_text(&self) -> Result<String> {
        let url = self.index_url();
        tracing::debug!("Fetching catalog index from {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.access.token, Some(BASIC_AUTH_PASSWORD))
            .timeout(INDEX_TIMEOUT)
            .send()
            .await
            .map_err(|e| FwgetError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FwgetError::from_status(url, status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FwgetError::transport(&url, e))
    }

    /// Download a package into `dest_dir`, plus its signature where one is published
    pub async fn download(&self, id: &str, dest_dir: &Path) -> Result<Download> {
        validate_package_id(id)?;

        let package = dest_dir.join(id);
        self.fetch_to_file(id, &package).await?;
        tracing::info!("Downloaded {} to {}", id, package.display());

        let signature = match signature_name(id, &self.access.url) {
            None => SignatureOutcome::NotApplicable,
            Some(name) => {
                let path = dest_dir.join(&name);
                match self.fetch_to_file(&name, &path).await {
                    Ok(()) => {
                        tracing::info!("Downloaded {} to {}", name, path.display());
                        SignatureOutcome::Saved(path)
                    }
                    Err(e) => {
                        tracing::warn!("Failed to download signature {}: {}", name, e);
                        SignatureOutcome::Failed(e)
                    }
                }
            }
        };

        Ok(Download { package, signature })
    }

    async fn fetch_to_file(&self, id: &str, path: &Path) -> Result<()> {
        let url = self.content_url(id);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.access.token, Some(BASIC_AUTH_PASSWORD))
            .send()
            .await
            .map_err(|e| FwgetError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FwgetError::from_status(url, status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FwgetError::transport(&url, e))?;

        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| FwgetError::io(path, e))
    }
}

/// Load the index saved by the last successful fetch
pub fn load_cached_catalog(cache_path: &Path) -> Result<Catalog> {
    let content =
        std::fs::read_to_string(cache_path).map_err(|e| FwgetError::io(cache_path, e))?;
    tracing::debug!("Using cached index: {}", cache_path.display());
    Catalog::from_json(&content)
}

/// Check a newly entered token against the repository root
pub async fn validate_token(token: &str) -> Result<()> {
    validate_token_at(TOKEN_CHECK_URL, token).await
}

async fn validate_token_at(url: &str, token: &str) -> Result<()> {
    let response = build_client()?
        .get(url)
        .basic_auth(token.trim(), Some(BASIC_AUTH_PASSWORD))
        .timeout(INDEX_TIMEOUT)
        .send()
        .await
        .map_err(|e| FwgetError::transport(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FwgetError::from_status(url, status.as_u16()));
    }
    Ok(())
}

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("fwget/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| FwgetError::TransportFailure {
            url: String::new(),
            status: None,
            reason: format!("failed to create HTTP client: {e}"),
        })
}

/// Downloads take exactly one file name: no wildcards, no directories
fn validate_package_id(id: &str) -> Result<()> {
    let reason = if id.is_empty() {
        "package name is empty"
    } else if id.contains(['*', '?', '[']) {
        "wildcards are not supported; use `locate` to list matching packages"
    } else if id.contains(['/', '\\']) || id == "." || id == ".." {
        "package name must be a plain file name"
    } else {
        return Ok(());
    };
    Err(FwgetError::malformed(format!("package name '{id}'"), reason))
}

/// Signature file published next to `id`, if the repository generation has one
fn signature_name(id: &str, repository_url: &str) -> Option<String> {
    let stem = id.strip_suffix(PACKAGE_EXTENSION)?;
    if LEGACY_REPOSITORIES
        .iter()
        .any(|legacy| repository_url.contains(legacy))
    {
        return None;
    }
    Some(format!("{stem}{SIGNATURE_EXTENSION}"))
}
