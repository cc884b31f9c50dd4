//! fwget configuration
//!
//! Settings live in `~/.fwget.conf`, a JSON object:
//!
//! ```json
//! {
//!   "_comment": "Generate token at: http://downloads.linux.hpe.com/SDR/project/fwpp/",
//!   "token": "...",
//!   "url": "http://downloads.linux.hpe.com/SDR/repo/fwpp-gen10/current",
//!   "ilo": { "address": "10.0.0.5", "username": "admin", "password": "..." }
//! }
//! ```
//!
//! The loaded value is never modified. Commands resolve it into
//! [`CatalogAccess`] or [`IloCredentials`] and use only those.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{FwgetError, Result, TOKEN_HELP_URL};

/// Config file name, relative to the home directory
pub const CONFIG_FILE_NAME: &str = ".fwget.conf";

/// Cached catalog index, relative to the home directory
pub const CACHE_FILE_NAME: &str = ".fwget.json";

/// Repository used when bootstrapping a new config
pub const DEFAULT_REPO_URL: &str = "http://downloads.linux.hpe.com/SDR/repo/fwpp-gen10/current";

/// Repository root that accepts any valid token, used to check new tokens
pub const TOKEN_CHECK_URL: &str = "http://downloads.linux.hpe.com/SDR/repo/fwpp/";

/// Parsed contents of the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FwgetConfig {
    /// Repository access token
    #[serde(default)]
    pub token: String,

    /// Base location of the firmware repository
    #[serde(default)]
    pub url: String,

    /// Management controller used by `fwinventory`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ilo: Option<IloSettings>,
}

/// Management controller settings; any field may be supplied on the command line instead
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IloSettings {
    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Accept self-signed controller certificates
    #[serde(default)]
    pub insecure: bool,
}

/// What catalog commands need: a token and a repository location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogAccess {
    pub token: String,
    pub url: String,
}

/// What the inventory exporter needs to open a Redfish session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IloCredentials {
    pub address: String,
    pub username: String,
    pub password: String,
    pub insecure: bool,
}

impl FwgetConfig {
    /// Config holding a freshly issued token and the default repository
    pub fn with_token(token: &str) -> Self {
        Self {
            token: token.trim().to_string(),
            url: DEFAULT_REPO_URL.to_string(),
            ilo: None,
        }
    }

    /// `~/.fwget.conf`
    pub fn default_path() -> Result<PathBuf> {
        home_file(CONFIG_FILE_NAME)
    }

    /// `~/.fwget.json`
    pub fn default_cache_path() -> Result<PathBuf> {
        home_file(CACHE_FILE_NAME)
    }

    /// Load the config file, returning `None` when it does not exist
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    /// Load and parse the config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FwgetError::Config {
            path: path.to_path_buf(),
            reason: format!("unable to read: {e}"),
        })?;

        let config: FwgetConfig =
            serde_json::from_str(&content).map_err(|e| FwgetError::Config {
                path: path.to_path_buf(),
                reason: format!("unable to parse: {e}"),
            })?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config file, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut document = serde_json::json!({
            "_comment": format!("Generate token at: {TOKEN_HELP_URL}"),
            "_comment_url": "Replace fwpp-gen10 with fwpp-gen9/fwpp-gen8/fwpp-G7 as appropriate.",
        });
        let serialize_error = |e: serde_json::Error| FwgetError::Config {
            path: path.to_path_buf(),
            reason: format!("unable to serialize: {e}"),
        };

        let fields = serde_json::to_value(self).map_err(serialize_error)?;
        if let (Some(object), serde_json::Value::Object(fields)) = (document.as_object_mut(), fields)
        {
            object.extend(fields);
        }

        let content = serde_json::to_string_pretty(&document).map_err(serialize_error)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FwgetError::io(parent, e))?;
        }
        std::fs::write(path, content + "\n").map_err(|e| FwgetError::io(path, e))?;

        tracing::debug!("Wrote config to {}", path.display());
        Ok(())
    }

    /// Resolve the catalog token and repository location
    pub fn catalog_access(&self, path: &Path) -> Result<CatalogAccess> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(FwgetError::Config {
                path: path.to_path_buf(),
                reason: format!("no access token; generate one at {TOKEN_HELP_URL}"),
            });
        }

        let url = self.url.trim().trim_end_matches('/');
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(FwgetError::Config {
                path: path.to_path_buf(),
                reason: format!("repository url must start with http:// or https:// (got '{url}')"),
            });
        }

        Ok(CatalogAccess {
            token: token.to_string(),
            url: url.to_string(),
        })
    }

    /// Resolve controller credentials, preferring explicitly supplied values
    pub fn ilo_credentials(
        &self,
        path: &Path,
        address: Option<String>,
        username: Option<String>,
        password: Option<String>,
        insecure: bool,
    ) -> Result<IloCredentials> {
        let saved = self.ilo.clone().unwrap_or_default();
        let missing = |field: &str| FwgetError::Config {
            path: path.to_path_buf(),
            reason: format!("no controller {field} given on the command line or under \"ilo\""),
        };

        Ok(IloCredentials {
            address: address.or(saved.address).ok_or_else(|| missing("address"))?,
            username: username.or(saved.username).ok_or_else(|| missing("username"))?,
            password: password.or(saved.password).ok_or_else(|| missing("password"))?,
            insecure: insecure || saved.insecure,
        })
    }
}

fn home_file(name: &str) -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(name))
        .ok_or_else(|| FwgetError::Config {
            path: PathBuf::from(name),
            reason: "could not determine home directory".to_string(),
        })
}
