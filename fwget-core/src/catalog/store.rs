//! Catalog document parsing
//!
//! The repository index (`fwrepodata/fwrepo.json`) is a JSON object keyed by
//! package filename. Each value carries the package metadata.

use serde::{Deserialize, Serialize};

use crate::error::{FwgetError, Result};

/// One firmware package in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Package filename, unique within a catalog
    pub id: String,

    /// Release date; compared as a string, never parsed
    pub date: String,

    pub description: String,

    /// Device or model tag
    pub target: String,

    /// Hardware class tag
    pub deviceclass: String,
}

/// Metadata as it appears in the index, before the key is attached.
/// All four fields are required; unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct EntryFields {
    date: String,
    description: String,
    target: String,
    deviceclass: String,
}

/// The firmware catalog
///
/// Entries keep the order in which they appear in the source document, which
/// is what makes sort ties deterministic.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Parse a catalog from the raw index JSON
    ///
    /// Rejects the whole document if any entry lacks a required field.
    pub fn from_json(content: &str) -> Result<Self> {
        let document: serde_json::Value =
            serde_json::from_str(content).map_err(|e| FwgetError::malformed("catalog", e))?;

        let serde_json::Value::Object(map) = document else {
            return Err(FwgetError::malformed(
                "catalog",
                "expected a JSON object keyed by package filename",
            ));
        };

        let mut entries = Vec::with_capacity(map.len());
        for (id, value) in map {
            let fields: EntryFields = serde_json::from_value(value)
                .map_err(|e| FwgetError::malformed(format!("catalog entry '{id}'"), e))?;

            entries.push(CatalogEntry {
                id,
                date: fields.date,
                description: fields.description,
                target: fields.target,
                deviceclass: fields.deviceclass,
            });
        }

        tracing::debug!("Parsed catalog with {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Build a catalog from already-constructed entries
    ///
    /// Fails if two entries share an id.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut seen = std::collections::HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(FwgetError::malformed(
                    "catalog",
                    format!("duplicate package id '{}'", entry.id),
                ));
            }
        }
        Ok(Self { entries })
    }

    /// Entries in document order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CatalogEntry {
    /// Description with non-ASCII characters dropped, for terminal output
    pub fn ascii_description(&self) -> String {
        self.description.chars().filter(char::is_ascii).collect()
    }
}
