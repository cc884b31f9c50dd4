//! Inventory export formats
//!
//! `spaced` is one `attribute:value` line per field with a blank line between
//! items, in the fixed order odataId, version, description, name, targets.
//! Scripts read it positionally, so that order must not change.
//!
//! `json` is an array of objects with alphabetically sorted keys, indented
//! by four spaces.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::{Inventory, InventoryEntry};
use crate::error::{FwgetError, Result};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Spaced,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Spaced, ExportFormat::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Spaced => "spaced",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = FwgetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FwgetError::UnsupportedFormat {
                requested: s.to_string(),
                supported: Self::ALL.iter().map(|f| f.as_str()).collect(),
            })
    }
}

impl Inventory {
    /// Render the whole inventory; nothing is produced on error
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Spaced => Ok(render_spaced(self.entries())),
            ExportFormat::Json => render_json(self.entries()),
        }
    }
}

fn render_spaced(entries: &[InventoryEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let mut block = format!(
                "odataId:{}\nversion:{}\ndescription:{}\nname:{}\n",
                entry.odata_id, entry.version, entry.description, entry.name
            );
            if let Some(targets) = &entry.targets {
                block.push_str("targets:");
                block.push_str(&targets.join(" "));
                block.push('\n');
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_json(entries: &[InventoryEntry]) -> Result<String> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);

    entries
        .serialize(&mut serializer)
        .map_err(|e| FwgetError::malformed("inventory", e))?;

    let mut rendered =
        String::from_utf8(buffer).map_err(|e| FwgetError::malformed("inventory", e))?;
    rendered.push('\n');
    Ok(rendered)
}
