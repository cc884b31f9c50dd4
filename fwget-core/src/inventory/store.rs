//! Installed firmware as reported by a management controller

use serde::{Deserialize, Serialize};

use crate::error::{FwgetError, Result};

/// One installed firmware item
///
/// Fields are declared in alphabetical order so JSON output has sorted keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub description: String,

    pub name: String,

    /// Redfish resource path, unique within an inventory
    #[serde(rename = "odataId")]
    pub odata_id: String,

    /// Catalog target ids this item corresponds to, in the order reported.
    /// `None` when the controller reports no target list at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,

    /// Opaque version string
    pub version: String,
}

/// Firmware items in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    entries: Vec<InventoryEntry>,
}

impl Inventory {
    /// Build an inventory, rejecting duplicate resource paths
    pub fn new(entries: Vec<InventoryEntry>) -> Result<Self> {
        let mut seen = std::collections::HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.odata_id.as_str()) {
                return Err(FwgetError::malformed(
                    "inventory",
                    format!("duplicate resource '{}'", entry.odata_id),
                ));
            }
        }
        Ok(Self { entries })
    }

    /// Parse an inventory previously exported as JSON
    pub fn from_json(content: &str) -> Result<Self> {
        let entries: Vec<InventoryEntry> =
            serde_json::from_str(content).map_err(|e| FwgetError::malformed("inventory", e))?;
        Self::new(entries)
    }

    pub fn entries(&self) -> &[InventoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every target id across all items, first occurrence order, without repeats
    ///
    /// Handy as search terms for the catalog.
    pub fn target_ids(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.entries
            .iter()
            .flat_map(|e| e.targets.iter().flatten())
            .map(String::as_str)
            .filter(|t| seen.insert(*t))
            .collect()
    }
}

#[cfg(test)]
mod store_tests {
    use super::*;

    fn item(id: &str, targets: Option<Vec<&str>>) -> InventoryEntry {
        InventoryEntry {
            description: "d".to_string(),
            name: "n".to_string(),
            odata_id: id.to_string(),
            targets: targets.map(|t| t.into_iter().map(String::from).collect()),
            version: "1.0".to_string(),
        }
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let result = Inventory::new(vec![item("/a", None), item("/a", None)]);
        assert_eq!(result.unwrap_err().kind(), crate::ErrorKind::MalformedInput);
    }

    #[test]
    fn test_target_ids() {
        let inventory = Inventory::new(vec![
            item("/1", Some(vec!["b", "a"])),
            item("/2", None),
            item("/3", Some(vec!["a", "c"])),
        ])
        .unwrap();
        assert_eq!(inventory.target_ids(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_from_json_requires_fields() {
        let err = Inventory::from_json(r#"[{"name": "x", "odataId": "/1", "version": "1"}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("description"));
    }
}
