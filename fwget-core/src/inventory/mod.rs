//! Installed firmware inventory
//!
//! Reads the firmware a server reports through its management controller
//! and exports it. The target ids in the export are the same ids the catalog
//! uses in its `target` field, so they can be fed straight to `fwget search`.

mod export;
#[cfg(feature = "inventory")]
mod redfish;
mod store;

pub use export::ExportFormat;
#[cfg(feature = "inventory")]
pub use redfish::{
    collect_inventory, export_to_file, RedfishClient, Session, FIRMWARE_INVENTORY_PATH,
    SESSIONS_PATH, TARGETS_POINTER,
};
pub use store::{Inventory, InventoryEntry};
