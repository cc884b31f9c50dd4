//! fwget core library
//!
//! Catalog queries over a firmware repository index and export of the
//! firmware installed on Redfish-managed servers.

pub mod catalog;
pub mod config;
pub mod error;
pub mod inventory;

pub use error::{ErrorKind, FwgetError, Result};
