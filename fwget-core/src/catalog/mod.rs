//! Firmware catalog - querying and downloading repository packages
//!
//! # Overview
//!
//! The catalog system allows users to:
//! - Search the repository index by filename, description, target or device class
//! - Locate download URLs for matching packages
//! - List everything the repository offers
//! - Download a single package (and its detached signature)
//!
//! # Architecture
//!
//! ```text
//! Repository (downloads.linux.hpe.com/SDR/repo/<generation>/current)
//!     │
//!     ├── fwrepodata/fwrepo.json  ← Index: package filename → metadata
//!     └── <package files>
//!            │
//!            ▼
//!     fwget CLI ──► ~/.fwget.json  ← Copy of the last fetched index
//! ```

#[cfg(feature = "catalog")]
mod client;
mod exclude;
mod query;
mod store;

#[cfg(feature = "catalog")]
pub use client::{
    load_cached_catalog, validate_token, CatalogClient, Download, SignatureOutcome, INDEX_PATH,
    LEGACY_REPOSITORIES, PACKAGE_EXTENSION, SIGNATURE_EXTENSION,
};
pub use exclude::ExclusionSet;
pub use store::{Catalog, CatalogEntry};
