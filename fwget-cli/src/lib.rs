//! Pieces shared by the `fwget` and `fwinventory` binaries

pub mod logging;
pub mod report;
