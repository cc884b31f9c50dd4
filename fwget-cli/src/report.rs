//! User-facing failure messages
//!
//! Failures are printed as one or two short lines on stderr. The full cause
//! chain is only shown at debug log level.

use fwget_core::{ErrorKind, FwgetError};

/// Build the lines shown to the user for a failed command
///
/// `unauthorized_hint` is printed when credentials were rejected.
pub fn failure_lines(err: &anyhow::Error, unauthorized_hint: &str, verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();

    if verbose {
        lines.push(format!("Error: {err:?}"));
    } else {
        lines.push(format!("Error: {err:#}"));
    }

    let kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<FwgetError>())
        .map(FwgetError::kind);

    match kind {
        Some(ErrorKind::Unauthorized) => lines.push(unauthorized_hint.to_string()),
        Some(ErrorKind::PartialInventory) => {
            lines.push("No inventory was written; rerun once the controller responds.".to_string())
        }
        _ => {}
    }

    lines
}

/// Print the failure and exit with status 1
pub fn exit_with_failure(err: &anyhow::Error, unauthorized_hint: &str, verbose: bool) -> ! {
    for line in failure_lines(err, unauthorized_hint, verbose) {
        eprintln!("{line}");
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_unauthorized_gets_hint() {
        let err: anyhow::Result<()> = Err(FwgetError::from_status("http://repo/x", 401))
            .context("Unable to download firmware index");
        let lines = failure_lines(&err.unwrap_err(), "get a new token", false);

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Error: Unable to download firmware index"));
        assert!(lines[0].contains("401"));
        assert_eq!(lines[1], "get a new token");
    }

    #[test]
    fn test_other_errors_single_line() {
        let err = anyhow::Error::new(FwgetError::from_status("http://repo/x", 404));
        let lines = failure_lines(&err, "hint", false);
        assert_eq!(lines.len(), 1);
    }
}
