//! Per-file outcome reporting.
//!
//! Successful statuses are informational, server errors are error severity,
//! anything else (client errors, the synthetic transport-failure code) is
//! printed without severity.

use std::path::Path;

use tracing::{error, info, warn};

use crate::load_config::CONFIG_FILE;
use crate::upload::UploadOutcome;

/// Reports one upload outcome: file identity line, then status line.
pub fn report(label: &str, path: &Path, outcome: &UploadOutcome) {
    let identity = format!("{label}: {}", path.display());
    let status = format!("{} {}", outcome.status, outcome.reason);
    if outcome.is_success() {
        info!("{identity}");
        info!("{status}");
    } else if outcome.status >= 500 {
        error!("{identity}");
        error!("{status}");
    } else {
        println!("{identity}");
        println!("{status}");
    }
}

/// Warns about files matched by no category after both passes.
pub fn report_leftovers(count: usize) {
    if count > 0 {
        warn!(
            "{count} additional files detected but not uploaded. \
             Only files specified in {CONFIG_FILE} are handled for upload."
        );
    }
}
