//! Output Generation
//!
//! Snapshot files, statistics and end-of-run reports.

use thiserror::Error;

pub mod snapshot;
pub mod stats;

pub use snapshot::*;
pub use stats::*;

/// Errors writing output files.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
