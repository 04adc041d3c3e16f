//! Error types for environment auditing.
//!
//! [`AuditError`] covers the conditions that end a run. [`InspectionError`]
//! covers a single environment and is always recovered by the aggregator.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal errors surfaced to the caller of an audit.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The root path is missing or is not a directory.
    #[error("The directory {} does not exist.", path.display())]
    InvalidRoot { path: PathBuf },

    /// The scan finished without finding a single environment.
    #[error("No virtual environments found in {}.", root.display())]
    NoEnvironmentsFound { root: PathBuf },
}

/// Why inspecting one environment produced no package data.
#[derive(Debug, Error)]
pub enum InspectionError {
    /// The interpreter could not be started.
    #[error("failed to launch {}: {source}", interpreter.display())]
    Launch {
        interpreter: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The interpreter ran but exited unsuccessfully.
    #[error("{} exited with status {}: {}", interpreter.display(), code_text(*code), stderr.trim())]
    Exited {
        interpreter: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    /// The interpreter started but waiting for it failed.
    #[error("failed waiting for {}: {source}", interpreter.display())]
    Wait {
        interpreter: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} timed out after {}s", interpreter.display(), after.as_secs())]
    TimedOut { interpreter: PathBuf, after: Duration },

    /// Standard output was not a valid introspection payload.
    #[error("malformed payload from {}: {source}", interpreter.display())]
    MalformedPayload {
        interpreter: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn code_text(code: Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

pub type Result<T> = std::result::Result<T, AuditError>;
