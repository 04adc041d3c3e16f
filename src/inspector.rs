//! Per-environment inspection through the environment's own interpreter.
//!
//! Package listings, install locations and version strings belong to the
//! interpreter that owns the environment, so they are collected by running a
//! small introspection script inside that interpreter and reading back a JSON
//! payload on stdout.
//!
//! Package access times come from the filesystem `atime` of each package
//! folder. They are a hint about usage at best: many systems mount with
//! `noatime` or `relatime`, and earlier scans (including this one) can bump
//! them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::InspectionError;
use crate::locator::EnvironmentRef;
use crate::process::{run_captured, RunError};

/// Script run inside each target interpreter via `-c`.
pub const INTROSPECTION_SCRIPT: &str = include_str!("introspect.py");

/// Text recorded in place of an access time when the package folder is missing.
pub const NOT_FOUND_SENTINEL: &str = "Package folder not found.";

/// Interpreter-reported facts about one environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentMetadata {
    pub python_version: String,
    pub interpreter_path: String,
    pub environment_root: String,
}

/// Observed recency of a package folder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LastAccess {
    Observed { time: String, days_since: f64 },
    NotFound,
}

impl LastAccess {
    pub fn time_text(&self) -> &str {
        match self {
            Self::Observed { time, .. } => time,
            Self::NotFound => NOT_FOUND_SENTINEL,
        }
    }

    pub fn days_since(&self) -> Option<f64> {
        match self {
            Self::Observed { days_since, .. } => Some(*days_since),
            Self::NotFound => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageRecord {
    pub package_name: String,
    pub last_access: LastAccess,
}

/// Combined text of a dependency-consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckResult {
    pub raw_output: String,
}

/// Successful inspection of one environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub metadata: EnvironmentMetadata,
    pub packages: Vec<PackageRecord>,
}

/// Source of per-environment data for the aggregator.
pub trait EnvironmentProbe {
    /// Collect metadata and package records for `env`.
    fn inspect(&self, env: &EnvironmentRef) -> Result<Inspection, InspectionError>;

    /// Run the dependency-consistency check for `env`. Never fails; problems
    /// running the check are reported as text.
    fn check_health(&self, env: &EnvironmentRef) -> HealthCheckResult;
}

/// [`EnvironmentProbe`] that shells out to each environment's interpreter.
#[derive(Debug, Clone, Default)]
pub struct Inspector {
    timeout: Option<Duration>,
}

impl Inspector {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl EnvironmentProbe for Inspector {
    fn inspect(&self, env: &EnvironmentRef) -> Result<Inspection, InspectionError> {
        let interpreter = env.interpreter_path.clone();
        let mut cmd = Command::new(&interpreter);
        cmd.arg("-c").arg(INTROSPECTION_SCRIPT);

        let output = run_captured(&mut cmd, self.timeout)
            .map_err(|e| inspection_error(interpreter.clone(), e))?;

        if !output.success() {
            return Err(InspectionError::Exited {
                interpreter,
                code: output.status.code(),
                stderr: output.stderr,
            });
        }

        let inspection = parse_payload(&output.stdout)
            .map_err(|source| InspectionError::MalformedPayload {
                interpreter,
                source,
            })?;
        debug!(
            "{}: {} package(s) reported",
            env.name,
            inspection.packages.len()
        );
        Ok(inspection)
    }

    fn check_health(&self, env: &EnvironmentRef) -> HealthCheckResult {
        let mut cmd = Command::new(&env.interpreter_path);
        cmd.args(["-m", "pip", "check"]);

        let raw_output = match run_captured(&mut cmd, self.timeout) {
            Ok(output) if output.success() => output.stdout.trim().to_string(),
            // pip check exits non-zero when it finds broken requirements.
            Ok(output) => format!("{}\n{}", output.stdout.trim(), output.stderr.trim()),
            Err(e) => {
                warn!("{}: pip check could not run: {}", env.name, e);
                format!("Error running pip check: {}", e)
            }
        };

        HealthCheckResult { raw_output }
    }
}

fn inspection_error(interpreter: PathBuf, err: RunError) -> InspectionError {
    match err {
        RunError::Spawn(source) => InspectionError::Launch {
            interpreter,
            source,
        },
        RunError::Wait(source) => InspectionError::Wait {
            interpreter,
            source,
        },
        RunError::TimedOut(after) => InspectionError::TimedOut { interpreter, after },
    }
}

#[derive(Debug, Deserialize)]
struct Payload {
    environment: PayloadEnvironment,
    #[serde(default)]
    packages: Vec<PayloadPackage>,
}

#[derive(Debug, Deserialize)]
struct PayloadEnvironment {
    python_version: String,
    executable: String,
    prefix: String,
}

#[derive(Debug, Deserialize)]
struct PayloadPackage {
    name: String,
    last_access: Option<PayloadAccess>,
}

#[derive(Debug, Deserialize)]
struct PayloadAccess {
    time: String,
    days_since: f64,
}

/// Parse the introspection payload printed by [`INTROSPECTION_SCRIPT`].
///
/// Stray lines printed before the payload (site hooks, banners) are tolerated
/// by retrying with the last non-empty line.
pub fn parse_payload(stdout: &str) -> Result<Inspection, serde_json::Error> {
    let payload: Payload = match serde_json::from_str(stdout.trim()) {
        Ok(payload) => payload,
        Err(e) => match stdout.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(last) if last.trim() != stdout.trim() => {
                serde_json::from_str(last.trim()).map_err(|_| e)?
            }
            _ => return Err(e),
        },
    };

    let packages = payload
        .packages
        .into_iter()
        .map(|p| PackageRecord {
            package_name: p.name,
            last_access: match p.last_access {
                Some(a) => LastAccess::Observed {
                    time: a.time,
                    days_since: a.days_since,
                },
                None => LastAccess::NotFound,
            },
        })
        .collect();

    Ok(Inspection {
        metadata: EnvironmentMetadata {
            python_version: payload.environment.python_version,
            interpreter_path: payload.environment.executable,
            environment_root: payload.environment.prefix,
        },
        packages,
    })
}

#[cfg(test)]
#[path = "inspector_tests.rs"]
mod tests;
