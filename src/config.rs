//! Run configuration shared by the locator, inspector and aggregator.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default wall-clock limit for each interpreter subprocess.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Where an environment keeps its interpreter, relative to the environment root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpreterLayout {
    /// `bin/python`
    Posix,
    /// `Scripts/python.exe`
    Windows,
}

impl InterpreterLayout {
    /// Layout matching the platform this binary was built for.
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    /// Relative path of the interpreter marker.
    pub fn marker(&self) -> PathBuf {
        match self {
            Self::Posix => Path::new("bin").join("python"),
            Self::Windows => Path::new("Scripts").join("python.exe"),
        }
    }

    /// Interpreter path under `dir`, if `dir` looks like an environment root.
    pub fn interpreter_in(&self, dir: &Path) -> Option<PathBuf> {
        let candidate = dir.join(self.marker());
        candidate.is_file().then_some(candidate)
    }
}

impl Default for InterpreterLayout {
    fn default() -> Self {
        Self::detect()
    }
}

#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub layout: InterpreterLayout,
    /// `None` lets subprocesses run to completion.
    pub timeout: Option<Duration>,
    pub follow_links: bool,
}

impl AuditConfig {
    /// Translate a timeout in seconds, where `0` means unbounded.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            layout: InterpreterLayout::detect(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            follow_links: false,
        }
    }
}
