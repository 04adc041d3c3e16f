//! Virtual environment discovery.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::InterpreterLayout;
use crate::error::{AuditError, Result};

/// One discovered environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentRef {
    /// Base name of the environment directory.
    pub name: String,
    pub root_path: PathBuf,
    pub interpreter_path: PathBuf,
}

/// Walks a directory tree looking for environment roots.
#[derive(Debug)]
pub struct EnvironmentLocator {
    layout: InterpreterLayout,
    follow_links: bool,
}

impl EnvironmentLocator {
    pub fn new(layout: InterpreterLayout) -> Self {
        Self {
            layout,
            follow_links: false,
        }
    }

    /// Descend through directory symlinks as well.
    pub fn follow_links(mut self, yes: bool) -> Self {
        self.follow_links = yes;
        self
    }

    /// Find every environment under `root`.
    ///
    /// A directory holding the interpreter marker is reported and its subtree
    /// is skipped, so no result is ever an ancestor of another, even through
    /// followed links. Results keep traversal order and are unique by
    /// canonical path.
    pub fn locate(&self, root: impl AsRef<Path>) -> Result<Vec<EnvironmentRef>> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(AuditError::InvalidRoot {
                path: root.to_path_buf(),
            });
        }

        let mut envs = Vec::new();
        let mut seen: Vec<PathBuf> = Vec::new();
        let mut walker = WalkDir::new(root).follow_links(self.follow_links).into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            let Some(interpreter_path) = self.layout.interpreter_in(entry.path()) else {
                continue;
            };
            walker.skip_current_dir();

            let canonical = entry
                .path()
                .canonicalize()
                .unwrap_or_else(|_| entry.path().to_path_buf());
            // A followed link can land inside (or above) an environment
            // already reported under its real path.
            let overlaps = seen
                .iter()
                .any(|found| canonical.starts_with(found) || found.starts_with(&canonical));
            if overlaps {
                debug!("Already found {}, skipping", entry.path().display());
                continue;
            }
            seen.push(canonical);

            debug!("Found environment at {}", entry.path().display());
            envs.push(EnvironmentRef {
                name: env_name(entry.path()),
                root_path: entry.path().to_path_buf(),
                interpreter_path,
            });
        }

        Ok(envs)
    }
}

fn env_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
