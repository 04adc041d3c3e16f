//! Tabular output for audit reports.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::report::{AuditReport, ENVIRONMENT_COLUMNS, PACKAGE_COLUMNS};

/// Per-package table file name.
pub const PACKAGES_FILE: &str = "pip_envs_packages_info.csv";
/// Per-environment table file name.
pub const ENVIRONMENTS_FILE: &str = "pip_envs_env_info.csv";

/// Destination for the two report tables.
pub trait ReportSink {
    /// Persist `report`, returning the locations written.
    fn write_report(&self, report: &AuditReport) -> Result<Vec<PathBuf>>;
}

/// Writes both tables as CSV files into one directory, replacing existing files.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn packages_path(&self) -> PathBuf {
        self.dir.join(PACKAGES_FILE)
    }

    pub fn environments_path(&self) -> PathBuf {
        self.dir.join(ENVIRONMENTS_FILE)
    }
}

impl ReportSink for CsvSink {
    fn write_report(&self, report: &AuditReport) -> Result<Vec<PathBuf>> {
        let packages = self.packages_path();
        write_table(
            &packages,
            &PACKAGE_COLUMNS,
            report.packages.iter().map(|r| r.fields()),
        )?;

        let environments = self.environments_path();
        write_table(
            &environments,
            &ENVIRONMENT_COLUMNS,
            report.environments.iter().map(|r| r.fields()),
        )?;

        Ok(vec![packages, environments])
    }
}

/// Write `header` followed by `rows`. The header is written even with no rows.
fn write_table<const N: usize>(
    path: &Path,
    header: &[&str; N],
    rows: impl Iterator<Item = [String; N]>,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer
        .write_record(header)
        .with_context(|| format!("Failed to write header to {}", path.display()))?;
    for row in rows {
        writer
            .write_record(&row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
