//! Aggregation of per-environment results into the two report tables.

use chrono::{DateTime, Local};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::inspector::{EnvironmentProbe, Inspector};
use crate::locator::{EnvironmentLocator, EnvironmentRef};

/// Header of the per-package table.
pub const PACKAGE_COLUMNS: [&str; 7] = [
    "Environment Name",
    "Python Version",
    "Python Installation Location",
    "Environment Location",
    "Package",
    "Last Access Time",
    "Days Since Last Access",
];

/// Header of the per-environment table.
pub const ENVIRONMENT_COLUMNS: [&str; 3] = [
    "Environment Name",
    "Environment Last Access Time",
    "Pip Check Output",
];

/// `ctime(3)` style, e.g. `Fri Oct 16 09:05:01 2026`.
const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// One (environment, package) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageRow {
    pub environment_name: String,
    pub python_version: String,
    pub python_installation_location: String,
    pub environment_location: String,
    pub package: String,
    pub last_access_time: String,
    pub days_since_last_access: Option<f64>,
}

impl PackageRow {
    pub fn fields(&self) -> [String; 7] {
        [
            self.environment_name.clone(),
            self.python_version.clone(),
            self.python_installation_location.clone(),
            self.environment_location.clone(),
            self.package.clone(),
            self.last_access_time.clone(),
            self.days_since_last_access
                .map(|d| format!("{d:?}"))
                .unwrap_or_default(),
        ]
    }
}

/// One environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentRow {
    pub environment_name: String,
    pub environment_last_access_time: String,
    pub pip_check_output: String,
}

impl EnvironmentRow {
    pub fn fields(&self) -> [String; 3] {
        [
            self.environment_name.clone(),
            self.environment_last_access_time.clone(),
            self.pip_check_output.clone(),
        ]
    }
}

/// Per-environment outcome, parallel to [`AuditReport::environments`].
///
/// Environment names are not unique (every project may have a `.venv`), so
/// the preview relies on position rather than on names.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentSummary {
    pub name: String,
    pub root_path: PathBuf,
    pub python_version: Option<String>,
    pub package_count: usize,
    /// Why no package rows were produced, if inspection failed.
    pub inspection_error: Option<String>,
}

/// Both report tables plus a per-environment summary.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub timestamp: String,
    pub root: PathBuf,
    pub packages: Vec<PackageRow>,
    pub environments: Vec<EnvironmentRow>,
    pub summaries: Vec<EnvironmentSummary>,
}

impl AuditReport {
    /// Number of environments that contributed no package rows.
    pub fn failed_inspections(&self) -> usize {
        self.summaries
            .iter()
            .filter(|s| s.inspection_error.is_some())
            .count()
    }

    /// Print a colorized preview of both tables.
    pub fn print_terminal(&self, verbose: bool) {
        println!("\n{}", "═".repeat(80).bright_black());
        println!(
            "{}",
            "Aggregated Package Info Across Virtual Environments"
                .bright_white()
                .bold()
        );
        println!("{}", "═".repeat(80).bright_black());
        println!("{} {}", "Generated:".cyan(), self.timestamp);
        println!("{} {}\n", "Root:".cyan(), self.root.display());

        for (env, summary) in self.environments.iter().zip(&self.summaries) {
            let icon = if summary.inspection_error.is_some() {
                "✗".red()
            } else {
                "✓".green()
            };

            let detail = match &summary.python_version {
                Some(version) => format!(
                    "[Python {}, {} package(s)]",
                    version, summary.package_count
                ),
                None => "[no package data]".to_string(),
            };
            println!(
                "{} {} {}",
                icon,
                env.environment_name.bright_white().bold(),
                detail.dimmed()
            );
            println!("  {} {}", "location:".cyan(), summary.root_path.display());

            if let Some(reason) = &summary.inspection_error {
                println!("  {} {}", "inspection failed:".red(), reason);
            }
            println!(
                "  {} {}",
                "last access:".cyan(),
                env.environment_last_access_time
            );

            let lines: Vec<&str> = env.pip_check_output.lines().collect();
            if verbose || lines.len() <= 3 {
                for line in &lines {
                    println!("    • {}", line.dimmed());
                }
            } else {
                for line in lines.iter().take(3) {
                    println!("    • {}", line.dimmed());
                }
                println!(
                    "    {} {} more line(s) (use --verbose)",
                    "...".dimmed(),
                    (lines.len() - 3).to_string().dimmed()
                );
            }
            println!();
        }

        println!("{}", "═".repeat(80).bright_black());
        println!(
            "{} environment(s), {} package row(s), {} without package data",
            self.environments.len(),
            self.packages.len(),
            self.failed_inspections()
        );
    }
}

/// Drives locate → inspect → health check for every environment under a root.
pub struct Aggregator<P = Inspector> {
    locator: EnvironmentLocator,
    probe: P,
}

impl Aggregator<Inspector> {
    pub fn new(config: &AuditConfig) -> Self {
        Self::with_probe(config, Inspector::new(config.timeout))
    }
}

impl<P: EnvironmentProbe> Aggregator<P> {
    pub fn with_probe(config: &AuditConfig, probe: P) -> Self {
        Self {
            locator: EnvironmentLocator::new(config.layout).follow_links(config.follow_links),
            probe,
        }
    }

    /// Build both tables for every environment under `root`.
    ///
    /// Fails only when `root` is invalid or holds no environments. Problems
    /// with a single environment are recorded in its row and never stop the
    /// loop.
    pub fn aggregate(&self, root: impl AsRef<Path>) -> Result<AuditReport> {
        let root = root.as_ref();
        let envs = self.locator.locate(root)?;
        if envs.is_empty() {
            return Err(AuditError::NoEnvironmentsFound {
                root: root.to_path_buf(),
            });
        }

        let mut report = AuditReport {
            timestamp: Local::now().to_rfc3339(),
            root: root.to_path_buf(),
            packages: Vec::new(),
            environments: Vec::with_capacity(envs.len()),
            summaries: Vec::with_capacity(envs.len()),
        };

        for env in &envs {
            info!(
                "Processing environment: {} at {}",
                env.name,
                env.root_path.display()
            );
            self.process(env, &mut report);
        }

        Ok(report)
    }

    fn process(&self, env: &EnvironmentRef, report: &mut AuditReport) {
        let mut summary = EnvironmentSummary {
            name: env.name.clone(),
            root_path: env.root_path.clone(),
            python_version: None,
            package_count: 0,
            inspection_error: None,
        };

        match self.probe.inspect(env) {
            Ok(inspection) => {
                let meta = &inspection.metadata;
                summary.python_version = Some(meta.python_version.clone());
                summary.package_count = inspection.packages.len();
                report
                    .packages
                    .extend(inspection.packages.iter().map(|pkg| PackageRow {
                        environment_name: env.name.clone(),
                        python_version: meta.python_version.clone(),
                        python_installation_location: meta.interpreter_path.clone(),
                        environment_location: meta.environment_root.clone(),
                        package: pkg.package_name.clone(),
                        last_access_time: pkg.last_access.time_text().to_string(),
                        days_since_last_access: pkg.last_access.days_since(),
                    }));
            }
            Err(e) => {
                warn!("Error retrieving info for {}: {}", env.name, e);
                summary.inspection_error = Some(e.to_string());
            }
        }

        // Stat the root before pip check touches the environment.
        let last_access = root_last_access(&env.root_path);
        let health = self.probe.check_health(env);
        report.environments.push(EnvironmentRow {
            environment_name: env.name.clone(),
            environment_last_access_time: last_access,
            pip_check_output: health.raw_output,
        });
        report.summaries.push(summary);
    }
}

/// Access time of an environment root, or the error text if it cannot be read.
pub fn root_last_access(path: &Path) -> String {
    match std::fs::metadata(path).and_then(|m| m.accessed()) {
        Ok(atime) => format_ctime(atime),
        Err(e) => format!("Error: {}", e),
    }
}

pub fn format_ctime(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(CTIME_FORMAT).to_string()
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
