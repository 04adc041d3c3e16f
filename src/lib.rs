//! Discovery and auditing of Python virtual environments.
//!
//! This crate finds environments under a root directory, asks each
//! environment's own interpreter for its packages, runs `pip check`, and
//! flattens the results into a per-package and a per-environment table.

pub mod config;
pub mod error;
pub mod inspector;
pub mod locator;
pub mod process;
pub mod report;
pub mod sink;

pub use config::{AuditConfig, InterpreterLayout};
pub use error::{AuditError, InspectionError};
pub use inspector::{EnvironmentProbe, HealthCheckResult, Inspection, Inspector, LastAccess};
pub use locator::{EnvironmentLocator, EnvironmentRef};
pub use report::{Aggregator, AuditReport, EnvironmentRow, PackageRow};
pub use sink::{CsvSink, ReportSink};
