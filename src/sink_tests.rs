use super::*;
use crate::report::{EnvironmentRow, PackageRow};
use std::fs;
use tempfile::TempDir;

fn report(packages: Vec<PackageRow>, environments: Vec<EnvironmentRow>) -> AuditReport {
    AuditReport {
        timestamp: "2026-10-16T09:00:00+00:00".to_string(),
        root: PathBuf::from("/envs"),
        packages,
        environments,
        summaries: Vec::new(),
    }
}

fn read_records(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

#[test]
fn test_headers_written_without_rows() {
    let temp = TempDir::new().unwrap();
    let sink = CsvSink::new(temp.path());

    let written = sink.write_report(&report(vec![], vec![])).unwrap();

    assert_eq!(written, vec![sink.packages_path(), sink.environments_path()]);
    assert_eq!(
        read_records(&sink.packages_path()),
        vec![PACKAGE_COLUMNS.map(String::from).to_vec()]
    );
    assert_eq!(
        fs::read_to_string(sink.environments_path()).unwrap(),
        "Environment Name,Environment Last Access Time,Pip Check Output\n"
    );
}

#[test]
fn test_rows_round_through_csv_quoting() {
    let temp = TempDir::new().unwrap();
    let sink = CsvSink::new(temp.path());
    let pip_output = "flask 3.0.0 has requirement werkzeug>=3.0.0, but you have werkzeug 2.3.0.\nwarning";

    sink.write_report(&report(
        vec![
            PackageRow {
                environment_name: "web".to_string(),
                python_version: "3.12.4".to_string(),
                python_installation_location: "/envs/web/bin/python".to_string(),
                environment_location: "/envs/web".to_string(),
                package: "requests".to_string(),
                last_access_time: "Wed Oct 14 09:05:01 2026".to_string(),
                days_since_last_access: Some(2.13),
            },
            PackageRow {
                environment_name: "web".to_string(),
                python_version: "3.12.4".to_string(),
                python_installation_location: "/envs/web/bin/python".to_string(),
                environment_location: "/envs/web".to_string(),
                package: "typing-extensions".to_string(),
                last_access_time: "Package folder not found.".to_string(),
                days_since_last_access: None,
            },
        ],
        vec![EnvironmentRow {
            environment_name: "web".to_string(),
            environment_last_access_time: "Fri Oct 16 08:00:00 2026".to_string(),
            pip_check_output: pip_output.to_string(),
        }],
    ))
    .unwrap();

    let packages = read_records(&sink.packages_path());
    assert_eq!(packages.len(), 3);
    assert_eq!(packages[1][4], "requests");
    assert_eq!(packages[1][6], "2.13");
    assert_eq!(packages[2][5], "Package folder not found.");
    assert_eq!(packages[2][6], "");

    let envs = read_records(&sink.environments_path());
    assert_eq!(envs.len(), 2);
    assert_eq!(envs[1][2], pip_output);
}

#[test]
fn test_existing_files_are_replaced() {
    let temp = TempDir::new().unwrap();
    let sink = CsvSink::new(temp.path());
    fs::write(sink.packages_path(), "stale,data\n1,2\n3,4\n").unwrap();

    sink.write_report(&report(vec![], vec![])).unwrap();

    assert_eq!(read_records(&sink.packages_path()).len(), 1);
}

#[test]
fn test_missing_directory_is_reported() {
    let temp = TempDir::new().unwrap();
    let sink = CsvSink::new(temp.path().join("nope"));

    let err = sink.write_report(&report(vec![], vec![])).unwrap_err();

    assert!(err.to_string().contains("Failed to create"));
}
