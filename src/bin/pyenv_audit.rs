use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use pyenv_audit::config::DEFAULT_TIMEOUT_SECS;
use pyenv_audit::{Aggregator, AuditConfig, CsvSink, InterpreterLayout, ReportSink};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    Auto,
    Posix,
    Windows,
}

/// Report installed packages and dependency health for every Python
/// virtual environment under a directory.
#[derive(Debug, Parser)]
#[command(name = "pyenv-audit", version)]
struct Cli {
    /// Folder containing the virtual environments (prompted for when omitted)
    root: Option<PathBuf>,

    /// Directory the CSV files are written to
    #[arg(short, long, env = "PYENV_AUDIT_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Interpreter location inside each environment
    #[arg(long, value_enum, default_value_t = LayoutArg::Auto)]
    layout: LayoutArg,

    /// Per-subprocess timeout in seconds, 0 disables it
    #[arg(long, env = "PYENV_AUDIT_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Follow directory symlinks while scanning
    #[arg(long)]
    follow_links: bool,

    /// Print the aggregated report as JSON on stdout instead of the summary
    #[arg(long)]
    json: bool,

    /// Show every pip check line in the summary
    #[arg(short, long)]
    verbose: bool,

    /// Skip the terminal summary
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("pyenv_audit=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pyenv_audit=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn prompt_root() -> Result<PathBuf> {
    let input: String = dialoguer::Input::new()
        .with_prompt("Enter the full path to the folder containing your virtual environments")
        .interact_text()
        .context("Failed to read the root directory")?;
    Ok(PathBuf::from(input.trim()))
}

fn run(cli: Cli) -> Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => prompt_root()?,
    };

    let layout = match cli.layout {
        LayoutArg::Auto => InterpreterLayout::detect(),
        LayoutArg::Posix => InterpreterLayout::Posix,
        LayoutArg::Windows => InterpreterLayout::Windows,
    };
    let config = AuditConfig {
        layout,
        follow_links: cli.follow_links,
        ..AuditConfig::default()
    }
    .with_timeout_secs(cli.timeout);
    tracing::debug!("Audit config: {:?}", config);

    let report = Aggregator::new(&config).aggregate(&root)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !cli.quiet {
        report.print_terminal(cli.verbose);
    }

    let written = CsvSink::new(&cli.output_dir).write_report(&report)?;
    let names: Vec<String> = written.iter().map(|p| format!("'{}'", p.display())).collect();
    eprintln!(
        "\n{} {}",
        "CSV files generated:".green().bold(),
        names.join(" and ")
    );

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(1)
        }
    }
}
