//! validate-config
//!
//! Loads one project configuration document, runs every validation pass
//! and prints the violations. Exits 0 when nothing fails, 1 on violations
//! and 2 when the run cannot finish: the document cannot be loaded or the
//! report cannot be written.

mod cli;
mod error;

use std::io;
use std::process::ExitCode;

use cfgcheck_meta::load_configuration;
use cfgcheck_rules::{ExitStatus, ReportOptions, Summary, Validator, ValidatorOptions, report};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::Cli;
use error::Result;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(status) => status.into(),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            e.exit_status().into()
        }
    }
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("{}: could not install logger: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("verbose mode enabled");
}

fn run(cli: &Cli) -> Result<ExitStatus> {
    let source = cli.source();
    let model = load_configuration(&source)?;

    let options = ValidatorOptions::from_model(&model).merge_cli(cli.strict);
    let validated = Validator::new(&model, options).validate();
    let strict = validated.strict();

    let report_options = ReportOptions {
        format: cli.format.into(),
        strict,
    };
    let status = report(validated.violations(), &report_options, &mut io::stdout().lock())?;

    print_summary(&model.origin, &Summary::new(validated.violations(), strict));
    Ok(status)
}

fn print_summary(origin: &str, summary: &Summary) {
    let label = if summary.failing == 0 {
        "ok".green().bold()
    } else {
        "failed".red().bold()
    };
    eprintln!("{}: {} ({})", label, origin, summary);
}
