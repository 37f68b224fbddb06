//! Command-line driver: analyze the calls of a scenario file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use phpantom_analyzer::config::Config;
use phpantom_analyzer::logging;
use phpantom_analyzer::scenario::{Scenario, ScenarioReport};

#[derive(Parser)]
#[command(name = "phpantom-analyze")]
#[command(version)]
#[command(about = "Resolve the static calls of a PHPantom scenario and report their types and issues")]
struct Cli {
    /// Scenario file (TOML)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Analyzer config file; defaults to .phpantom.toml next to the scenario
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let root = cli
        .scenario
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let config = match Config::discover(cli.config.as_deref(), &root) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    let report = match Scenario::load(&cli.scenario).and_then(|scenario| scenario.run(&config)) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    match cli.format {
        Format::Text => print_text(&report),
        Format::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::from(2);
            }
        },
    }

    if report.has_errors() || !report.failures().is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_text(report: &ScenarioReport) {
    for call in &report.calls {
        let ty = call.inferred_type.as_deref().unwrap_or("(none)");
        let fatal = if call.fatal { "  [fatal]" } else { "" };
        println!("{} => {ty}{fatal}", call.code);
        for issue in &call.issues {
            println!("  {issue}");
        }
    }
    for manipulation in &report.manipulations {
        println!(
            "edit {}..{}: {:?}",
            manipulation.start, manipulation.end, manipulation.insertion_text
        );
    }

    let failures = report.failures();
    if !failures.is_empty() {
        println!("\nFailed expectations:");
        for failure in &failures {
            println!("  {failure}");
        }
    }
}
