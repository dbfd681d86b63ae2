//! Scenario Runner - Run TOML navigation scenarios from the command line
//!
//! Each scenario builds a nav graph, scripts a bot and its target through a
//! run of ticks, and checks intents, edges and the final bot state.
//!
//! Exit code: 0 when everything passes, 1 on failed expectations, 2 when a
//! scenario could not be loaded or run.
//!
//! Usage:
//!   cargo run --bin test-scenarios
//!   cargo run --bin test-scenarios -- gap --verbose
//!   cargo run --bin test-scenarios -- --tuning config/bot_tuning.json --json

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Serialize;

use tagbot::constants::LEVELS_FILE;
use tagbot::levels::LevelDatabase;
use tagbot::testing::{
    RunSummary, SCENARIOS_DIR, TestResult, parse_scenario_file, run_scenario_with,
};
use tagbot::tuning::{BotTuning, load_bot_tuning_from_file};

fn main() -> ExitCode {
    let config = ScenarioRunConfig::from_args();

    if config.show_help {
        print_help();
        return ExitCode::SUCCESS;
    }

    let base_tuning = match &config.tuning_file {
        Some(path) => match load_bot_tuning_from_file(path) {
            Ok(tuning) => tuning,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::from(2);
            }
        },
        None => BotTuning::default(),
    };

    let scenarios = match discover_scenarios(&config.scenarios_dir, config.filter.as_deref()) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };
    if scenarios.is_empty() {
        eprintln!(
            "No scenarios in {} match {:?}",
            config.scenarios_dir.display(),
            config.filter
        );
        return ExitCode::from(2);
    }

    if config.list {
        for path in &scenarios {
            println!("{}", scenario_name(path));
        }
        return ExitCode::SUCCESS;
    }

    let level_db = LevelDatabase::load_from_file(&config.levels_file);
    let reports: Vec<ScenarioReport> = scenarios
        .iter()
        .map(|path| run_one(path, &level_db, &base_tuning))
        .collect();

    let totals = Totals::count(&reports);
    if config.json {
        let output = JsonOutput {
            scenarios: &reports,
            totals,
        };
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize report: {}", e);
                return ExitCode::from(2);
            }
        }
    } else {
        print_table(&reports, &totals, config.verbose);
    }

    totals.exit_code()
}

/// Command line options for the scenario runner
struct ScenarioRunConfig {
    scenarios_dir: PathBuf,
    levels_file: String,
    tuning_file: Option<String>,
    filter: Option<String>,
    json: bool,
    verbose: bool,
    list: bool,
    show_help: bool,
}

impl Default for ScenarioRunConfig {
    fn default() -> Self {
        Self {
            scenarios_dir: PathBuf::from(SCENARIOS_DIR),
            levels_file: LEVELS_FILE.to_string(),
            tuning_file: None,
            filter: None,
            json: false,
            verbose: false,
            list: false,
            show_help: false,
        }
    }
}

impl ScenarioRunConfig {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut config = Self::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--dir" | "-d" => {
                    if i + 1 < args.len() {
                        config.scenarios_dir = PathBuf::from(&args[i + 1]);
                        i += 1;
                    }
                }
                "--levels" => {
                    if i + 1 < args.len() {
                        config.levels_file = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--tuning" => {
                    if i + 1 < args.len() {
                        config.tuning_file = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--json" => config.json = true,
                "--verbose" | "-v" => config.verbose = true,
                "--list" => config.list = true,
                "--help" | "-h" => config.show_help = true,
                arg if !arg.starts_with('-') => {
                    // Positional argument: name filter
                    config.filter = Some(arg.to_string());
                }
                other => eprintln!("Ignoring unknown option {}", other),
            }
            i += 1;
        }

        config
    }
}

fn print_help() {
    println!(
        r#"Scenario Runner - Run TOML navigation scenarios

USAGE:
    cargo run --bin test-scenarios -- [FILTER] [OPTIONS]

ARGUMENTS:
    FILTER                   Only run scenarios whose file name contains this

OPTIONS:
    --dir, -d <DIR>          Scenario directory (default: tests/scenarios)
    --levels <FILE>          Levels file for `setup.level` (default: assets/levels.txt)
    --tuning <FILE>          Tuning JSON for scenarios without [setup.tuning]
    --json                   Print a JSON report instead of the table
    --verbose, -v            Show expected/actual values for failures
    --list                   List matching scenarios without running them
    --help, -h               Show this help

EXIT CODES:
    0 all passed, 1 some failed, 2 some could not be loaded or run
"#
    );
}

/// Outcome of one scenario file
#[derive(Serialize)]
struct ScenarioReport {
    name: String,
    title: Option<String>,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<RunSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Serialize, Clone, Copy, Default)]
struct Totals {
    passed: usize,
    failed: usize,
    errors: usize,
}

impl Totals {
    fn count(reports: &[ScenarioReport]) -> Self {
        let mut totals = Self::default();
        for report in reports {
            match report.status {
                "pass" => totals.passed += 1,
                "fail" => totals.failed += 1,
                _ => totals.errors += 1,
            }
        }
        totals
    }

    fn exit_code(&self) -> ExitCode {
        if self.errors > 0 {
            ExitCode::from(2)
        } else if self.failed > 0 {
            ExitCode::from(1)
        } else {
            ExitCode::SUCCESS
        }
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    scenarios: &'a [ScenarioReport],
    totals: Totals,
}

fn run_one(path: &Path, level_db: &LevelDatabase, base_tuning: &BotTuning) -> ScenarioReport {
    let name = scenario_name(path);
    let def = match parse_scenario_file(path) {
        Ok(def) => def,
        Err(message) => {
            return ScenarioReport {
                name,
                title: None,
                status: "error",
                summary: None,
                message: Some(message),
                detail: None,
            };
        }
    };

    let mut report = ScenarioReport {
        name,
        title: Some(def.name.clone()),
        status: "pass",
        summary: None,
        message: None,
        detail: None,
    };
    match run_scenario_with(&def, level_db, base_tuning) {
        TestResult::Pass { summary } => report.summary = Some(summary),
        TestResult::Fail { error } => {
            report.status = "fail";
            report.message = Some(error.message.clone());
            report.detail = Some(error.to_string());
        }
        TestResult::Error { message } => {
            report.status = "error";
            report.message = Some(message);
        }
    }
    report
}

fn print_table(reports: &[ScenarioReport], totals: &Totals, verbose: bool) {
    println!("{:<28} {:<6} {:>6} {:>6}  {}", "SCENARIO", "STATUS", "TICKS", "JUMPS", "MODE");
    println!("{}", "-".repeat(64));

    for report in reports {
        match &report.summary {
            Some(summary) => println!(
                "{:<28} {:<6} {:>6} {:>6}  {}",
                report.name,
                report.status.to_uppercase(),
                summary.ticks,
                summary.jumps,
                summary.final_mode.as_deref().unwrap_or("-")
            ),
            None => println!("{:<28} {:<6}", report.name, report.status.to_uppercase()),
        }

        let text = if verbose {
            report.detail.as_ref().or(report.message.as_ref())
        } else {
            report.message.as_ref()
        };
        if let Some(text) = text {
            println!("    {}", text);
        }
    }

    println!("{}", "-".repeat(64));
    println!(
        "{} passed, {} failed, {} errors",
        totals.passed, totals.failed, totals.errors
    );
}

/// Scenario files (`*.toml`) directly in `dir`, sorted, filtered by file stem
fn discover_scenarios(dir: &Path, filter: Option<&str>) -> Result<Vec<PathBuf>, String> {
    let entries = fs::read_dir(dir)
        .map_err(|e| format!("Cannot read scenario directory {}: {}", dir.display(), e))?;

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .filter(|path| filter.is_none_or(|f| scenario_name(path).contains(f)))
        .collect();
    paths.sort();
    Ok(paths)
}

fn scenario_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
