//! Sparkflow CLI Entry Point
//!
//! Provides command-line interface for project execution.
//!
//! # Usage
//!
//! ```bash
//! # Execute the projects in a file against a catalog
//! sparkflow catalog.yaml project.yaml
//!
//! # Force a workflow type for every project
//! sparkflow catalog.yaml project.yaml --workflow-type text_generation
//!
//! # Feed each phase the previous phase's output
//! sparkflow catalog.yaml project.yaml --chain
//!
//! # Print reports as JSON
//! sparkflow catalog.yaml project.yaml --json
//! ```

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use colored::Colorize;
use log::{error, info, warn};

use sparkflow::execution::{register_builtin_phases, EchoGenerator, InputWiring, WorkflowEngine};
use sparkflow::monitoring::{PhaseStatus, ProjectTimeline};
use sparkflow::workflow::{load_catalog, load_project_specs};
use sparkflow::{ExecutionFailure, ExecutionReport, APP_NAME, VERSION};

/// Default catalog file used when none is specified.
const DEFAULT_CATALOG: &str = "catalog.yaml";

/// Default project file used when none is specified.
const DEFAULT_PROJECT: &str = "project.yaml";

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    catalog_path: String,
    project_path: String,
    workflow_type: Option<String>,
    chain: bool,
    json: bool,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: DEFAULT_CATALOG.to_string(),
            project_path: DEFAULT_PROJECT.to_string(),
            workflow_type: None,
            chain: false,
            json: false,
            verbose: false,
        }
    }
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("Phased Content Workflow Engine");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: sparkflow [OPTIONS] <CATALOG_FILE> <PROJECT_FILE>");
    println!();
    println!("Arguments:");
    println!("  <CATALOG_FILE>        Models and workflows (YAML or JSON)");
    println!("  <PROJECT_FILE>        One project or a list of projects (YAML or JSON)");
    println!();
    println!("Options:");
    println!("  --workflow-type CODE  Run every project with this workflow type");
    println!("  --chain               Pass each phase the previous phase's output");
    println!("  --json                Print execution reports as JSON");
    println!("  --verbose             Enable debug logging");
    println!("  --help                Show this help message");
    println!("  --version             Show version information");
    println!();
    println!("Examples:");
    println!("  sparkflow catalog.yaml project.yaml");
    println!("  sparkflow catalog.yaml projects.json --chain --json");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut positional_index = 0;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--chain" => {
                config.chain = true;
            }
            "--json" => {
                config.json = true;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--workflow-type" => {
                i += 1;
                if i >= args.len() {
                    return Err("--workflow-type requires a type code argument".to_string());
                }
                config.workflow_type = Some(args[i].clone());
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                match positional_index {
                    0 => config.catalog_path = arg.clone(),
                    1 => config.project_path = arg.clone(),
                    _ => return Err(format!("Unexpected argument: {}", arg)),
                }
                positional_index += 1;
            }
        }
        i += 1;
    }

    Ok(config)
}

fn colored_status(status: PhaseStatus) -> colored::ColoredString {
    match status {
        PhaseStatus::Completed => status.as_str().green(),
        PhaseStatus::Failed => status.as_str().red().bold(),
        PhaseStatus::InProgress => status.as_str().yellow(),
        PhaseStatus::NotStarted => status.as_str().dimmed(),
    }
}

fn print_timeline(timeline: &ProjectTimeline) {
    for entry in timeline.entries() {
        let duration = entry
            .duration_ms()
            .map(|ms| format!("{} ms", ms))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<24} {:<12} {}",
            entry.phase_name,
            colored_status(entry.status),
            duration
        );
        if let Some(ref message) = entry.error {
            println!("    {}", message.red());
        }
    }
    println!();
    println!("{}", timeline.gantt_chart());
}

fn print_report(report: &ExecutionReport) {
    println!(
        "{} run {} ({})",
        "Completed".green().bold(),
        report.run_id,
        report.workflow_type
    );
    print_timeline(&report.timeline);

    for (phase, output) in &report.results {
        let text = output
            .get("generated_content")
            .or_else(|| output.get("analysis"))
            .or_else(|| output.get("error"))
            .and_then(|v| v.as_str());
        if let Some(text) = text {
            println!("{}:", phase.bold());
            println!("  {}", text);
        }
    }
}

fn print_failure(failure: &ExecutionFailure) {
    println!(
        "{} run {}: {}",
        "Failed".red().bold(),
        failure.run_id,
        failure.kind()
    );
    if let Some(ref phase) = failure.failed_phase {
        println!("  Failed phase: {}", phase);
    }
    print_timeline(&failure.timeline);
}

/// Main application entry point.
async fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);

    if !config.json {
        print_banner();
    }

    info!("Loading catalog: {}", config.catalog_path);
    let catalog = load_catalog(&config.catalog_path).map_err(|e| {
        error!("Failed to load catalog: {}", e);
        format!("Could not load catalog from '{}': {}", config.catalog_path, e)
    })?;
    info!(
        "Catalog loaded: {} models, {} workflows",
        catalog.models.len(),
        catalog.workflows.len()
    );

    let mut specs = load_project_specs(&config.project_path).map_err(|e| {
        error!("Failed to load projects: {}", e);
        format!("Could not load projects from '{}': {}", config.project_path, e)
    })?;
    if specs.is_empty() {
        warn!("No projects found in {}", config.project_path);
    }

    if let Some(ref code) = config.workflow_type {
        info!("Workflow type override: {}", code);
        for spec in &mut specs {
            spec.workflow_type = Some(code.clone());
        }
    }

    let mut engine = WorkflowEngine::new(Arc::new(EchoGenerator::new()));
    register_builtin_phases(engine.phases_mut());
    engine.load_catalog(catalog);
    if config.chain {
        engine.set_input_wiring(InputWiring::Chained);
    }

    let outcomes = engine.execute_batch(&specs).await;
    let failures = outcomes.iter().filter(|o| o.is_err()).count();

    if config.json {
        let documents: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|outcome| match outcome {
                Ok(report) => serde_json::to_value(report),
                Err(failure) => Ok(serde_json::json!({
                    "run_id": failure.run_id,
                    "error": failure.to_string(),
                    "failed_phase": failure.failed_phase,
                    "results": failure.partial_results,
                    "timeline": failure.timeline,
                })),
            })
            .collect::<Result<_, _>>()?;
        println!("{}", serde_json::to_string_pretty(&documents)?);
    } else {
        for outcome in &outcomes {
            match outcome {
                Ok(report) => print_report(report),
                Err(failure) => print_failure(failure),
            }
            println!();
        }
    }

    info!(
        "{} of {} projects completed",
        outcomes.len() - failures,
        outcomes.len()
    );

    Ok(failures == 0)
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
