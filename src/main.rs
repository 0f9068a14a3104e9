//! PipeWeaver CLI Entry Point
//!
//! Loads type, tool and workflow definitions and prints the translated
//! workflow document.
//!
//! # Usage
//!
//! ```bash
//! # Translate a workflow using types.yaml and tools.yaml from the current directory
//! pipeweaver workflow.yaml
//!
//! # Explicit definition files
//! pipeweaver workflow.yaml --types defs/types.yaml --tools defs/tools.yaml
//!
//! # YAML output written to a file
//! pipeweaver workflow.yaml --format yaml --output workflow.cwl.yaml
//! ```

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use colored::Colorize;
use log::{error, info};

use pipeweaver::workflow::{load_tools, load_types, load_workflow};
use pipeweaver::{CwlTranslator, APP_NAME, VERSION};

/// Default type definition file used when none is specified.
const DEFAULT_TYPES: &str = "types.yaml";

/// Default tool definition file used when none is specified.
const DEFAULT_TOOLS: &str = "tools.yaml";

/// Serialization format of the translated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Yaml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    workflow_path: Option<String>,
    types_path: String,
    tools_path: String,
    format: OutputFormat,
    output: Option<PathBuf>,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workflow_path: None,
            types_path: DEFAULT_TYPES.to_string(),
            tools_path: DEFAULT_TOOLS.to_string(),
            format: OutputFormat::Json,
            output: None,
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
///
/// Goes to stderr: stdout carries the document.
fn print_banner() {
    eprintln!();
    eprintln!("{} v{}", APP_NAME.bold(), VERSION);
    eprintln!("Typed Workflow Graph Builder");
    eprintln!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: pipeweaver [OPTIONS] <WORKFLOW_FILE>");
    println!();
    println!("Arguments:");
    println!("  <WORKFLOW_FILE>     Path to workflow YAML file");
    println!();
    println!("Options:");
    println!("  --types PATH        Type definitions (default: {})", DEFAULT_TYPES);
    println!("  --tools PATH        Tool definitions (default: {})", DEFAULT_TOOLS);
    println!("  --format FORMAT     Output format: json or yaml (default: json)");
    println!("  --output PATH       Write the document to PATH instead of stdout");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Examples:");
    println!("  pipeweaver workflow.yaml");
    println!("  pipeweaver workflow.yaml --types demos/variantcaller/types.yaml \\");
    println!("      --tools demos/variantcaller/tools.yaml --format yaml");
}

/// Fetches the value following an option.
fn option_value<'a>(args: &'a [String], i: &mut usize, option: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires a value", option))
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
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
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--types" => {
                config.types_path = option_value(args, &mut i, "--types")?.to_string();
            }
            "--tools" => {
                config.tools_path = option_value(args, &mut i, "--tools")?.to_string();
            }
            "--format" => {
                config.format = match option_value(args, &mut i, "--format")? {
                    "json" => OutputFormat::Json,
                    "yaml" | "yml" => OutputFormat::Yaml,
                    other => return Err(format!("Invalid format: {}", other)),
                };
            }
            "--output" | "-o" => {
                config.output = Some(PathBuf::from(option_value(args, &mut i, "--output")?));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if config.workflow_path.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                config.workflow_path = Some(arg.clone());
            }
        }
        i += 1;
    }

    if config.workflow_path.is_none() {
        return Err("Missing <WORKFLOW_FILE>".to_string());
    }

    Ok(config)
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);
    print_banner();

    let workflow_path = config.workflow_path.as_deref().unwrap_or_default();

    let types = Arc::new(load_types(&config.types_path).map_err(|e| {
        error!("Failed to load types: {}", e);
        format!("Could not load types from '{}': {}", config.types_path, e)
    })?);
    let tools = load_tools(&config.tools_path).map_err(|e| {
        error!("Failed to load tools: {}", e);
        format!("Could not load tools from '{}': {}", config.tools_path, e)
    })?;

    let graph = load_workflow(workflow_path, types, &tools).map_err(|e| {
        error!("Failed to load workflow: {}", e);
        format!("Could not load workflow from '{}': {}", workflow_path, e)
    })?;

    info!(
        "Workflow '{}' loaded: {} steps, {} unique tools",
        graph.name(),
        graph.len(),
        graph.tools().len()
    );

    let document = CwlTranslator::new().translate(&graph)?;
    let rendered = match config.format {
        OutputFormat::Json => document.to_json()?,
        OutputFormat::Yaml => document.to_yaml()?,
    };

    match config.output {
        Some(path) => {
            fs::write(&path, rendered.as_bytes())?;
            info!("Wrote {} document to {}", config.format, path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
