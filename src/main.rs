//! dagedit CLI - validate and lay out editor graphs

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use dagedit::editor::BINDINGS;
use dagedit::error::{DagError, FixSuggestion};
use dagedit::{layout_with, validate, Direction, GraphSnapshot, Settings, SugiyamaEngine};

/// Exit code for a graph that is not a valid DAG
const EXIT_INVALID: i32 = 1;
/// Exit code for any error (I/O, parse, config)
const EXIT_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "dagedit")]
#[command(about = "dagedit - validate and auto-layout DAG editor graphs")]
#[command(version)]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a graph file is a valid DAG
    Validate {
        /// Graph file (.json export or .yaml)
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },

    /// Auto-layout a graph file and print the result as JSON
    Layout {
        /// Graph file (.json export or .yaml)
        file: PathBuf,

        /// Layout direction (TB or LR), defaults to the configured one
        #[arg(short, long)]
        direction: Option<Direction>,

        /// Write the laid-out graph here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Settings file (defaults to ./dagedit.yaml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List editor keyboard shortcuts
    Shortcuts,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    // --verbose wins over RUST_LOG
    let filter = if cli.verbose {
        EnvFilter::new("dagedit=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Validate { file, format } => validate_file(&file, format),
        Commands::Layout {
            file,
            direction,
            output,
            config,
        } => layout_file(&file, direction, output.as_deref(), config.as_deref()),
        Commands::Shortcuts => {
            list_shortcuts();
            Ok(0)
        }
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            if let Some(suggestion) = e.fix_suggestion() {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
            process::exit(EXIT_ERROR);
        }
    }
}

fn validate_file(file: &Path, format: ReportFormat) -> Result<i32, DagError> {
    let snapshot = GraphSnapshot::load(file)?;
    let report = validate(&snapshot.nodes, &snapshot.edges);

    match format {
        ReportFormat::Text => {
            let line = report.status_line();
            if report.is_valid {
                println!("{}", line.green());
            } else {
                println!("{}", line.red());
                if !report.invalid_edges.is_empty() {
                    println!("  Invalid edges: {}", report.invalid_edges.join(", "));
                }
                if let Some(first) = report.cycle.first() {
                    println!("  Cycle: {} → {}", report.cycle.join(" → "), first);
                }
                if !report.disconnected_nodes.is_empty() {
                    println!(
                        "  Disconnected nodes: {}",
                        report.disconnected_nodes.join(", ")
                    );
                }
            }
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(if report.is_valid { 0 } else { EXIT_INVALID })
}

fn layout_file(
    file: &Path,
    direction: Option<Direction>,
    output: Option<&Path>,
    config: Option<&Path>,
) -> Result<i32, DagError> {
    let settings = Settings::load(config)?;
    let snapshot = GraphSnapshot::load(file)?;
    let direction = direction.unwrap_or(settings.direction);

    let outcome = layout_with(
        &SugiyamaEngine,
        &settings.layout,
        &snapshot.nodes,
        &snapshot.edges,
        direction,
    );

    if let Some(warning) = &outcome.warning {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }

    let laid_out = GraphSnapshot::new(outcome.nodes, snapshot.edges);
    let json = laid_out.to_json_pretty()?;

    match output {
        Some(path) => {
            fs::write(path, format!("{}\n", json))?;
            println!(
                "{} Wrote {} nodes ({}) to {}",
                "✓".green(),
                laid_out.nodes.len(),
                direction,
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(0)
}

fn list_shortcuts() {
    println!("{}", "Keyboard shortcuts".cyan().bold());
    for binding in BINDINGS {
        println!("  {} {}", format!("{:<14}", binding.chord).bold(), binding.action.label());
    }
}
