//! rdclink CLI
//!
//! Main entry point for the `rdcl` command.

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use rdclink::{Description, LinkPlan};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "rdcl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Relocatable device code link planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Construct a build description and print its link plan
    Plan {
        /// Build description
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: Format,

        /// Only show these targets (and their shadows)
        #[arg(short, long = "target", value_name = "NAME")]
        targets: Vec<String>,
    },

    /// Print the final libraries a target device-links or links against
    Finals {
        /// Build description
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Consumer target
        #[arg(value_name = "TARGET")]
        target: String,
    },

    /// Print the declarations made on the host build system
    Trace {
        /// Build description
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Construct and validate a build description
    Check {
        /// Build description
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show information about the tool
    Info,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Format {
    /// Human-readable summary
    Text,
    /// JSON link plan
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Plan {
            input,
            format,
            targets,
        } => plan(&input, format, &targets),
        Commands::Finals { input, target } => finals(&input, &target),
        Commands::Trace { input } => trace(&input),
        Commands::Check { input } => check(&input),
        Commands::Info => {
            info();
            Ok(())
        }
    }
}

/// Load, construct and finish a description, attaching source to errors
fn construct(input: &Path) -> Result<rdclink::Constructed<rdclink::RecordingHost>> {
    let (description, source) = Description::load(input)?;
    tracing::info!(
        "loaded {} declaration(s) from {}",
        description.steps.len(),
        source.name
    );
    let constructed = description.evaluate()?;
    Ok(constructed)
}

fn plan(input: &Path, format: Format, targets: &[String]) -> Result<()> {
    let constructed = construct(input)?;
    let plan = LinkPlan::from_graph(&constructed.graph).only(targets);

    match format {
        Format::Text => print!("{plan}"),
        Format::Json => println!("{}", plan.to_json().into_diagnostic()?),
    }
    Ok(())
}

fn finals(input: &Path, target: &str) -> Result<()> {
    let constructed = construct(input)?;
    for name in constructed.final_library_names(target)? {
        println!("{name}");
    }
    Ok(())
}

fn trace(input: &Path) -> Result<()> {
    let constructed = construct(input)?;
    for call in constructed.host.calls() {
        println!("{}", serde_json::to_string(call).into_diagnostic()?);
    }
    Ok(())
}

fn check(input: &Path) -> Result<()> {
    let constructed = construct(input)?;
    println!(
        "✓ {} ({} targets, {} edges)",
        input.display(),
        constructed.graph.len(),
        constructed.graph.edge_count()
    );
    Ok(())
}

fn info() {
    println!("rdcl {}", rdclink::VERSION);
    println!();
    println!("Device library expansion:");
    println!("  SHARED  <name>_objects, <name>_static, <name>_middle, <name>_final");
    println!("  STATIC  <name>_objects, <name>_static, <name>_final");
    println!();
    println!("Commands: plan, finals, trace, check, info");
}
