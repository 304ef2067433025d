//! benchrun CLI Library
//!
//! Argument parsing and process-level handling around the
//! [`benchrun_core::Pipeline`]. With no arguments, `benchrun` does a clean
//! configure and build of the project in the current directory, then runs
//! every benchmark found in `bench/`.

mod config;

pub use config::*;

use benchrun_core::{
    CommandError, Pipeline, PipelineConfig, PipelineError, SystemRunner, DEFAULT_BENCH_DIR,
    DEFAULT_BUILD_DIR,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Preset combinations of build mode and benchmark selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Clean rebuild, run every benchmark in the bench directory
    Full,
    /// Reuse the build directory, run the single `bench` binary
    Incremental,
}

/// benchrun CLI arguments
#[derive(Parser, Debug)]
#[command(name = "benchrun")]
#[command(author, version, about = "Configure, build and run native benchmarks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Run only benchmarks whose name matches this regex
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Project root containing the build description
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Build directory, relative to the project root
    #[arg(long, default_value = DEFAULT_BUILD_DIR)]
    pub build_dir: String,

    /// Benchmark source directory, relative to the project root
    #[arg(long, default_value = DEFAULT_BENCH_DIR)]
    pub bench_dir: String,

    /// Preset: `full` or `incremental`
    #[arg(long, value_enum, default_value = "full")]
    pub variant: Variant,

    /// Keep an existing build directory instead of recreating it
    #[arg(long)]
    pub incremental: bool,

    /// Run this single binary instead of discovering benchmarks
    #[arg(long)]
    pub binary: Option<String>,

    /// Build-system generator
    #[arg(long, default_value = "cmake")]
    pub generator: String,

    /// Value for CMAKE_BUILD_TYPE
    #[arg(long, default_value = "Release")]
    pub build_type: String,

    /// Extra generator definition, KEY=VALUE (repeatable)
    #[arg(short = 'D', long)]
    pub define: Vec<String>,

    /// Native build tool
    #[arg(long, default_value = "make")]
    pub build_tool: String,

    /// Extra argument for the build tool (repeatable)
    #[arg(long, allow_hyphen_values = true)]
    pub build_arg: Vec<String>,

    /// Print the plan without building or running anything
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the benchmarks that would run
    List,
    /// Configure, build and run benchmarks (default)
    Run,
}

/// Parse arguments from the environment and run.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run with pre-parsed arguments.
///
/// A failing external command terminates the process with that command's
/// exit code.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    let config = cli.pipeline_config()?;

    match cli.command {
        Some(Commands::List) => list_benchmarks(config),
        Some(Commands::Run) | None if cli.dry_run => print_plan(config),
        Some(Commands::Run) | None => run_pipeline(config),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "benchrun=debug" } else { "benchrun=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout belongs to the benchmarks
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn list_benchmarks(config: PipelineConfig) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(config, SystemRunner::new());
    let targets = pipeline.plan()?;

    println!("Benchmark Plan:");
    for target in &targets {
        match &target.source {
            Some(source) => println!("├── {} ({})", target.binary, source.display()),
            None => println!("├── {}", target.binary),
        }
    }
    println!("{} benchmarks found.", targets.len());

    Ok(())
}

fn print_plan(config: PipelineConfig) -> anyhow::Result<()> {
    println!("Build directory: {} ({:?})", config.layout.build_dir().display(), config.build_mode);
    println!("Configure: {}", config.configure_invocation().display());
    println!("Build:     {}", config.build_invocation().display());

    let pipeline = Pipeline::new(config, SystemRunner::new());
    let targets = pipeline.plan()?;
    for target in &targets {
        println!("Run:       {}", pipeline.config().bench_invocation(target).display());
    }
    println!("{} benchmarks planned.", targets.len());

    Ok(())
}

fn run_pipeline(config: PipelineConfig) -> anyhow::Result<()> {
    let mut pipeline = Pipeline::new(config, SystemRunner::new());

    match pipeline.run() {
        Ok(_) => Ok(()),
        Err(PipelineError::Command(err)) => {
            if let CommandError::Spawn { source, .. } = &err {
                tracing::error!("{}: {}", err.program(), source);
            }
            eprintln!("{} failed. Aborting.", err.program());
            std::process::exit(err.exit_code());
        }
        Err(e) => Err(e.into()),
    }
}
