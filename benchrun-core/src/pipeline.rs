//! Benchmark Pipeline
//!
//! Runs the fixed configure → build → benchmark sequence. Every step blocks
//! until it finishes and the first failure ends the run.

use crate::discovery::{plan_benchmarks, BenchSelection, BenchTarget, DEFAULT_FIXED_BINARY};
use crate::error::{PipelineError, Result};
use crate::layout::{prepare_build_dir, relocate_compile_db, BuildMode, ProjectLayout};
use crate::runner::{CommandRunner, Invocation};
use regex::Regex;
use std::io::Write;
use std::time::{Duration, Instant};

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub layout: ProjectLayout,
    pub build_mode: BuildMode,
    pub selection: BenchSelection,
    /// Build-system generator program
    pub generator: String,
    /// Value passed as `CMAKE_BUILD_TYPE`
    pub build_type: String,
    /// Extra `-DKEY=VALUE` definitions for the generator
    pub defines: Vec<(String, String)>,
    /// Native build tool program
    pub build_tool: String,
    pub build_args: Vec<String>,
    /// Keep only discovered benchmarks whose name matches
    pub filter: Option<Regex>,
    /// Printed on its own line after each benchmark
    pub bench_separator: String,
}

impl PipelineConfig {
    /// Clean rebuild that runs every discovered benchmark
    pub fn full(layout: ProjectLayout) -> Self {
        Self {
            layout,
            build_mode: BuildMode::Clean,
            selection: BenchSelection::Discover,
            generator: "cmake".to_string(),
            build_type: "Release".to_string(),
            defines: Vec::new(),
            build_tool: "make".to_string(),
            build_args: Vec::new(),
            filter: None,
            bench_separator: "\n".to_string(),
        }
    }

    /// Reuse the build directory and run the single `bench` binary
    pub fn incremental(layout: ProjectLayout) -> Self {
        Self {
            build_mode: BuildMode::Incremental,
            selection: BenchSelection::Fixed(DEFAULT_FIXED_BINARY.to_string()),
            ..Self::full(layout)
        }
    }

    /// The generator invocation, run from inside the build directory with the
    /// project root as its source directory
    pub fn configure_invocation(&self) -> Invocation {
        let mut inv = Invocation::new(&self.generator)
            .arg("-DCMAKE_EXPORT_COMPILE_COMMANDS=ON")
            .arg(format!("-DCMAKE_BUILD_TYPE={}", self.build_type));
        for (key, value) in &self.defines {
            inv = inv.arg(format!("-D{}={}", key, value));
        }
        inv.arg(self.layout.root())
            .current_dir(self.layout.build_dir())
    }

    pub fn build_invocation(&self) -> Invocation {
        Invocation::new(&self.build_tool)
            .args(&self.build_args)
            .current_dir(self.layout.build_dir())
    }

    pub fn bench_invocation(&self, target: &BenchTarget) -> Invocation {
        let build_dir = self.layout.build_dir();
        Invocation::new(target.binary_path(build_dir)).current_dir(build_dir)
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub benchmarks_run: Vec<String>,
    pub duration: Duration,
}

/// Sequences the pipeline steps over a [`CommandRunner`]
pub struct Pipeline<R> {
    config: PipelineConfig,
    runner: R,
}

impl<R: CommandRunner> Pipeline<R> {
    pub fn new(config: PipelineConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Benchmarks the run would execute, without touching the build
    pub fn plan(&self) -> Result<Vec<BenchTarget>> {
        plan_benchmarks(
            &self.config.selection,
            &self.config.layout,
            self.config.filter.as_ref(),
        )
    }

    /// Run every step, stopping at the first failure
    pub fn run(&mut self) -> Result<RunSummary> {
        let start = Instant::now();
        let layout = &self.config.layout;

        tracing::info!(
            dir = %layout.build_dir().display(),
            mode = ?self.config.build_mode,
            "preparing build directory"
        );
        prepare_build_dir(layout, self.config.build_mode)?;

        let configure = self.config.configure_invocation();
        tracing::info!(command = %configure.display(), "configuring");
        self.runner.run(&configure)?;

        let db = relocate_compile_db(layout)?;
        tracing::debug!(path = %db.display(), "compilation database relocated");

        let build = self.config.build_invocation();
        tracing::info!(command = %build.display(), "building");
        self.runner.run(&build)?;

        let targets = self.plan()?;
        let names: Vec<&str> = targets.iter().map(|t| t.binary.as_str()).collect();
        tracing::info!(count = targets.len(), benchmarks = ?names, "running benchmarks");

        let mut benchmarks_run = Vec::with_capacity(targets.len());
        for target in &targets {
            let invocation = self.config.bench_invocation(target);
            tracing::debug!(benchmark = %target.binary, "starting");
            self.runner.run(&invocation)?;
            self.separate()?;
            benchmarks_run.push(target.binary.clone());
        }

        let summary = RunSummary {
            benchmarks_run,
            duration: start.elapsed(),
        };
        tracing::info!(
            "{} benchmarks completed in {:.2} s",
            summary.benchmarks_run.len(),
            summary.duration.as_secs_f64()
        );

        Ok(summary)
    }

    fn separate(&self) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", self.config.bench_separator)
            .and_then(|_| out.flush())
            .map_err(|e| PipelineError::io("Failed to write to stdout", e))
    }
}
