//! Turns parsed command line arguments into a [`PipelineConfig`].

use crate::{Cli, Variant};
use benchrun_core::{BenchSelection, BuildMode, PipelineConfig, ProjectLayout, DEFAULT_FIXED_BINARY};
use regex::Regex;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Project directory {}: {source}", .path.display())]
    ProjectDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid definition '{0}', expected KEY=VALUE")]
    InvalidDefine(String),

    #[error("Invalid benchmark filter: {0}")]
    InvalidFilter(#[from] regex::Error),
}

/// Split a `KEY=VALUE` definition
pub fn parse_define(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidDefine(raw.to_string())),
    }
}

impl Cli {
    pub fn build_mode(&self) -> BuildMode {
        if self.incremental || self.variant == Variant::Incremental {
            BuildMode::Incremental
        } else {
            BuildMode::Clean
        }
    }

    pub fn selection(&self) -> BenchSelection {
        match (&self.binary, self.variant) {
            (Some(binary), _) => BenchSelection::Fixed(binary.clone()),
            (None, Variant::Incremental) => BenchSelection::Fixed(DEFAULT_FIXED_BINARY.to_string()),
            (None, Variant::Full) => BenchSelection::Discover,
        }
    }

    /// Build the pipeline configuration. The project directory must exist.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        // Commands run with the build directory as cwd, so paths must be absolute
        let root = self
            .project_dir
            .canonicalize()
            .map_err(|source| ConfigError::ProjectDir {
                path: self.project_dir.clone(),
                source,
            })?;

        let layout = ProjectLayout::new(root)
            .with_build_dir(&self.build_dir)
            .with_bench_dir(&self.bench_dir);

        let defines = self
            .define
            .iter()
            .map(|d| parse_define(d))
            .collect::<Result<Vec<_>, _>>()?;

        let mut config = PipelineConfig::full(layout);
        config.build_mode = self.build_mode();
        config.selection = self.selection();
        config.generator = self.generator.clone();
        config.build_type = self.build_type.clone();
        config.defines = defines;
        config.build_tool = self.build_tool.clone();
        config.build_args = self.build_arg.clone();
        config.filter = Some(Regex::new(&self.filter)?);

        Ok(config)
    }
}
