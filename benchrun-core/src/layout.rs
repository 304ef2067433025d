//! Project Layout
//!
//! Paths the pipeline works with and the filesystem steps around the build:
//! preparing the build directory and moving the compilation database out of it.

use crate::error::{PipelineError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Compilation database emitted by the build-system generator
pub const COMPILE_DB_NAME: &str = "compile_commands.json";

/// Default build directory name, relative to the project root
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Default benchmark source directory name, relative to the project root
pub const DEFAULT_BENCH_DIR: &str = "bench";

/// How the build directory is treated before configuring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Remove any existing build directory and start from scratch
    #[default]
    Clean,
    /// Reuse the build directory, creating it if absent
    Incremental,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    build_dir: PathBuf,
    bench_dir: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            build_dir: root.join(DEFAULT_BUILD_DIR),
            bench_dir: root.join(DEFAULT_BENCH_DIR),
            root,
        }
    }

    pub fn with_build_dir(mut self, name: impl AsRef<Path>) -> Self {
        self.build_dir = self.root.join(name);
        self
    }

    pub fn with_bench_dir(mut self, name: impl AsRef<Path>) -> Self {
        self.bench_dir = self.root.join(name);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn bench_dir(&self) -> &Path {
        &self.bench_dir
    }

    /// Where the generator writes the compilation database
    pub fn build_compile_db(&self) -> PathBuf {
        self.build_dir.join(COMPILE_DB_NAME)
    }

    /// Where tooling expects to find the compilation database
    pub fn root_compile_db(&self) -> PathBuf {
        self.root.join(COMPILE_DB_NAME)
    }
}

/// Make sure the build directory exists according to `mode`
pub fn prepare_build_dir(layout: &ProjectLayout, mode: BuildMode) -> Result<()> {
    let dir = layout.build_dir();

    match mode {
        BuildMode::Clean => {
            if dir.exists() {
                tracing::debug!(dir = %dir.display(), "removing build directory");
                fs::remove_dir_all(dir).map_err(|e| {
                    PipelineError::io(format!("Failed to remove {}", dir.display()), e)
                })?;
            }
            fs::create_dir_all(dir)
                .map_err(|e| PipelineError::io(format!("Failed to create {}", dir.display()), e))?;
        }
        BuildMode::Incremental => {
            if !dir.is_dir() {
                fs::create_dir_all(dir).map_err(|e| {
                    PipelineError::io(format!("Failed to create {}", dir.display()), e)
                })?;
            }
        }
    }

    Ok(())
}

/// Move the compilation database from the build directory to the project root,
/// replacing any previous copy
pub fn relocate_compile_db(layout: &ProjectLayout) -> Result<PathBuf> {
    let from = layout.build_compile_db();
    let to = layout.root_compile_db();

    if !from.is_file() {
        return Err(PipelineError::MissingCompileDb(from));
    }

    // rename(2) replaces the destination atomically on unix, not on windows
    if cfg!(windows) && to.exists() {
        fs::remove_file(&to)
            .map_err(|e| PipelineError::io(format!("Failed to remove {}", to.display()), e))?;
    }

    fs::rename(&from, &to).map_err(|e| {
        PipelineError::io(
            format!("Failed to move {} to {}", from.display(), to.display()),
            e,
        )
    })?;

    Ok(to)
}
