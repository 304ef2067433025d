//! Benchmark Discovery
//!
//! Builds the ordered list of benchmark binaries to run, either by scanning
//! the benchmark source directory or from a single fixed binary name.

use crate::error::{PipelineError, Result};
use crate::layout::ProjectLayout;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Source file extension that marks a benchmark
pub const BENCH_SOURCE_SUFFIX: &str = ".cpp";

/// Binary run by the incremental flow when no name is given
pub const DEFAULT_FIXED_BINARY: &str = "bench";

/// Which benchmark binaries to run after the build
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BenchSelection {
    /// One binary per source file in the benchmark directory
    #[default]
    Discover,
    /// A single binary with this name
    Fixed(String),
}

/// A benchmark binary and, when discovered, the source it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchTarget {
    pub source: Option<PathBuf>,
    pub binary: String,
}

impl BenchTarget {
    pub fn fixed(binary: impl Into<String>) -> Self {
        Self {
            source: None,
            binary: binary.into(),
        }
    }

    fn from_source(source: PathBuf) -> Option<Self> {
        let binary = binary_name_for(&source)?;
        Some(Self {
            source: Some(source),
            binary,
        })
    }

    /// Path of the built binary inside `build_dir`
    pub fn binary_path(&self, build_dir: &Path) -> PathBuf {
        build_dir.join(&self.binary)
    }
}

/// Strip the directory and the `.cpp` suffix from a benchmark source path
pub fn binary_name_for(source: &Path) -> Option<String> {
    let file_name = source.file_name()?.to_str()?;
    let stem = file_name.strip_suffix(BENCH_SOURCE_SUFFIX)?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}

/// Scan `bench_dir` for benchmark sources, sorted by path.
///
/// A missing directory is not an error and yields no benchmarks.
pub fn discover_benchmarks(bench_dir: &Path, filter: Option<&Regex>) -> Result<Vec<BenchTarget>> {
    let entries = match fs::read_dir(bench_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(dir = %bench_dir.display(), "benchmark directory not found");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(PipelineError::io(
                format!("Failed to read {}", bench_dir.display()),
                e,
            ))
        }
    };

    let mut sources = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| PipelineError::io(format!("Failed to read {}", bench_dir.display()), e))?;
        let path = entry.path();
        if path.is_file() {
            sources.push(path);
        }
    }

    sources.sort();

    Ok(sources
        .into_iter()
        .filter_map(|source| {
            if source.file_name().is_some_and(|n| n.to_str().is_none()) {
                tracing::warn!(path = ?source, "skipping benchmark source with non UTF-8 name");
                return None;
            }
            BenchTarget::from_source(source)
        })
        .filter(|target| filter.map_or(true, |re| re.is_match(&target.binary)))
        .collect())
}

/// Resolve a selection into the ordered benchmarks to run
pub fn plan_benchmarks(
    selection: &BenchSelection,
    layout: &ProjectLayout,
    filter: Option<&Regex>,
) -> Result<Vec<BenchTarget>> {
    match selection {
        BenchSelection::Discover => discover_benchmarks(layout.bench_dir(), filter),
        BenchSelection::Fixed(binary) => Ok(vec![BenchTarget::fixed(binary.clone())]),
    }
}
