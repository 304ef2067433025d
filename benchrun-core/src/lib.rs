//! benchrun core
//!
//! Drives an external build-system generator, a native build tool and the
//! resulting benchmark binaries as one blocking pipeline:
//!
//! 1. prepare the build directory (clean or incremental)
//! 2. configure with the generator, exporting a compilation database
//! 3. move the compilation database to the project root
//! 4. build
//! 5. run each benchmark binary with its output streamed live
//!
//! Any command that exits non-zero ends the run with that exit code.

mod error;
mod layout;
mod discovery;
mod pipeline;
mod runner;

pub use discovery::{
    binary_name_for, discover_benchmarks, plan_benchmarks, BenchSelection, BenchTarget,
    BENCH_SOURCE_SUFFIX, DEFAULT_FIXED_BINARY,
};
pub use error::{PipelineError, Result};
pub use layout::{
    prepare_build_dir, relocate_compile_db, BuildMode, ProjectLayout, COMPILE_DB_NAME,
    DEFAULT_BENCH_DIR, DEFAULT_BUILD_DIR,
};
pub use pipeline::{Pipeline, PipelineConfig, RunSummary};
pub use runner::{CommandError, CommandRunner, Invocation, SystemRunner};
