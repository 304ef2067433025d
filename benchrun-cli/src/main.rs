//! benchrun - configure, build and run native benchmarks

fn main() -> anyhow::Result<()> {
    benchrun_cli::run()
}
