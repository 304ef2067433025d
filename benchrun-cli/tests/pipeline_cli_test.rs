#![cfg(unix)]

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

/// Stand-in for cmake: logs the call and emits a compilation database
const FAKE_CMAKE: &str = r#"#!/bin/sh
echo "cmake $*" >> ../calls.log
if [ -n "$FAKE_CMAKE_EXIT" ]; then
  echo "configure error" >&2
  exit "$FAKE_CMAKE_EXIT"
fi
printf '[]' > compile_commands.json
"#;

/// Stand-in for make: one script per bench/*.cpp plus a fixed `bench` binary
const FAKE_MAKE: &str = r#"#!/bin/sh
echo "make" >> ../calls.log
if [ -n "$FAKE_MAKE_EXIT" ]; then
  exit "$FAKE_MAKE_EXIT"
fi
for src in ../bench/*.cpp; do
  [ -e "$src" ] || continue
  name=$(basename "$src" .cpp)
  printf '#!/bin/sh\necho %s >> ../calls.log\necho "running %s"\nexit ${FAKE_EXIT_%s:-0}\n' "$name" "$name" "$name" > "$name"
  chmod +x "$name"
done
if [ ! -e bench ]; then
  printf '#!/bin/sh\necho bench >> ../calls.log\necho "running bench"\n' > bench
  chmod +x bench
fi
"#;

struct Project {
    dir: TempDir,
    tools: PathBuf,
}

impl Project {
    fn new(benches: &[&str]) -> Result<Self, Box<dyn Error>> {
        let dir = tempdir()?;
        let tools = dir.path().join("tools");
        fs::create_dir(&tools)?;
        write_script(&tools.join("cmake"), FAKE_CMAKE)?;
        write_script(&tools.join("make"), FAKE_MAKE)?;

        fs::write(dir.path().join("CMakeLists.txt"), "project(hamt)\n")?;
        let bench = dir.path().join("bench");
        fs::create_dir(&bench)?;
        for name in benches {
            fs::write(bench.join(name), "int main() { return 0; }\n")?;
        }

        Ok(Self { dir, tools })
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self) -> Result<Command, Box<dyn Error>> {
        self.command_with_tools(&self.tools.join("cmake"), &self.tools.join("make"))
    }

    fn command_with_tools(&self, generator: &Path, build_tool: &Path) -> Result<Command, Box<dyn Error>> {
        let mut cmd = Command::cargo_bin("benchrun")?;
        cmd.current_dir(self.root())
            .arg("--generator")
            .arg(generator)
            .arg("--build-tool")
            .arg(build_tool)
            .env_remove("RUST_LOG");
        Ok(cmd)
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.root().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(|l| l.split_whitespace().next().unwrap_or_default().to_string())
            .collect()
    }
}

fn write_script(path: &Path, body: &str) -> Result<(), Box<dyn Error>> {
    fs::write(path, body)?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[test]
fn runs_benchmarks_in_sorted_order() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&["a.cpp", "c.cpp", "b.cpp"])?;

    project
        .command()?
        .assert()
        .success()
        .stdout(predicate::str::contains("running a"))
        .stdout(predicate::str::contains("running c"));

    assert_eq!(project.calls(), ["cmake", "make", "a", "b", "c"]);
    Ok(())
}

#[test]
fn configure_receives_fixed_options() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&[])?;

    project.command()?.assert().success();

    let log = fs::read_to_string(project.root().join("calls.log"))?;
    let configure = log.lines().next().unwrap_or_default();
    assert_eq!(
        configure,
        format!(
            "cmake -DCMAKE_EXPORT_COMPILE_COMMANDS=ON -DCMAKE_BUILD_TYPE=Release {}",
            project.root().canonicalize()?.display()
        )
    );
    Ok(())
}

#[test]
fn blank_line_follows_each_benchmark() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&["b.cpp", "a.cpp"])?;

    project
        .command()?
        .assert()
        .success()
        .stdout("running a\n\n\nrunning b\n\n\n");

    Ok(())
}

#[test]
fn compile_db_lands_in_project_root() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&["a.cpp"])?;

    project.command()?.assert().success();

    assert!(project.root().join("compile_commands.json").is_file());
    assert!(!project.root().join("build/compile_commands.json").exists());
    Ok(())
}

#[test]
fn empty_bench_dir_succeeds() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&[])?;

    project.command()?.assert().success();

    assert_eq!(project.calls(), ["cmake", "make"]);
    Ok(())
}

#[test]
fn configure_failure_propagates_exit_code() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&["a.cpp"])?;

    project
        .command()?
        .env("FAKE_CMAKE_EXIT", "1")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("configure error"))
        .stderr(predicate::str::contains("cmake failed. Aborting."));

    assert_eq!(project.calls(), ["cmake"]);
    Ok(())
}

#[test]
fn build_failure_propagates_exit_code() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&["a.cpp"])?;

    project
        .command()?
        .env("FAKE_MAKE_EXIT", "2")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("make failed. Aborting."));

    assert_eq!(project.calls(), ["cmake", "make"]);
    Ok(())
}

#[test]
fn benchmark_failure_stops_later_benchmarks() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&["a.cpp", "b.cpp", "c.cpp"])?;

    project
        .command()?
        .env("FAKE_EXIT_b", "5")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("b failed. Aborting."));

    assert_eq!(project.calls(), ["cmake", "make", "a", "b"]);
    Ok(())
}

#[test]
fn full_variant_recreates_build_dir() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&[])?;
    let build = project.root().join("build");
    fs::create_dir(&build)?;
    fs::write(build.join("stale.o"), "")?;

    project.command()?.assert().success();

    assert!(build.is_dir());
    assert!(!build.join("stale.o").exists());
    Ok(())
}

#[test]
fn incremental_variant_keeps_build_dir() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&["a.cpp"])?;
    let build = project.root().join("build");
    fs::create_dir(&build)?;
    fs::write(build.join("CMakeCache.txt"), "cached")?;

    project
        .command()?
        .args(["--variant", "incremental"])
        .assert()
        .success()
        .stdout(predicate::str::contains("running bench"));

    assert_eq!(fs::read_to_string(build.join("CMakeCache.txt"))?, "cached");
    assert_eq!(project.calls(), ["cmake", "make", "bench"]);
    Ok(())
}

#[test]
fn filter_limits_benchmarks() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&["bench.cpp", "dictionary.cpp"])?;

    project.command()?.arg("^dict").assert().success();

    assert_eq!(project.calls(), ["cmake", "make", "dictionary"]);
    Ok(())
}

#[test]
fn list_does_not_build() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&["b.cpp", "a.cpp"])?;

    project
        .command()?
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("├── a"))
        .stdout(predicate::str::contains("2 benchmarks found."));

    assert!(project.calls().is_empty());
    assert!(!project.root().join("build").exists());
    Ok(())
}

#[test]
fn dry_run_prints_commands() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&["a.cpp"])?;

    project
        .command()?
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "-DCMAKE_EXPORT_COMPILE_COMMANDS=ON -DCMAKE_BUILD_TYPE=Release ",
        ))
        .stdout(predicate::str::contains("1 benchmarks planned."));

    assert!(project.calls().is_empty());
    Ok(())
}

#[test]
fn missing_build_tool_fails() -> Result<(), Box<dyn Error>> {
    let project = Project::new(&[])?;

    project
        .command_with_tools(
            &project.tools.join("cmake"),
            Path::new("benchrun-no-such-build-tool"),
        )?
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "benchrun-no-such-build-tool failed. Aborting.",
        ));

    assert_eq!(project.calls(), ["cmake"]);
    Ok(())
}
