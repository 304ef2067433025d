//! Command Runner
//!
//! Spawns external tools with their standard streams wired straight to ours
//! and turns a non-zero exit into a [`CommandError`].

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code}")]
    Failed { program: String, code: i32 },

    #[error("{program} was terminated by signal {signal}")]
    Signaled { program: String, signal: i32 },
}

impl CommandError {
    /// Name of the executable that failed
    pub fn program(&self) -> &str {
        match self {
            CommandError::Spawn { program, .. }
            | CommandError::Failed { program, .. }
            | CommandError::Signaled { program, .. } => program,
        }
    }

    /// Exit code the whole run terminates with
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Spawn { .. } => 1,
            CommandError::Failed { code, .. } => *code,
            // Shell convention for a child killed by a signal
            CommandError::Signaled { signal, .. } => 128 + signal,
        }
    }

    /// Map a finished process status to `Ok(())` or the matching error
    pub fn check(program: &str, status: ExitStatus) -> Result<(), CommandError> {
        if status.success() {
            return Ok(());
        }

        if let Some(code) = status.code() {
            return Err(CommandError::Failed {
                program: program.to_string(),
                code,
            });
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Err(CommandError::Signaled {
                    program: program.to_string(),
                    signal,
                });
            }
        }

        Err(CommandError::Failed {
            program: program.to_string(),
            code: 1,
        })
    }
}

/// A single external command: program, arguments and working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Program name as it appears in diagnostics
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Render the command line for logging
    pub fn display(&self) -> String {
        let mut line = self.program_name();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Executes invocations to completion
pub trait CommandRunner {
    /// Run the invocation and block until it exits.
    ///
    /// Returns `Ok(())` only for a zero exit status.
    fn run(&mut self, invocation: &Invocation) -> Result<(), CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &mut R {
    fn run(&mut self, invocation: &Invocation) -> Result<(), CommandError> {
        (**self).run(invocation)
    }
}

/// Runs commands as real child processes with inherited stdio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<(), CommandError> {
        let program = invocation.program_name();
        tracing::debug!(command = %invocation.display(), cwd = ?invocation.cwd(), "spawning");

        let mut child = invocation
            .to_command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: program.clone(),
                source,
            })?;

        let status = child.wait().map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;

        tracing::debug!(%program, ?status, "exited");
        CommandError::check(&program, status)
    }
}
