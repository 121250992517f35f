//! External command execution.
//!
//! Every external tool (git, uv, ruff, docker, …) is invoked through
//! [`CommandSpec`] as a blocking `std::process::Command` call. Success is
//! judged against an allowed-exit-code set (default: exactly zero), and the
//! outcome is returned as data — [`CommandOutcome`] — so callers decide what
//! a nonzero code means via [`StepPolicy`] instead of unwinding.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, TaskdeckError};

/// Exit code reported when a process terminates without one (e.g. a signal).
const NO_EXIT_CODE: i32 = -1;

// ---------------------------------------------------------------------------
// CommandSpec
// ---------------------------------------------------------------------------

/// A single external command invocation with its success criteria.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; `None` means the current process cwd.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables for the child process.
    pub envs: Vec<(String, String)>,
    /// Exit codes treated as success. Defaults to `[0]`.
    pub success_codes: Vec<i32>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
            success_codes: vec![0],
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn success_codes(mut self, codes: &[i32]) -> Self {
        self.success_codes = codes.to_vec();
        self
    }

    /// Human-readable rendering for logs and error messages.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

// ---------------------------------------------------------------------------
// CommandOutcome
// ---------------------------------------------------------------------------

/// Result of running a command to completion.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    /// Whether the exit code is in the allowed set of `spec`.
    pub fn succeeded(&self, spec: &CommandSpec) -> bool {
        spec.success_codes.contains(&self.code)
    }

    /// Stderr if non-empty, otherwise stdout — the most useful diagnostic.
    pub fn diagnostic(&self) -> &str {
        let err = self.stderr.trim();
        if err.is_empty() {
            self.stdout.trim()
        } else {
            err
        }
    }
}

// ---------------------------------------------------------------------------
// StepPolicy
// ---------------------------------------------------------------------------

/// How a step's failure is interpreted by the runner.
#[derive(Debug, Clone)]
pub enum StepPolicy {
    /// Any exit code outside the allowed set aborts the task (default).
    Abort,
    /// One specific nonzero code is accepted; the task continues with a
    /// distinct log message. Any other bad code still aborts.
    Tolerate { code: i32, note: String },
    /// The step only runs if `probe` succeeds first; a failed probe skips
    /// the step (and only the step) with a logged notice.
    ProbeGated { probe: CommandSpec },
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Run `spec` to completion, capturing output.
///
/// A spawn failure (program not found, permission denied) is an error; a
/// nonzero exit code is not — that judgement belongs to the caller.
pub fn run(spec: &CommandSpec) -> Result<CommandOutcome> {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args);
    if let Some(dir) = &spec.cwd {
        cmd.current_dir(dir);
    }
    for (key, value) in &spec.envs {
        cmd.env(key, value);
    }

    tracing::debug!(command = %spec.display(), "running external command");

    let output = cmd.output().map_err(|e| {
        TaskdeckError::Other(format!("failed to run {}: {e}", spec.program))
    })?;

    Ok(CommandOutcome {
        code: output.status.code().unwrap_or(NO_EXIT_CODE),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run `spec` and fail with [`TaskdeckError::StepFailed`] if the exit code is
/// outside the allowed set.
pub fn run_checked(spec: &CommandSpec) -> Result<CommandOutcome> {
    let outcome = run(spec)?;
    if outcome.succeeded(spec) {
        Ok(outcome)
    } else {
        Err(TaskdeckError::StepFailed {
            command: spec.display(),
            code: outcome.code,
            output: outcome.diagnostic().to_string(),
        })
    }
}

/// Lightweight availability check: `true` iff the probe spawns and exits
/// within its allowed set. Absence of the tool is a plain `false`, never an
/// error.
pub fn probe(spec: &CommandSpec) -> bool {
    match run(spec) {
        Ok(outcome) => outcome.succeeded(spec),
        Err(_) => false,
    }
}

/// Conventional version probe for a tool: `<program> --version`.
pub fn version_probe(program: &str, cwd: &Path) -> CommandSpec {
    CommandSpec::new(program).args(["--version"]).cwd(cwd)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
