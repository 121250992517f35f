//! Task execution engine.
//!
//! Resolves a target (task name or tag) against the registry and executes
//! each resolved task: matrix expansion over interpreter versions, install
//! steps first, then command steps in declared order. Everything is
//! synchronous — each external command blocks until completion.
//!
//! Failure handling is data-driven: a step's [`StepPolicy`] is evaluated
//! against the command's exit code by this module, so "tool absent" (skip),
//! "tool tolerably failed" (continue), and "tool failed" (abort the cell)
//! stay distinct without any unwinding.

use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::error::Result;
use crate::exec::{self, CommandSpec, StepPolicy};
use crate::task::{CommandStep, Step, Task, TaskRegistry};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Outcome of one task execution cell (task × optional version).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CellOutcome {
    Pass,
    Fail { reason: String },
    Skip { reason: String },
}

/// One row of the final summary.
#[derive(Debug, Clone, Serialize)]
pub struct CellReport {
    pub task: String,
    pub version: Option<String>,
    pub outcome: CellOutcome,
}

impl CellReport {
    /// `task` or `task (py 3.x)` for matrix cells.
    pub fn label(&self) -> String {
        match &self.version {
            Some(v) => format!("{} (py {v})", self.task),
            None => self.task.clone(),
        }
    }
}

/// Aggregate result across all resolved tasks and matrix cells.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub cells: Vec<CellReport>,
}

impl RunReport {
    /// Logical AND of all cell outcomes — skips do not count as failures.
    pub fn all_passed(&self) -> bool {
        !self
            .cells
            .iter()
            .any(|c| matches!(c.outcome, CellOutcome::Fail { .. }))
    }

    /// Process exit status: nonzero iff any cell failed.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }

    pub fn failed(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c.outcome, CellOutcome::Fail { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c.outcome, CellOutcome::Skip { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Knobs the runner needs beyond the registry itself.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Tool used for dependency installation (`uv` by default).
    pub installer: String,
    /// Project root — working directory for every step.
    pub project_dir: PathBuf,
    /// Show a spinner while external commands run.
    pub show_progress: bool,
}

impl RunnerOptions {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            installer: "uv".to_string(),
            project_dir: project_dir.into(),
            show_progress: false,
        }
    }
}

/// Executes tasks from a registry. The registry is borrowed, never mutated.
pub struct Runner<'a> {
    registry: &'a TaskRegistry,
    options: RunnerOptions,
}

/// What happened to a single step within a cell.
enum StepResult {
    Ran,
    Skipped(String),
    Failed(String),
}

impl<'a> Runner<'a> {
    pub fn new(registry: &'a TaskRegistry, options: RunnerOptions) -> Self {
        Self { registry, options }
    }

    /// Resolve `target` and execute every resolved task and matrix cell,
    /// sequentially and in deterministic order. Only resolution errors are
    /// returned as `Err`; execution failures land in the report.
    pub fn run(&self, target: &str, posargs: &[String]) -> Result<RunReport> {
        let tasks = self.registry.resolve(target)?;
        let mut report = RunReport::default();

        for task in tasks {
            for version in task.env.cells() {
                let outcome = self.run_cell(task, version.as_deref(), posargs);
                match &outcome {
                    CellOutcome::Pass => {
                        tracing::info!(task = %task.name, version = ?version, "cell passed")
                    }
                    CellOutcome::Fail { reason } => {
                        tracing::warn!(task = %task.name, version = ?version, %reason, "cell failed")
                    }
                    CellOutcome::Skip { reason } => {
                        tracing::info!(task = %task.name, version = ?version, %reason, "cell skipped")
                    }
                }
                report.cells.push(CellReport {
                    task: task.name.clone(),
                    version,
                    outcome,
                });
            }
        }

        Ok(report)
    }

    /// Execute one cell: install steps first, then the rest in declared
    /// order. Fail-fast within the cell; other cells are unaffected.
    fn run_cell(&self, task: &Task, version: Option<&str>, posargs: &[String]) -> CellOutcome {
        let (installs, rest): (Vec<&Step>, Vec<&Step>) = task
            .steps
            .iter()
            .partition(|s| matches!(s, Step::Install { .. }));

        // Installs don't count toward this: a cell whose every command was
        // probe-skipped is a skip even when its dependencies installed fine.
        let mut commands_ran = 0usize;
        let mut last_skip = None;

        for step in installs.into_iter().chain(rest) {
            let result = match step {
                Step::Install { selector } => self.run_install(task, selector, version),
                Step::Command(cmd) => self.run_command_step(task, cmd, version, posargs),
                Step::FirstAvailable { candidates } => {
                    self.run_first_available(task, candidates)
                }
            };

            match result {
                StepResult::Ran => {
                    if !matches!(step, Step::Install { .. }) {
                        commands_ran += 1;
                    }
                }
                StepResult::Skipped(reason) => last_skip = Some(reason),
                StepResult::Failed(reason) => return CellOutcome::Fail { reason },
            }
        }

        match last_skip {
            Some(reason) if commands_ran == 0 => CellOutcome::Skip { reason },
            _ => CellOutcome::Pass,
        }
    }

    fn run_install(&self, task: &Task, selector: &str, version: Option<&str>) -> StepResult {
        let mut spec = CommandSpec::new(&self.options.installer)
            .args(["pip", "install", "-e", ".", "--group", selector])
            .cwd(&self.options.project_dir);
        if let Some(v) = version {
            spec = spec.args(["--python", v]);
        }

        tracing::info!(task = %task.name, group = selector, "installing dependencies");
        match self.execute(&task.name, &spec) {
            Ok(outcome) if outcome.succeeded(&spec) => StepResult::Ran,
            Ok(outcome) => StepResult::Failed(format!(
                "`{}` exited with code {}: {}",
                spec.display(),
                outcome.code,
                outcome.diagnostic()
            )),
            Err(e) => StepResult::Failed(e.to_string()),
        }
    }

    fn run_command_step(
        &self,
        task: &Task,
        step: &CommandStep,
        version: Option<&str>,
        posargs: &[String],
    ) -> StepResult {
        // Probe gate: absence of the tool skips this step only.
        if let StepPolicy::ProbeGated { probe } = &step.policy {
            if !exec::probe(probe) {
                let reason = format!("probe `{}` failed — step skipped", probe.display());
                tracing::warn!(task = %task.name, %reason, "probe-gated step skipped");
                return StepResult::Skipped(reason);
            }
        }

        let mut spec = step.effective_spec(posargs);
        if spec.cwd.is_none() {
            spec.cwd = Some(self.options.project_dir.clone());
        }
        // Matrix cells may reference their version in arguments, e.g. a
        // per-version junit report path.
        if let Some(v) = version {
            for arg in &mut spec.args {
                if arg.contains("{python}") {
                    *arg = arg.replace("{python}", v);
                }
            }
        }
        if step.external {
            tracing::debug!(command = %spec.display(), "running external-environment command");
        }

        let outcome = match self.execute_versioned(&task.name, &spec, version) {
            Ok(o) => o,
            Err(e) => return StepResult::Failed(e.to_string()),
        };

        if outcome.succeeded(&spec) {
            return StepResult::Ran;
        }

        if let StepPolicy::Tolerate { code, note } = &step.policy {
            if outcome.code == *code {
                tracing::warn!(task = %task.name, command = %spec.display(), code, "{note}");
                return StepResult::Ran;
            }
        }

        StepResult::Failed(format!(
            "`{}` exited with code {}: {}",
            spec.display(),
            outcome.code,
            outcome.diagnostic()
        ))
    }

    fn run_first_available(
        &self,
        task: &Task,
        candidates: &[crate::task::CandidateCommand],
    ) -> StepResult {
        for candidate in candidates {
            if !exec::probe(&candidate.probe) {
                tracing::debug!(
                    task = %task.name,
                    probe = %candidate.probe.display(),
                    "candidate unavailable"
                );
                continue;
            }

            let mut spec = candidate.spec.clone();
            if spec.cwd.is_none() {
                spec.cwd = Some(self.options.project_dir.clone());
            }
            return match self.execute(&task.name, &spec) {
                Ok(outcome) if outcome.succeeded(&spec) => StepResult::Ran,
                Ok(outcome) => StepResult::Failed(format!(
                    "`{}` exited with code {}: {}",
                    spec.display(),
                    outcome.code,
                    outcome.diagnostic()
                )),
                Err(e) => StepResult::Failed(e.to_string()),
            };
        }

        let reason = "no candidate tool available — step skipped".to_string();
        tracing::warn!(task = %task.name, %reason, "probe-then-use step skipped");
        StepResult::Skipped(reason)
    }

    /// Run a spec with the cell's interpreter version exported so wrapped
    /// tools can see which matrix cell they serve.
    fn execute_versioned(
        &self,
        task_name: &str,
        spec: &CommandSpec,
        version: Option<&str>,
    ) -> Result<exec::CommandOutcome> {
        match version {
            Some(v) => self.execute(task_name, &spec.clone().env("TASKDECK_PYTHON", v)),
            None => self.execute(task_name, spec),
        }
    }

    fn execute(&self, task_name: &str, spec: &CommandSpec) -> Result<exec::CommandOutcome> {
        let spinner = self.spinner(task_name, spec);
        let result = exec::run(spec);
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        result
    }

    fn spinner(&self, task_name: &str, spec: &CommandSpec) -> Option<ProgressBar> {
        if !self.options.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("{task_name}: {}", spec.display()));
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
