//! Task data model and registry.
//!
//! A [`Task`] is a named, tagged unit of orchestration work: an environment
//! requirement (none, one interpreter version, or a version matrix) plus an
//! ordered list of [`Step`]s. Tasks are declared once at startup, collected
//! into an explicitly-constructed [`TaskRegistry`], and never mutated — the
//! registry is pure data handed to the runner.

use std::collections::{BTreeSet, HashSet};

use crate::error::{Result, TaskdeckError};
use crate::exec::{CommandSpec, StepPolicy};

// ---------------------------------------------------------------------------
// EnvRequirement
// ---------------------------------------------------------------------------

/// Which interpreter environment(s) a task runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvRequirement {
    /// No managed environment — runs against the host directly.
    None,
    /// One specific interpreter version (e.g. `"3.13"`).
    Single(String),
    /// One execution per version, in order ("matrix expansion").
    Matrix(Vec<String>),
}

impl EnvRequirement {
    /// Expand into execution cells. `None` yields a single version-less cell.
    pub fn cells(&self) -> Vec<Option<String>> {
        match self {
            Self::None => vec![None],
            Self::Single(v) => vec![Some(v.clone())],
            Self::Matrix(vs) => vs.iter().cloned().map(Some).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One ordered unit of work within a task.
#[derive(Debug, Clone)]
pub enum Step {
    /// Install the project plus a dependency group into the task's
    /// environment. Install steps always run before command steps.
    Install { selector: String },
    /// Run an external command.
    Command(CommandStep),
    /// Probe candidates in order and run the first available one; if no
    /// candidate's probe succeeds the step is skipped with a notice.
    FirstAvailable { candidates: Vec<CandidateCommand> },
}

/// An external command step with its failure policy.
#[derive(Debug, Clone)]
pub struct CommandStep {
    pub spec: CommandSpec,
    pub policy: StepPolicy,
    /// Whether the command runs outside the managed environment.
    pub external: bool,
    /// `Some(tail)` opts this step into positional-args pass-through:
    /// trailing CLI args replace `tail`; with no CLI args, `tail` is
    /// appended to the fixed args.
    pub default_tail: Option<Vec<String>>,
}

impl CommandStep {
    pub fn new(spec: CommandSpec) -> Self {
        Self {
            spec,
            policy: StepPolicy::Abort,
            external: false,
            default_tail: None,
        }
    }

    pub fn policy(mut self, policy: StepPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    /// Opt into posargs pass-through with the given default tail.
    pub fn posargs<I, S>(mut self, default_tail: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_tail = Some(default_tail.into_iter().map(Into::into).collect());
        self
    }

    /// The argument list to execute: fixed args plus either the CLI posargs
    /// or the declared default tail.
    pub fn effective_spec(&self, posargs: &[String]) -> CommandSpec {
        let mut spec = self.spec.clone();
        match &self.default_tail {
            Some(tail) if posargs.is_empty() => spec.args.extend(tail.iter().cloned()),
            Some(_) => spec.args.extend(posargs.iter().cloned()),
            None => {}
        }
        spec
    }
}

/// A probe/command pair for [`Step::FirstAvailable`].
#[derive(Debug, Clone)]
pub struct CandidateCommand {
    pub probe: CommandSpec,
    pub spec: CommandSpec,
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A named, tagged unit of orchestration work composed of ordered steps.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    pub env: EnvRequirement,
    pub tags: BTreeSet<String>,
    pub steps: Vec<Step>,
}

impl Task {
    pub fn new<I, S>(name: impl Into<String>, env: EnvRequirement, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            env,
            tags: tags.into_iter().map(Into::into).collect(),
            steps: Vec::new(),
        }
    }

    /// Append an install step.
    pub fn install(mut self, selector: impl Into<String>) -> Self {
        self.steps.push(Step::Install {
            selector: selector.into(),
        });
        self
    }

    /// Append a command step with default (abort) policy.
    pub fn command(mut self, spec: CommandSpec) -> Self {
        self.steps.push(Step::Command(CommandStep::new(spec)));
        self
    }

    /// Append a fully-configured command step.
    pub fn step(mut self, step: CommandStep) -> Self {
        self.steps.push(Step::Command(step));
        self
    }

    /// Append a probe-then-use candidate chain.
    pub fn first_available(mut self, candidates: Vec<CandidateCommand>) -> Self {
        self.steps.push(Step::FirstAvailable { candidates });
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

// ---------------------------------------------------------------------------
// TaskRegistry
// ---------------------------------------------------------------------------

/// Registry of tasks in registration order.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    names: HashSet<String>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. Fails if the name is already taken.
    pub fn register(&mut self, task: Task) -> Result<()> {
        if !self.names.insert(task.name.clone()) {
            return Err(TaskdeckError::DuplicateTask(task.name));
        }
        self.tasks.push(task);
        Ok(())
    }

    /// Resolve a target to tasks: an exact name match wins; otherwise every
    /// task carrying the target as a tag, in registration order.
    pub fn resolve(&self, target: &str) -> Result<Vec<&Task>> {
        if let Some(task) = self.tasks.iter().find(|t| t.name == target) {
            return Ok(vec![task]);
        }

        let tagged: Vec<&Task> = self.tasks.iter().filter(|t| t.has_tag(target)).collect();
        if tagged.is_empty() {
            return Err(TaskdeckError::UnknownTarget(target.to_string()));
        }
        Ok(tagged)
    }

    /// All tasks in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str, tags: &[&str]) -> Task {
        Task::new(name, EnvRequirement::None, tags.iter().copied())
    }

    #[test]
    fn env_none_yields_single_cell() {
        assert_eq!(EnvRequirement::None.cells(), vec![None]);
    }

    #[test]
    fn env_single_yields_one_version() {
        let cells = EnvRequirement::Single("3.13".into()).cells();
        assert_eq!(cells, vec![Some("3.13".to_string())]);
    }

    #[test]
    fn env_matrix_preserves_version_order() {
        let cells =
            EnvRequirement::Matrix(vec!["3.9".into(), "3.10".into(), "3.11".into()]).cells();
        assert_eq!(
            cells,
            vec![
                Some("3.9".to_string()),
                Some("3.10".to_string()),
                Some("3.11".to_string()),
            ]
        );
    }

    #[test]
    fn register_accepts_unique_names() {
        let mut reg = TaskRegistry::new();
        reg.register(task("lint", &["ci"])).unwrap();
        reg.register(task("tests", &["ci"])).unwrap();
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn register_rejects_duplicate_name() {
        let mut reg = TaskRegistry::new();
        reg.register(task("lint", &[])).unwrap();
        let err = reg.register(task("lint", &[])).unwrap_err();
        assert!(matches!(err, TaskdeckError::DuplicateTask(name) if name == "lint"));
    }

    #[test]
    fn resolve_exact_name_wins_over_tag() {
        let mut reg = TaskRegistry::new();
        // A task literally named "ci" plus others tagged "ci".
        reg.register(task("ci", &[])).unwrap();
        reg.register(task("lint", &["ci"])).unwrap();

        let resolved = reg.resolve("ci").unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name, "ci");
    }

    #[test]
    fn resolve_tag_returns_registration_order() {
        let mut reg = TaskRegistry::new();
        reg.register(task("typecheck", &["ci"])).unwrap();
        reg.register(task("format", &["python"])).unwrap();
        reg.register(task("tests", &["ci"])).unwrap();

        let resolved = reg.resolve("ci").unwrap();
        let names: Vec<&str> = resolved.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["typecheck", "tests"]);
    }

    #[test]
    fn resolve_unknown_target_is_error() {
        let reg = TaskRegistry::new();
        let err = reg.resolve("nope").unwrap_err();
        assert!(matches!(err, TaskdeckError::UnknownTarget(t) if t == "nope"));
    }

    #[test]
    fn builder_preserves_step_order() {
        let t = Task::new("demo", EnvRequirement::None, ["x"])
            .install("dev")
            .command(CommandSpec::new("echo").args(["one"]))
            .command(CommandSpec::new("echo").args(["two"]));

        assert_eq!(t.steps.len(), 3);
        assert!(matches!(&t.steps[0], Step::Install { selector } if selector == "dev"));
        match (&t.steps[1], &t.steps[2]) {
            (Step::Command(a), Step::Command(b)) => {
                assert_eq!(a.spec.args, vec!["one"]);
                assert_eq!(b.spec.args, vec!["two"]);
            }
            _ => panic!("expected command steps"),
        }
    }

    #[test]
    fn has_tag_checks_membership() {
        let t = task("lint", &["ci", "python"]);
        assert!(t.has_tag("ci"));
        assert!(!t.has_tag("docs"));
    }

    // -- posargs pass-through ------------------------------------------------

    #[test]
    fn effective_spec_uses_default_tail_without_posargs() {
        let step = CommandStep::new(CommandSpec::new("pre-commit"))
            .posargs(["run", "--all-files"]);
        let spec = step.effective_spec(&[]);
        assert_eq!(spec.args, vec!["run", "--all-files"]);
    }

    #[test]
    fn effective_spec_replaces_tail_with_posargs() {
        let step = CommandStep::new(CommandSpec::new("pre-commit"))
            .posargs(["run", "--all-files"]);
        let posargs = vec!["install".to_string()];
        let spec = step.effective_spec(&posargs);
        assert_eq!(spec.args, vec!["install"]);
    }

    #[test]
    fn effective_spec_keeps_fixed_prefix() {
        let step = CommandStep::new(CommandSpec::new("ruff").args(["format"]))
            .posargs(Vec::<String>::new());
        let posargs = vec!["--check".to_string()];
        let spec = step.effective_spec(&posargs);
        assert_eq!(spec.args, vec!["format", "--check"]);
    }

    #[test]
    fn effective_spec_ignores_posargs_when_not_opted_in() {
        let step = CommandStep::new(CommandSpec::new("pyright"));
        let posargs = vec!["--verbose".to_string()];
        let spec = step.effective_spec(&posargs);
        assert!(spec.args.is_empty());
    }
}
