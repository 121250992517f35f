//! Built-in task catalog.
//!
//! Every task the project scaffold supports, declared once as pure data and
//! collected into a [`TaskRegistry`] at startup. Nothing here executes —
//! the registry is handed to the runner by the caller.

use crate::config::TaskdeckConfig;
use crate::error::Result;
use crate::exec::{CommandSpec, StepPolicy};
use crate::task::{CandidateCommand, CommandStep, EnvRequirement, Task, TaskRegistry};

/// Build the full registry from the active configuration.
pub fn builtin_registry(config: &TaskdeckConfig) -> Result<TaskRegistry> {
    let group = config.tools.dependency_group.as_str();
    let package = config.project.package.as_str();
    let image = config.project.image_name();
    let versions = config.python.versions();
    let default = EnvRequirement::Single(config.python.default_version());
    let matrix = EnvRequirement::Matrix(versions.clone());
    let min_version = versions
        .first()
        .cloned()
        .unwrap_or_else(|| config.python.min.clone());

    let mut registry = TaskRegistry::new();

    // First-time setup wrappers. These shell back into the taskdeck binary so
    // the setup scripts stay invocable both directly and as tasks.
    registry.register(
        Task::new("setup-git", EnvRequirement::None, ["env"]).step(
            CommandStep::new(CommandSpec::new("taskdeck").args(["setup-git", "."])).external(),
        ),
    )?;
    registry.register(
        Task::new("setup-venv", EnvRequirement::None, ["env"]).step(
            CommandStep::new(CommandSpec::new("uv").args(["venv", "--python", min_version.as_str()]))
                .external(),
        ),
    )?;

    // Lint using pre-commit. Posargs pass through so `run pre-commit --
    // install` installs the hooks instead of running them.
    registry.register(
        Task::new("pre-commit", default.clone(), ["ci"])
            .install(group)
            .step(CommandStep::new(CommandSpec::new("pre-commit")).posargs([
                "run",
                "--all-files",
                "--hook-stage=manual",
                "--show-diff-on-failure",
            ])),
    )?;

    registry.register(
        Task::new("format", default.clone(), ["format", "python"])
            .install(group)
            .step(
                CommandStep::new(CommandSpec::new("ruff").args(["format"]))
                    .posargs(Vec::<String>::new()),
            ),
    )?;

    registry.register(
        Task::new("lint", default.clone(), ["lint", "python"])
            .install(group)
            .command(CommandSpec::new("ruff").args(["check", "--fix", "--verbose"])),
    )?;

    registry.register(
        Task::new("typecheck", matrix.clone(), ["type", "python", "ci"])
            .install(group)
            .command(CommandSpec::new("pyright")),
    )?;

    registry.register(
        Task::new("security", default.clone(), ["security", "python", "ci"])
            .install(group)
            .command(CommandSpec::new("bandit").args(["-r", package, "-c", "bandit.yml", "-ll"]))
            .command(CommandSpec::new("pip-audit")),
    )?;

    registry.register(
        Task::new("tests", matrix, ["test", "python", "ci"])
            .install(group)
            .command(CommandSpec::new("mkdir").args(["-p", "test-results"]))
            .command(CommandSpec::new("pytest").args([
                format!("--cov={package}"),
                "--cov-report=xml".to_string(),
                "--junitxml=test-results/test-results-py{python}.xml".to_string(),
                "tests/".to_string(),
            ])),
    )?;

    registry.register(
        Task::new("coverage", default.clone(), ["coverage"])
            .install(group)
            .step(
                CommandStep::new(CommandSpec::new("coverage").args(["combine"])).policy(
                    StepPolicy::Tolerate {
                        code: 1,
                        note: "no coverage data found to combine — run tests first".to_string(),
                    },
                ),
            )
            .command(CommandSpec::new("coverage").args(["html", "--directory", "coverage-html"]))
            .command(CommandSpec::new("coverage").args(["report"])),
    )?;

    registry.register(
        Task::new("docs", default.clone(), ["docs", "build"])
            .install(group)
            .command(CommandSpec::new("sphinx-build").args([
                "-b",
                "html",
                "docs",
                "docs/_build/html",
                "-E",
            ]))
            .command(CommandSpec::new("sphinx-build").args([
                "-b",
                "html",
                "docs",
                "docs/_build/html",
                "-W",
            ])),
    )?;

    registry.register(
        Task::new("build", default.clone(), ["build", "python"])
            .install(group)
            .step(
                CommandStep::new(CommandSpec::new("uv").args([
                    "build",
                    "--sdist",
                    "--wheel",
                    "--outdir",
                    "dist/",
                ]))
                .external(),
            ),
    )?;

    // Container build: probe docker then podman, first available wins;
    // neither present is a skip, not a failure.
    let image_tag = format!("{image}:latest");
    registry.register(
        Task::new("container", default.clone(), ["build"]).first_available(vec![
            CandidateCommand {
                probe: CommandSpec::new("docker").args(["info"]),
                spec: CommandSpec::new("docker").args([
                    "build",
                    ".",
                    "-t",
                    image_tag.as_str(),
                    "--progress=plain",
                ]),
            },
            CandidateCommand {
                probe: CommandSpec::new("podman").args(["info"]),
                spec: CommandSpec::new("podman").args([
                    "build",
                    ".",
                    "-t",
                    image_tag.as_str(),
                    "--progress=plain",
                ]),
            },
        ]),
    )?;

    registry.register(
        Task::new("publish", default, ["release"])
            .install(group)
            .command(CommandSpec::new("twine").args(["check", "dist/*"]))
            .step(
                CommandStep::new(CommandSpec::new("uv").args(["publish", "dist/*"])).external(),
            ),
    )?;

    // Version bump and tag via Commitizen. Both steps are gated on git being
    // available; cz exiting 1 ("nothing to bump") is acceptable.
    let git_probe = CommandSpec::new("git").args(["version"]);
    registry.register(
        Task::new("release", EnvRequirement::None, ["release"])
            .install(group)
            .step(
                CommandStep::new(CommandSpec::new("cz").args(["--version"])).policy(
                    StepPolicy::ProbeGated {
                        probe: git_probe.clone(),
                    },
                ),
            )
            .step(
                CommandStep::new(
                    CommandSpec::new("uvx")
                        .args(["cz", "bump", "--changelog"])
                        .success_codes(&[0, 1]),
                )
                .policy(StepPolicy::ProbeGated { probe: git_probe })
                .external()
                .posargs(Vec::<String>::new()),
            ),
    )?;

    Ok(registry)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Step;

    fn registry() -> TaskRegistry {
        builtin_registry(&TaskdeckConfig::default()).unwrap()
    }

    #[test]
    fn catalog_registers_all_tasks() {
        let reg = registry();
        let names: Vec<&str> = reg.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "setup-git",
                "setup-venv",
                "pre-commit",
                "format",
                "lint",
                "typecheck",
                "security",
                "tests",
                "coverage",
                "docs",
                "build",
                "container",
                "publish",
                "release",
            ]
        );
    }

    #[test]
    fn ci_tag_groups_the_ci_tasks() {
        let reg = registry();
        let ci: Vec<&str> = reg
            .resolve("ci")
            .unwrap()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(ci, vec!["pre-commit", "typecheck", "security", "tests"]);
    }

    #[test]
    fn matrix_tasks_cover_all_versions() {
        let reg = registry();
        let tests = &reg.resolve("tests").unwrap()[0];
        assert_eq!(
            tests.env,
            EnvRequirement::Matrix(vec![
                "3.9".into(),
                "3.10".into(),
                "3.11".into(),
                "3.12".into(),
                "3.13".into(),
            ])
        );
    }

    #[test]
    fn pre_commit_default_args_are_the_manual_run() {
        let reg = registry();
        let task = &reg.resolve("pre-commit").unwrap()[0];
        let step = task
            .steps
            .iter()
            .find_map(|s| match s {
                Step::Command(c) => Some(c),
                _ => None,
            })
            .unwrap();
        let spec = step.effective_spec(&[]);
        assert_eq!(spec.program, "pre-commit");
        assert_eq!(
            spec.args,
            vec![
                "run",
                "--all-files",
                "--hook-stage=manual",
                "--show-diff-on-failure"
            ]
        );
    }

    #[test]
    fn install_steps_use_configured_group() {
        let mut config = TaskdeckConfig::default();
        config.tools.dependency_group = "test".to_string();
        let reg = builtin_registry(&config).unwrap();
        let lint = &reg.resolve("lint").unwrap()[0];
        assert!(matches!(
            &lint.steps[0],
            Step::Install { selector } if selector == "test"
        ));
    }

    #[test]
    fn coverage_combine_tolerates_exit_one() {
        let reg = registry();
        let coverage = &reg.resolve("coverage").unwrap()[0];
        let combine = coverage
            .steps
            .iter()
            .find_map(|s| match s {
                Step::Command(c) if c.spec.args.first().map(String::as_str) == Some("combine") => {
                    Some(c)
                }
                _ => None,
            })
            .unwrap();
        assert!(matches!(
            &combine.policy,
            StepPolicy::Tolerate { code: 1, .. }
        ));
    }

    #[test]
    fn container_probes_docker_then_podman() {
        let reg = registry();
        let container = &reg.resolve("container").unwrap()[0];
        match &container.steps[0] {
            Step::FirstAvailable { candidates } => {
                assert_eq!(candidates.len(), 2);
                assert_eq!(candidates[0].probe.program, "docker");
                assert_eq!(candidates[1].probe.program, "podman");
                assert!(candidates[0]
                    .spec
                    .args
                    .contains(&"robust-python-demo:latest".to_string()));
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[test]
    fn release_bump_accepts_exit_one() {
        let reg = registry();
        let release = &reg.resolve("release").unwrap()[0];
        let bump = release
            .steps
            .iter()
            .find_map(|s| match s {
                Step::Command(c) if c.spec.program == "uvx" => Some(c),
                _ => None,
            })
            .unwrap();
        assert_eq!(bump.spec.success_codes, vec![0, 1]);
        assert!(matches!(&bump.policy, StepPolicy::ProbeGated { probe } if probe.program == "git"));
    }

    #[test]
    fn tests_junitxml_carries_version_placeholder() {
        let reg = registry();
        let tests = &reg.resolve("tests").unwrap()[0];
        let pytest = tests
            .steps
            .iter()
            .find_map(|s| match s {
                Step::Command(c) if c.spec.program == "pytest" => Some(c),
                _ => None,
            })
            .unwrap();
        assert!(pytest
            .spec
            .args
            .iter()
            .any(|a| a.contains("{python}")));
    }
}
