//! First-time repository setup.
//!
//! Mirrors the project's bootstrap scripts: validate the target directory,
//! check that required tools are installed, then walk a fixed git command
//! sequence. The sequences are tolerant of partial failure — an individual
//! git command failing (branch already exists, remote already added, nothing
//! to commit) is logged and the remaining commands still run.

use std::path::{Path, PathBuf};

use crate::error::{Result, TaskdeckError};
use crate::exec::{self, CommandSpec};

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that `value` names an existing directory, returning it resolved.
/// Fatal before any external command runs.
pub fn existing_dir(value: &str) -> Result<PathBuf> {
    let path = PathBuf::from(value);
    if !path.exists() {
        return Err(TaskdeckError::InvalidPath {
            value: value.to_string(),
            reason: "does not exist".to_string(),
        });
    }
    if !path.is_dir() {
        return Err(TaskdeckError::InvalidPath {
            value: value.to_string(),
            reason: "is not a directory".to_string(),
        });
    }
    path.canonicalize().map_err(TaskdeckError::Io)
}

/// Check each dependency with a `--version` probe. The first failing probe
/// is fatal, reported with the dependency name and the target path.
pub fn check_dependencies(path: &Path, dependencies: &[&str]) -> Result<()> {
    for dependency in dependencies {
        if !exec::probe(&exec::version_probe(dependency, path)) {
            return Err(TaskdeckError::MissingDependency {
                dependency: dependency.to_string(),
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Command sequences
// ---------------------------------------------------------------------------

fn remote_url(github_user: &str, repo_name: &str) -> String {
    format!("https://github.com/{github_user}/{repo_name}.git")
}

/// The first-time `setup-git` sequence: init, rename the default branch,
/// wire the remote, push main and develop, and create the initial commit.
fn setup_git_commands(github_user: &str, repo_name: &str) -> Vec<Vec<String>> {
    let url = remote_url(github_user, repo_name);
    [
        vec!["init"],
        vec!["branch", "-m", "master", "main"],
        vec!["checkout", "main"],
        vec!["remote", "add", "origin", url.as_str()],
        vec!["remote", "set-url", "origin", url.as_str()],
        vec!["fetch", "origin"],
        vec!["pull"],
        vec!["push", "-u", "origin", "main"],
        vec!["checkout", "-b", "develop", "main"],
        vec!["push", "-u", "origin", "develop"],
        vec!["add", "."],
        vec!["commit", "-m", "feat: initial commit"],
        vec!["push", "origin", "develop"],
    ]
    .into_iter()
    .map(|args| args.into_iter().map(String::from).collect())
    .collect()
}

/// The `setup-remote` sequence for a repo that already exists locally.
fn setup_remote_commands(github_user: &str, repo_name: &str) -> Vec<Vec<String>> {
    let url = remote_url(github_user, repo_name);
    [
        vec!["fetch", "origin"],
        vec!["remote", "add", "origin", url.as_str()],
        vec!["remote", "set-url", "origin", url.as_str()],
        vec!["pull"],
        vec!["checkout", "main"],
        vec!["push", "-u", "origin", "main"],
        vec!["checkout", "develop"],
        vec!["push", "-u", "origin", "develop"],
    ]
    .into_iter()
    .map(|args| args.into_iter().map(String::from).collect())
    .collect()
}

/// Run a git command sequence in `path`, tolerating individual failures.
fn run_sequence(path: &Path, commands: Vec<Vec<String>>) -> Result<()> {
    check_dependencies(path, &["git"])?;

    for args in commands {
        let spec = CommandSpec::new("git").args(args.iter().cloned()).cwd(path);
        match exec::run(&spec) {
            Ok(outcome) if outcome.succeeded(&spec) => {
                tracing::info!(command = %spec.display(), "ok");
            }
            Ok(outcome) => {
                // Partial-failure tolerance: log and continue.
                tracing::warn!(
                    command = %spec.display(),
                    code = outcome.code,
                    output = %outcome.diagnostic(),
                    "command failed, continuing"
                );
            }
            Err(e) => {
                tracing::warn!(command = %spec.display(), error = %e, "command failed, continuing");
            }
        }
    }

    Ok(())
}

/// Set up the project's git repo for the first time.
pub fn setup_git(path: &Path, github_user: &str, repo_name: &str) -> Result<()> {
    run_sequence(path, setup_git_commands(github_user, repo_name))
}

/// Set up the remote connection for an already-initialized repo.
pub fn setup_remote(path: &Path, github_user: &str, repo_name: &str) -> Result<()> {
    run_sequence(path, setup_remote_commands(github_user, repo_name))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
