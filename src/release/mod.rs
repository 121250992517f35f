//! Release preparation via Commitizen.
//!
//! Wraps `uvx cz bump`: a dry run is parsed to learn the current and next
//! version, then a release branch is cut from `develop`, the version files
//! and changelog are bumped, and the canonical bump commit is created.
//! Nothing is tagged or pushed here.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, TaskdeckError};
use crate::exec::{self, CommandSpec};
use crate::setup::check_dependencies;

/// Where the extracted release notes land, relative to the project root.
pub const RELEASE_NOTES_PATH: &str = "body.md";

// ---------------------------------------------------------------------------
// Version bump parsing
// ---------------------------------------------------------------------------

/// Matches Commitizen's bump announcement, e.g. `bump: version 1.2.3 → 1.3.0`.
fn bump_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"bump: version (?P<current>\S+) → (?P<new>\S+)").expect("valid bump pattern")
    })
}

/// A parsed current/new version pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBump {
    pub current: String,
    pub new: String,
}

impl VersionBump {
    /// The canonical bump commit message.
    pub fn commit_message(&self) -> String {
        format!("bump: version {} → {}", self.current, self.new)
    }
}

/// Parse the release tool's output against the fixed bump pattern.
/// A parse failure is a hard error carrying the raw output for diagnosis.
pub fn parse_bump(output: &str) -> Result<VersionBump> {
    let captures = bump_pattern()
        .captures(output)
        .ok_or_else(|| TaskdeckError::BumpParse(output.to_string()))?;
    Ok(VersionBump {
        current: captures["current"].to_string(),
        new: captures["new"].to_string(),
    })
}

// ---------------------------------------------------------------------------
// Increment
// ---------------------------------------------------------------------------

/// Version increment selector passed through to `cz bump --increment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Increment {
    Major,
    Minor,
    Patch,
    Prerelease,
}

impl Increment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::Prerelease => "prerelease",
        }
    }
}

impl std::fmt::Display for Increment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Release orchestration
// ---------------------------------------------------------------------------

fn cz_command(path: &Path, extra: &[&str], increment: Option<Increment>) -> CommandSpec {
    let mut spec = CommandSpec::new("uvx").args(["cz", "bump"]).cwd(path);
    spec = spec.args(extra.iter().copied());
    if let Some(inc) = increment {
        spec = spec.args(["--increment", inc.as_str()]);
    }
    spec
}

/// Ask the release tool what the bump would be, without changing anything.
pub fn dry_run_bump(path: &Path, increment: Option<Increment>) -> Result<VersionBump> {
    let spec = cz_command(path, &["--dry-run", "--yes"], increment);
    let outcome = exec::run(&spec)?;
    // cz prints the announcement even when the dry run exits nonzero for
    // other reasons, so parse before judging the exit code.
    parse_bump(&outcome.stdout)
}

/// Prepare a release: cut `release/<new>` from `develop`, bump version files
/// and changelog, and commit. Fail-fast — any step's failure aborts.
pub fn prepare_release(path: &Path, increment: Option<Increment>) -> Result<VersionBump> {
    check_dependencies(path, &["git", "cz"])?;

    let bump = dry_run_bump(path, increment)?;
    tracing::info!(current = %bump.current, new = %bump.new, "preparing release");

    let branch = format!("release/{}", bump.new);
    let message = bump.commit_message();
    let steps: Vec<CommandSpec> = vec![
        CommandSpec::new("git").args(["status", "--porcelain"]).cwd(path),
        CommandSpec::new("git")
            .args(["checkout", "-b", branch.as_str(), "develop"])
            .cwd(path),
        cz_command(path, &["--yes", "--files-only", "--changelog"], increment),
        CommandSpec::new("git").args(["add", "."]).cwd(path),
        CommandSpec::new("git")
            .args(["commit", "-m", message.as_str()])
            .cwd(path),
    ];

    for spec in &steps {
        exec::run_checked(spec)?;
    }

    Ok(bump)
}

// ---------------------------------------------------------------------------
// Release notes
// ---------------------------------------------------------------------------

/// Extract the newest `##` section body from a Commitizen-style changelog.
pub fn latest_release_notes(changelog: &str) -> Option<String> {
    let mut lines = changelog.lines();
    // Find the first version heading.
    lines.find(|line| line.starts_with("## "))?;

    let body: Vec<&str> = lines
        .by_ref()
        .take_while(|line| !line.starts_with("## "))
        .collect();

    let notes = body.join("\n").trim().to_string();
    if notes.is_empty() {
        None
    } else {
        Some(notes)
    }
}

/// Read `CHANGELOG.md` in `project_dir` and write the latest section to
/// [`RELEASE_NOTES_PATH`]. Returns the path written.
pub fn write_release_notes(project_dir: &Path) -> Result<PathBuf> {
    let changelog_path = project_dir.join("CHANGELOG.md");
    let changelog = fs::read_to_string(&changelog_path).map_err(|e| {
        TaskdeckError::Other(format!(
            "cannot read {}: {e}",
            changelog_path.display()
        ))
    })?;

    let notes = latest_release_notes(&changelog).ok_or_else(|| {
        TaskdeckError::Other("no release section found in CHANGELOG.md".to_string())
    })?;

    let out = project_dir.join(RELEASE_NOTES_PATH);
    fs::write(&out, notes)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use test_case::test_case;

    // -- parse_bump ---------------------------------------------------------

    #[test]
    fn parse_bump_extracts_versions() {
        let bump = parse_bump("bump: version 1.2.3 → 1.3.0").unwrap();
        assert_eq!(bump.current, "1.2.3");
        assert_eq!(bump.new, "1.3.0");
    }

    #[test]
    fn parse_bump_finds_pattern_in_surrounding_output() {
        let output = "some preamble\nbump: version 0.1.0 → 0.2.0\ntag created\n";
        let bump = parse_bump(output).unwrap();
        assert_eq!(bump.current, "0.1.0");
        assert_eq!(bump.new, "0.2.0");
    }

    #[test_case("bump: version 1.2.3 -> 1.3.0" ; "ascii arrow")]
    #[test_case("version 1.2.3 → 1.3.0" ; "missing prefix")]
    #[test_case("" ; "empty output")]
    fn parse_bump_rejects_malformed(output: &str) {
        let err = parse_bump(output).unwrap_err();
        match err {
            TaskdeckError::BumpParse(raw) => assert_eq!(raw, output),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn commit_message_round_trips_through_pattern() {
        let bump = VersionBump {
            current: "2.0.0".to_string(),
            new: "2.1.0".to_string(),
        };
        let reparsed = parse_bump(&bump.commit_message()).unwrap();
        assert_eq!(reparsed, bump);
    }

    #[test]
    fn parse_bump_handles_prerelease_versions() {
        let bump = parse_bump("bump: version 1.0.0 → 1.1.0a0").unwrap();
        assert_eq!(bump.new, "1.1.0a0");
    }

    // -- Increment ----------------------------------------------------------

    #[test_case(Increment::Major, "major")]
    #[test_case(Increment::Minor, "minor")]
    #[test_case(Increment::Patch, "patch")]
    #[test_case(Increment::Prerelease, "prerelease")]
    fn increment_display(inc: Increment, expected: &str) {
        assert_eq!(inc.to_string(), expected);
    }

    #[test]
    fn cz_command_includes_increment() {
        let tmp = TempDir::new().unwrap();
        let spec = cz_command(tmp.path(), &["--dry-run", "--yes"], Some(Increment::Patch));
        assert_eq!(spec.program, "uvx");
        assert_eq!(
            spec.args,
            vec!["cz", "bump", "--dry-run", "--yes", "--increment", "patch"]
        );
    }

    #[test]
    fn cz_command_omits_increment_when_unset() {
        let tmp = TempDir::new().unwrap();
        let spec = cz_command(tmp.path(), &["--yes"], None);
        assert_eq!(spec.args, vec!["cz", "bump", "--yes"]);
    }

    // -- prepare_release ----------------------------------------------------

    #[test]
    fn prepare_release_fails_outside_a_release_setup() {
        // An empty directory has no repo, no cz configuration, and usually no
        // cz binary — the dependency check or the dry-run parse must fail
        // before any mutating git command runs.
        let tmp = TempDir::new().unwrap();
        assert!(prepare_release(tmp.path(), None).is_err());
        assert!(!tmp.path().join(".git").exists());
    }

    // -- release notes ------------------------------------------------------

    const CHANGELOG: &str = "\
# Changelog

## 1.3.0 (2026-08-01)

### Feat

- add the new thing
- polish the old thing

## 1.2.3 (2026-07-01)

### Fix

- old fix
";

    #[test]
    fn latest_release_notes_returns_first_section() {
        let notes = latest_release_notes(CHANGELOG).unwrap();
        assert!(notes.contains("add the new thing"));
        assert!(notes.contains("### Feat"));
        assert!(!notes.contains("old fix"));
        assert!(!notes.contains("## 1.2.3"));
    }

    #[test]
    fn latest_release_notes_none_without_sections() {
        assert_eq!(latest_release_notes("# Changelog\n\nnothing here\n"), None);
    }

    #[test]
    fn latest_release_notes_none_for_empty_section() {
        assert_eq!(latest_release_notes("## 1.0.0\n\n\n"), None);
    }

    #[test]
    fn write_release_notes_creates_body_md() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("CHANGELOG.md"), CHANGELOG).unwrap();

        let out = write_release_notes(tmp.path()).unwrap();
        assert_eq!(out, tmp.path().join("body.md"));
        let body = fs::read_to_string(out).unwrap();
        assert!(body.contains("add the new thing"));
    }

    #[test]
    fn write_release_notes_fails_without_changelog() {
        let tmp = TempDir::new().unwrap();
        let err = write_release_notes(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("CHANGELOG.md"));
    }
}
