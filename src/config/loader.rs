//! Multi-source config loading with priority merging.
//!
//! Priority order (highest wins):
//!   Environment vars > Project config > User config > Defaults
//!
//! Missing or unparseable files are silently skipped — configuration is a
//! convenience layer, never a reason the tool refuses to run.

use std::path::Path;

use super::schema::TaskdeckConfig;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load configuration from all available sources and merge them.
///
/// Sources (low → high priority):
///   1. Built-in defaults
///   2. User config  (`~/.config/taskdeck/config.yaml`)
///   3. Project config (`.taskdeck.yaml` in `project_dir`)
///   4. Environment variables (`TASKDECK_INSTALLER`, …)
pub fn load_config(project_dir: Option<&Path>) -> TaskdeckConfig {
    let mut config = TaskdeckConfig::default();

    if let Some(user) = load_user_config() {
        config = merge_configs(config, user);
    }

    if let Some(dir) = project_dir {
        if let Some(project) = load_project_config(dir) {
            config = merge_configs(config, project);
        }
    }

    load_env_overrides(&mut config);
    config
}

/// Load user config from the platform-specific config directory.
///
/// Returns `None` if the file does not exist or is unparseable.
pub fn load_user_config() -> Option<TaskdeckConfig> {
    let path = user_config_path()?;
    load_config_file(&path)
}

/// Load project config from `.taskdeck.yaml` in the given directory.
///
/// Returns `None` if the file does not exist or is unparseable.
pub fn load_project_config(dir: &Path) -> Option<TaskdeckConfig> {
    load_config_file(&dir.join(".taskdeck.yaml"))
}

/// Apply environment variable overrides to a config in place.
///
/// Supported variables:
/// - `TASKDECK_INSTALLER` — dependency installer command
/// - `TASKDECK_DEPENDENCY_GROUP` — dependency group name
/// - `TASKDECK_GITHUB_USER` — GitHub account for remotes
pub fn load_env_overrides(config: &mut TaskdeckConfig) {
    if let Ok(val) = std::env::var("TASKDECK_INSTALLER") {
        if !val.trim().is_empty() {
            config.tools.installer = val.trim().to_string();
        }
    }
    if let Ok(val) = std::env::var("TASKDECK_DEPENDENCY_GROUP") {
        if !val.trim().is_empty() {
            config.tools.dependency_group = val.trim().to_string();
        }
    }
    if let Ok(val) = std::env::var("TASKDECK_GITHUB_USER") {
        if !val.trim().is_empty() {
            config.project.github_user = val.trim().to_string();
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Platform-specific user config path via the `directories` crate.
fn user_config_path() -> Option<std::path::PathBuf> {
    directories::ProjectDirs::from("dev", "taskdeck", "taskdeck")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
}

/// Try to load and parse a YAML config file. Returns `None` on any error.
fn load_config_file(path: &Path) -> Option<TaskdeckConfig> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_yaml::from_str(&contents).ok()
}

/// Merge two configs: `overlay` fields take priority over `base`.
///
/// An overlay field wins only when it differs from the built-in default, so
/// a partial file leaves lower-layer values intact. We can't distinguish
/// "explicitly set to the default" from "unset"; the priority system handles
/// this by layering in the right order.
fn merge_configs(mut base: TaskdeckConfig, overlay: TaskdeckConfig) -> TaskdeckConfig {
    let defaults = TaskdeckConfig::default();

    if overlay.version != defaults.version {
        base.version = overlay.version;
    }

    if overlay.project.name != defaults.project.name {
        base.project.name = overlay.project.name;
    }
    if overlay.project.package != defaults.project.package {
        base.project.package = overlay.project.package;
    }
    if overlay.project.github_user != defaults.project.github_user {
        base.project.github_user = overlay.project.github_user;
    }

    if overlay.python.min != defaults.python.min {
        base.python.min = overlay.python.min;
    }
    if overlay.python.max != defaults.python.max {
        base.python.max = overlay.python.max;
    }

    if overlay.tools.installer != defaults.tools.installer {
        base.tools.installer = overlay.tools.installer;
    }
    if overlay.tools.dependency_group != defaults.tools.dependency_group {
        base.tools.dependency_group = overlay.tools.dependency_group;
    }

    base
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
