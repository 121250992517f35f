//! Configuration data structures for taskdeck.
//!
//! Defines the YAML config format: project identity, interpreter version
//! range, and tool settings. Designed for multi-source loading with serde.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for taskdeck.
///
/// Loaded from YAML files and environment variables, merged with
/// well-defined priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskdeckConfig {
    /// Config format version (currently "1.0").
    #[serde(default = "default_version")]
    pub version: String,

    /// Project identity used in git remotes and tool arguments.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Interpreter version range for matrix tasks.
    #[serde(default)]
    pub python: PythonConfig,

    /// External tool settings.
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Default for TaskdeckConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            project: ProjectConfig::default(),
            python: PythonConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

/// Identity of the project taskdeck orchestrates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Repo/project name, e.g. `robust-python-demo`.
    #[serde(default = "default_project_name")]
    pub name: String,

    /// Importable package name, e.g. `robust_python_demo`.
    #[serde(default = "default_package_name")]
    pub package: String,

    /// GitHub account the remotes point at.
    #[serde(default = "default_github_user")]
    pub github_user: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            package: default_package_name(),
            github_user: default_github_user(),
        }
    }
}

impl ProjectConfig {
    /// Container image name: lowercase package name with dashes.
    pub fn image_name(&self) -> String {
        self.package.replace('_', "-").to_lowercase()
    }
}

// ---------------------------------------------------------------------------
// PythonConfig
// ---------------------------------------------------------------------------

/// Supported interpreter version range, kept as min/max version slugs so the
/// matrix expands without listing every version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonConfig {
    #[serde(default = "default_min_python")]
    pub min: String,

    #[serde(default = "default_max_python")]
    pub max: String,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            min: default_min_python(),
            max: default_max_python(),
        }
    }
}

impl PythonConfig {
    /// Expand `min..=max` into the full version list, e.g.
    /// `["3.9", "3.10", "3.11", "3.12", "3.13"]`. Falls back to the default
    /// range when a bound does not parse.
    pub fn versions(&self) -> Vec<String> {
        let min = minor_slug(&self.min).unwrap_or(9);
        let max = minor_slug(&self.max).unwrap_or(13);
        (min..=max).map(|slug| format!("3.{slug}")).collect()
    }

    /// The newest supported version — the default for single-version tasks.
    pub fn default_version(&self) -> String {
        self.versions().last().cloned().unwrap_or(self.max.clone())
    }
}

/// `"3.11"` → `Some(11)`.
fn minor_slug(version: &str) -> Option<u32> {
    version.strip_prefix("3.")?.parse().ok()
}

// ---------------------------------------------------------------------------
// ToolsConfig
// ---------------------------------------------------------------------------

/// External tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Dependency installer command.
    #[serde(default = "default_installer")]
    pub installer: String,

    /// Dependency group installed before task commands run.
    #[serde(default = "default_dependency_group")]
    pub dependency_group: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            installer: default_installer(),
            dependency_group: default_dependency_group(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_version() -> String {
    "1.0".to_string()
}

fn default_project_name() -> String {
    "robust-python-demo".to_string()
}

fn default_package_name() -> String {
    "robust_python_demo".to_string()
}

fn default_github_user() -> String {
    "56kyle".to_string()
}

fn default_min_python() -> String {
    "3.9".to_string()
}

fn default_max_python() -> String {
    "3.13".to_string()
}

fn default_installer() -> String {
    "uv".to_string()
}

fn default_dependency_group() -> String {
    "dev".to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_shape() {
        let config = TaskdeckConfig::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.project.name, "robust-python-demo");
        assert_eq!(config.tools.installer, "uv");
        assert_eq!(config.tools.dependency_group, "dev");
    }

    #[test]
    fn versions_expand_min_to_max() {
        let python = PythonConfig::default();
        assert_eq!(
            python.versions(),
            vec!["3.9", "3.10", "3.11", "3.12", "3.13"]
        );
    }

    #[test]
    fn default_version_is_newest() {
        assert_eq!(PythonConfig::default().default_version(), "3.13");
    }

    #[test]
    fn versions_with_custom_range() {
        let python = PythonConfig {
            min: "3.11".to_string(),
            max: "3.12".to_string(),
        };
        assert_eq!(python.versions(), vec!["3.11", "3.12"]);
    }

    #[test]
    fn versions_fall_back_on_unparseable_bounds() {
        let python = PythonConfig {
            min: "not-a-version".to_string(),
            max: "3.10".to_string(),
        };
        assert_eq!(python.versions(), vec!["3.9", "3.10"]);
    }

    #[test]
    fn image_name_is_dashed_lowercase() {
        let project = ProjectConfig::default();
        assert_eq!(project.image_name(), "robust-python-demo");
    }

    #[test]
    fn yaml_roundtrip() {
        let config = TaskdeckConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: TaskdeckConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.project.github_user, config.project.github_user);
        assert_eq!(back.python.versions(), config.python.versions());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "project:\n  name: my-proj\n";
        let config: TaskdeckConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.project.name, "my-proj");
        // Unset fields keep defaults.
        assert_eq!(config.project.package, "robust_python_demo");
        assert_eq!(config.tools.installer, "uv");
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result: Result<TaskdeckConfig, _> = serde_yaml::from_str("{{nope");
        assert!(result.is_err());
    }
}
