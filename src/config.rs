//! Analyzer configuration.
//!
//! Configuration is read from TOML:
//!
//! ```toml
//! [analysis]
//! allow_string_standin_for_class = false
//! remember_property_assignments_after_call = false
//! enforce_class_existence = true
//! enforce_method_existence = true
//! record_node_types = false
//! after_call_plugins = ["static-call-logger"]
//!
//! [issues]
//! suppress = ["MixedMethodCall"]
//! info = ["DeprecatedClass"]
//! ```
//!
//! [`Config::discover`] looks, in order, at an explicit path, at
//! `.phpantom.toml` in the project root and at `phpantom/analyzer.toml` in
//! the user's config directory, and falls back to the defaults.

use std::path::{Path, PathBuf};

use etcetera::BaseStrategy;
use serde::Deserialize;

use crate::issue::{IssueKind, IssueSettings};

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = ".phpantom.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {message}")]
    Toml { path: String, message: String },
}

/// Options consumed by the static-call resolver.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// A plain `string` receiver is skipped quietly instead of reported.
    pub allow_string_standin_for_class: bool,
    /// Keep property-derived variable types after a successful call.
    /// When off (the default) they are forgotten.
    pub remember_property_assignments_after_call: bool,
    pub enforce_class_existence: bool,
    pub enforce_method_existence: bool,
    /// Record resolved classes, methods and types per source position.
    pub record_node_types: bool,
    /// Names of registered after-call plugins to run.
    pub after_call_plugins: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            allow_string_standin_for_class: false,
            remember_property_assignments_after_call: false,
            enforce_class_existence: true,
            enforce_method_existence: true,
            record_node_types: false,
            after_call_plugins: Vec::new(),
        }
    }
}

/// `[issues]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IssuesConfig {
    pub suppress: Vec<IssueKind>,
    pub info: Vec<IssueKind>,
}

impl IssuesConfig {
    pub fn settings(&self) -> IssueSettings {
        IssueSettings {
            suppress: self.suppress.iter().copied().collect(),
            info: self.info.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalyzerConfig,
    pub issues: IssuesConfig,
}

impl Config {
    pub fn from_toml_str(text: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Toml {
            path: path.to_string(),
            message: err.message().to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    /// Find and load the configuration that applies to `project_root`.
    pub fn discover(explicit: Option<&Path>, project_root: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "loading explicit config");
            return Self::load(path);
        }

        let project = project_root.join(PROJECT_CONFIG_FILE);
        if project.is_file() {
            tracing::debug!(path = %project.display(), "loading project config");
            return Self::load(&project);
        }

        if let Some(user) = user_config_path()
            && user.is_file()
        {
            tracing::debug!(path = %user.display(), "loading user config");
            return Self::load(&user);
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }
}

/// `<config dir>/phpantom/analyzer.toml`, when a home directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    let strategy = etcetera::choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("phpantom").join("analyzer.toml"))
}
