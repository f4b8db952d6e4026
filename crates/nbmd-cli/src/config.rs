//! `.nbmd.toml` discovery and merging.
//!
//! Configuration files can be placed in:
//! - User home directory: `~/.nbmd.toml` (user defaults)
//! - Project directory: `./.nbmd.toml` (project defaults)
//!
//! Precedence order (highest to lowest):
//! 1. Command-line arguments
//! 2. Project config
//! 3. User config
//! 4. Built-in defaults

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Config file name, looked up in the working and home directories
pub const CONFIG_FILE_NAME: &str = ".nbmd.toml";

pub const DEFAULT_CONFIG: &str = r#"# nbmd configuration file

# Defaults for `nbmd convert`
[convert]
# Fence language for code cells (defaults to the notebook's language)
# language = "python"

# Insert OUTPUT labels above output blocks
# relabel = true

# Label text written above output blocks
# label = "OUTPUT"

# Defaults for `nbmd batch`
[batch]
# Batch conversion skips relabeling unless enabled here or with --relabel
# relabel = false

# Keep going after a notebook fails to convert
# continue_on_error = false

# Defaults for `nbmd strip`
[strip]
# Language of the empty block that replaces `# %%` delimiters
# language = "python"
"#;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default settings for convert command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert: Option<ConvertConfig>,

    /// Default settings for batch command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchConfig>,

    /// Default settings for strip command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip: Option<StripConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Fence language override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Relabel output blocks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relabel: Option<bool>,

    /// Output label text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Relabel output blocks in batch mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relabel: Option<bool>,

    /// Continue on errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StripConfig {
    /// Language of the empty code block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ConvertConfig {
    fn overlay(self, top: Self) -> Self {
        Self {
            language: top.language.or(self.language),
            relabel: top.relabel.or(self.relabel),
            label: top.label.or(self.label),
        }
    }
}

impl BatchConfig {
    fn overlay(self, top: Self) -> Self {
        Self {
            relabel: top.relabel.or(self.relabel),
            continue_on_error: top.continue_on_error.or(self.continue_on_error),
        }
    }
}

impl StripConfig {
    fn overlay(self, top: Self) -> Self {
        Self {
            language: top.language.or(self.language),
        }
    }
}

/// Merge two optional sections, fields of `top` winning
fn overlay_section<T>(base: Option<T>, top: Option<T>, overlay: fn(T, T) -> T) -> Option<T> {
    match (base, top) {
        (Some(base), Some(top)) => Some(overlay(base, top)),
        (base, top) => top.or(base),
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file {}: {e}", path.display()))
    }

    /// Find and load configuration files.
    /// Returns (`user_config`, `project_config`)
    pub fn discover_configs() -> (Option<Self>, Option<Self>) {
        let user_config = user_config_path().and_then(|path| Self::load_optional(&path, "user"));
        let project_config = Self::load_optional(&project_config_path(), "project");
        (user_config, project_config)
    }

    /// Load a config that may not exist; parse failures are reported and ignored
    fn load_optional(path: &Path, scope: &str) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => {
                log::debug!("Loaded {scope} config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                eprintln!(
                    "{} Failed to load {scope} config from {}: {e}",
                    "Warning:".yellow().bold(),
                    path.display()
                );
                None
            }
        }
    }

    /// Merge configs with precedence: project config > user config > defaults
    pub fn merge(user_config: Option<Self>, project_config: Option<Self>) -> Self {
        let user = user_config.unwrap_or_default();
        let project = project_config.unwrap_or_default();

        Self {
            convert: overlay_section(user.convert, project.convert, ConvertConfig::overlay),
            batch: overlay_section(user.batch, project.batch, BatchConfig::overlay),
            strip: overlay_section(user.strip, project.strip, StripConfig::overlay),
        }
    }
}

/// `~/.nbmd.toml`, when a home directory is known
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// `./.nbmd.toml`
pub fn project_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}
