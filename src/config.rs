use crate::inject::{PLUGIN_COMMAND, STANDALONE_COMMAND};
use crate::params::ParamOverrides;
use crate::platform;
use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Parameter values applied on top of the mode defaults.
///
/// Command line `KEY=VALUE` tokens still win over these. Values are checked
/// together with the rest of the parameters, not when loading.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct ThresholdsConfig {
    pub elapsed_time: Option<i64>,
    pub remain_time: Option<i64>,
    pub progress: Option<i64>,
    pub progress_type: Option<String>,
    pub target_temp: Option<i64>,
    pub debug: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Write the missing print time format next to the one found
    #[serde(default = "default_cross_write")]
    pub cross_write: bool,
    #[serde(default = "default_standalone_command")]
    pub standalone_command: String,
    #[serde(default = "default_plugin_command")]
    pub plugin_command: String,
}

fn default_cross_write() -> bool {
    true
}

fn default_standalone_command() -> String {
    STANDALONE_COMMAND.to_string()
}

fn default_plugin_command() -> String {
    PLUGIN_COMMAND.to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            cross_write: default_cross_write(),
            standalone_command: default_standalone_command(),
            plugin_command: default_plugin_command(),
        }
    }
}

impl OutputConfig {
    /// Macro names must be a single non-empty token
    pub fn validate(&self) -> Result<()> {
        for (field, name) in [
            ("standalone_command", &self.standalone_command),
            ("plugin_command", &self.plugin_command),
        ] {
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                anyhow::bail!(
                    "Invalid output.{} '{}', expected a single macro name",
                    field,
                    name
                );
            }
        }
        Ok(())
    }
}

impl From<&ThresholdsConfig> for ParamOverrides {
    fn from(thresholds: &ThresholdsConfig) -> Self {
        ParamOverrides {
            slicer_time_estimated: None,
            elapsed_time_threshold: thresholds.elapsed_time.map(|v| v.to_string()),
            remain_time_threshold: thresholds.remain_time.map(|v| v.to_string()),
            progress_threshold: thresholds.progress.map(|v| v.to_string()),
            progress_type: thresholds.progress_type.clone(),
            target_temp: thresholds.target_temp.map(|v| v.to_string()),
            debug: thresholds.debug.map(|v| v.to_string()),
        }
    }
}

impl Config {
    /// Validate all configuration
    pub fn validate(&self) -> Result<()> {
        self.output.validate()?;
        Ok(())
    }

    pub fn overrides(&self) -> ParamOverrides {
        ParamOverrides::from(&self.thresholds)
    }
}

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let loader = ConfigBuilder::builder()
        .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
        .build()
        .context("Failed to build config loader")?;

    loader
        .try_deserialize()
        .context("Failed to parse config file")
}

/// Load the config from `explicit`, else from `~/.bed-cooldown/config.toml`
/// if present, else fall back to defaults.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => load_from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => match platform::default_config_path().filter(|p| p.is_file()) {
            Some(path) => load_from_path(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::default(),
        },
    };

    config.validate()?;
    Ok(config)
}
