use crate::consts::*;
use crate::errors::*;
use crate::util::*;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Deserializer;
use smart_default::SmartDefault;

make_log_macro!(debug, "config");

/// How a new brightness value reaches the device.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WriterKind {
    /// Run the write command through an elevation program such as `pkexec`.
    #[default]
    Elevated,
    /// Ask logind to set the brightness for the current session.
    Logind,
    /// Write the sysfs file from this process.
    Direct,
}

#[derive(Deserialize, Clone, Debug, SmartDefault)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct BacklitConfig {
    #[default(PathBuf::from(DEVICES_PATH))]
    pub root: PathBuf,

    pub writer: WriterKind,

    /// Program (and arguments) that elevates the write command.
    /// May be empty to run the write command unelevated.
    #[default(vec!["pkexec".into()])]
    pub elevation_command: Vec<String>,

    /// Program (and arguments) that copies stdin into the path appended to it.
    #[default(vec!["tee".into()])]
    #[serde(deserialize_with = "deserialize_command")]
    pub write_command: Vec<String>,

    #[default(DEFAULT_MAX_BRIGHTNESS)]
    #[serde(deserialize_with = "deserialize_fallback_max_brightness")]
    pub fallback_max_brightness: u32,

    /// Slider step used by the panel's up/down actions, in percent of max.
    #[default(5.0)]
    #[serde(deserialize_with = "deserialize_step_percent")]
    pub step_percent: f64,
}

fn deserialize_command<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let command: Vec<String> = Deserialize::deserialize(deserializer)?;
    debug!("{:?}", command);

    if command.is_empty() {
        return Err(serde::de::Error::invalid_length(0, &"at least a program name"));
    }

    Ok(command)
}

fn deserialize_fallback_max_brightness<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let fallback: u32 = Deserialize::deserialize(deserializer)?;
    debug!("{:?}", fallback);

    if fallback == 0 {
        return Err(serde::de::Error::invalid_value(
            serde::de::Unexpected::Unsigned(0),
            &"a positive integer",
        ));
    }

    Ok(fallback)
}

fn deserialize_step_percent<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let step_percent = Deserialize::deserialize(deserializer)?;
    debug!("{:?}", step_percent);

    if !STEP_PERCENT_RANGE.contains(&step_percent) {
        return Err(serde::de::Error::invalid_value(
            serde::de::Unexpected::Float(step_percent),
            &"number in the range of 0.1 to 100.",
        ));
    }

    Ok(step_percent)
}

impl BacklitConfig {
    /// Load `config.toml` from the user's config directory, falling back to defaults.
    pub async fn new() -> Result<Self> {
        if let Some(config_path) = find_file("config", None, Some("toml")) {
            debug!("loading {}", config_path.display());
            deserialize_toml_file(config_path).await
        } else {
            debug!("no config file, using defaults");
            Ok(BacklitConfig::default())
        }
    }

    /// Load an explicitly named config file. Unlike [`BacklitConfig::new`] a
    /// missing file is an error.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        deserialize_toml_file(path).await
    }
}
