use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tokio::io::AsyncReadExt as _;

use crate::errors::*;

macro_rules! make_log_macro {
    (@wdoll $macro_name:ident, $block_name:literal, ($dol:tt)) => {
        #[allow(unused_macros)]
        macro_rules! $macro_name {
            ($dol($args:tt)+) => {
                ::log::$macro_name!(target: $block_name, $dol($args)+);
            };
        }
    };
    ($macro_name:ident, $block_name:literal) => {
        make_log_macro!(@wdoll $macro_name, $block_name, ($));
    };
}

/// Look for `file` (with an optional `extension`) in the user's config
/// directory, under `backlit/` and the optional `subdir`.
///
/// Absolute paths are returned as-is when they exist.
pub fn find_file(file: &str, subdir: Option<&str>, extension: Option<&str>) -> Option<PathBuf> {
    let file = Path::new(file);
    if file.is_absolute() {
        return file.exists().then(|| file.to_path_buf());
    }

    let mut candidate = dirs::config_dir()?.join("backlit");
    if let Some(subdir) = subdir {
        candidate.push(subdir);
    }
    candidate.push(file);
    if let Some(extension) = extension {
        candidate.set_extension(extension);
    }

    candidate.exists().then_some(candidate)
}

pub async fn deserialize_toml_file<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let contents = read_file(path)
        .await
        .error(&format!("Failed to read {}", path.display()))?;

    toml::from_str(&contents).map_err(|err| {
        #[allow(deprecated)]
        let location_msg = err
            .span()
            .map(|span| {
                let line = 1 + contents.as_bytes()[..(span.start)]
                    .iter()
                    .filter(|b| **b == b'\n')
                    .count();
                format!(" at line {line}")
            })
            .unwrap_or_default();
        BacklitError::Other(format!(
            "Failed to deserialize TOML file {}{}: {}",
            path.display(),
            location_msg,
            err.message()
        ))
    })
}

pub async fn read_file(path: impl AsRef<Path>) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut content = String::new();
    file.read_to_string(&mut content).await?;
    Ok(content.trim_end().to_string())
}

/// `value` as a percentage (0.0-100.0) of `max`. A `max` of 0 is treated as 1.
pub fn brightness_percent(value: u32, max: u32) -> f64 {
    f64::from(value.min(max)) / f64::from(max.max(1)) * 100.0
}

/// The raw brightness closest to `percent` of `max`. `percent` is clamped to 0-100.
pub fn value_for_percent(percent: f64, max: u32) -> u32 {
    (percent.clamp(0.0, 100.0) / 100.0 * f64::from(max)).round() as u32
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_max() {
        assert_eq!(brightness_percent(60, 240).round(), 25.0);
        assert_eq!(brightness_percent(0, 255), 0.0);
        assert_eq!(brightness_percent(255, 255), 100.0);
    }

    #[test]
    fn percent_with_zero_max() {
        assert_eq!(brightness_percent(0, 0), 0.0);
    }

    #[test]
    fn value_from_percent_is_clamped() {
        assert_eq!(value_for_percent(25.0, 240), 60);
        assert_eq!(value_for_percent(150.0, 240), 240);
        assert_eq!(value_for_percent(-5.0, 240), 0);
    }

    #[tokio::test]
    async fn read_file_trims_trailing_newline() {
        let sysfs = fixture::FakeSysfs::new();
        sysfs.device("acpi_video0", Some("42\n"), None);
        let content = read_file(sysfs.root().join("acpi_video0/brightness"))
            .await
            .unwrap();
        assert_eq!(content, "42");
    }
}
