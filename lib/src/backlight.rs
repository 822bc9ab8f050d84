use crate::config::BacklitConfig;
use crate::consts::*;
use crate::errors::*;
use crate::util::*;
use crate::writer::write_brightness;

use std::path::{Path, PathBuf};

use regex::Regex;
use tokio::fs::{metadata, read_dir};

make_log_macro!(debug, "backlight");
make_log_macro!(warn, "backlight");

/// Why a [`Reading`] fell back to a default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefaultReason {
    /// The file could not be opened or read.
    Unreadable,
    /// The file's contents are not an integer.
    Unparseable(String),
    /// A max brightness of 0 would leave no usable range.
    Zero,
}

/// A brightness value read from a device, or the default substituted for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reading {
    Device(u32),
    Default { value: u32, reason: DefaultReason },
}

impl Reading {
    pub fn value(&self) -> u32 {
        match self {
            Reading::Device(value) | Reading::Default { value, .. } => *value,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Reading::Default { .. })
    }
}

/// Reads and writes brightness for devices under a backlight root.
///
/// Holds no device state: every call names the device it acts on and
/// values are read fresh from the filesystem each time.
#[derive(Clone, Debug)]
pub struct Backlight {
    config: BacklitConfig,
}

impl Default for Backlight {
    fn default() -> Self {
        Self::new(BacklitConfig::default())
    }
}

impl Backlight {
    pub fn new(config: BacklitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BacklitConfig {
        &self.config
    }

    pub fn device_path(&self, device: &str) -> PathBuf {
        self.config.root.join(device)
    }

    /// Names of the devices under the root that expose a brightness file,
    /// in directory order. Empty when the root is missing or unreadable.
    pub async fn list_devices(&self) -> Vec<String> {
        self.scan(None).await
    }

    /// Like [`Backlight::list_devices`], keeping only names matching `pattern`.
    pub async fn list_devices_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let device_regex = Regex::new(pattern)?;
        Ok(self.scan(Some(&device_regex)).await)
    }

    async fn scan(&self, device_regex: Option<&Regex>) -> Vec<String> {
        let mut sysfs_paths = match read_dir(&self.config.root).await {
            Ok(sysfs_paths) => sysfs_paths,
            Err(e) => {
                debug!("{}: {e}", self.config.root.display());
                return Vec::new();
            }
        };

        let mut device_names = Vec::new();
        loop {
            let sysfs_path = match sysfs_paths.next_entry().await {
                Ok(Some(sysfs_path)) => sysfs_path,
                Ok(None) => break,
                Err(e) => {
                    debug!("{e}");
                    break;
                }
            };
            let device_name = sysfs_path.file_name().to_string_lossy().to_string();
            if let Some(device_regex) = device_regex {
                if !device_regex.is_match(&device_name) {
                    continue;
                }
                debug!("{:?} matched {}", device_name, device_regex.as_str());
            }
            if metadata(sysfs_path.path().join(FILE_BRIGHTNESS)).await.is_ok() {
                device_names.push(device_name);
            } else {
                debug!("{:?} has no {FILE_BRIGHTNESS} file, skipping", device_name);
            }
        }
        device_names
    }

    /// Current brightness of `device`, or 0 if it can't be read.
    pub async fn get_current_brightness(&self, device: &str) -> Reading {
        let path = self.device_path(device).join(FILE_BRIGHTNESS);
        match read_brightness_raw(&path).await {
            Ok(value) => Reading::Device(value),
            Err(reason) => {
                debug!("{}: {:?}", path.display(), reason);
                Reading::Default {
                    value: DEFAULT_BRIGHTNESS,
                    reason,
                }
            }
        }
    }

    /// Max brightness of `device`. Never 0: the configured fallback (255
    /// unless overridden) stands in when the file can't be used.
    pub async fn get_max_brightness(&self, device: &str) -> Reading {
        let path = self.device_path(device).join(FILE_MAX_BRIGHTNESS);
        let reason = match read_brightness_raw(&path).await {
            Ok(0) => DefaultReason::Zero,
            Ok(value) => return Reading::Device(value),
            Err(reason) => reason,
        };
        warn!(
            "{}: {:?}, assuming {}",
            path.display(),
            reason,
            self.config.fallback_max_brightness
        );
        Reading::Default {
            value: self.config.fallback_max_brightness,
            reason,
        }
    }

    /// Write `value` to `device`'s brightness file through the configured writer.
    ///
    /// The driver enforces the upper bound. The result is not verified by
    /// reading the value back.
    pub async fn set_brightness(&self, device: &str, value: u32) -> Result<()> {
        if !is_valid_device_name(device) {
            return Err(BacklitError::InvalidDeviceName(device.to_string()));
        }
        let path = self.device_path(device).join(FILE_BRIGHTNESS_WRITE);
        write_brightness(&self.config, device, &path, value).await
    }
}

async fn read_brightness_raw(path: &Path) -> Result<u32, DefaultReason> {
    let contents = read_file(path)
        .await
        .map_err(|_| DefaultReason::Unreadable)?;
    contents
        .trim()
        .parse()
        .map_err(|_| DefaultReason::Unparseable(contents))
}

/// Device names are a single path segment under the root.
fn is_valid_device_name(device: &str) -> bool {
    !device.is_empty() && device != "." && device != ".." && !device.contains(['/', '\0'])
}
