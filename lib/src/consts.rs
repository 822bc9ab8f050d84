use std::ops::RangeInclusive;

/// Location of backlight devices
pub const DEVICES_PATH: &str = "/sys/class/backlight";

/// Filename for device's max brightness
pub const FILE_MAX_BRIGHTNESS: &str = "max_brightness";

/// Filename for current brightness. A device is only listed when this exists.
pub const FILE_BRIGHTNESS: &str = "brightness";

/// set the requested brightness level
pub const FILE_BRIGHTNESS_WRITE: &str = "brightness";

/// Substituted for the current brightness when it can't be read.
pub const DEFAULT_BRIGHTNESS: u32 = 0;

/// Substituted for the max brightness when it can't be read (or reads as 0).
pub const DEFAULT_MAX_BRIGHTNESS: u32 = 255;

/// pkexec exits with 126 when the authorization dialog is dismissed and
/// 127 when authorization could not be obtained.
pub const ELEVATION_DENIED_CODES: [i32; 2] = [126, 127];

/// Range of valid values for `step_percent`
pub const STEP_PERCENT_RANGE: RangeInclusive<f64> = 0.1..=100.;
