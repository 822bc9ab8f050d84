#![warn(clippy::match_same_arms)]
#![warn(clippy::semicolon_if_nothing_returned)]
#![warn(clippy::unnecessary_wraps)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Discover backlight devices under `/sys/class/backlight`, read their
//! brightness and write new values through a privileged writer.

#[macro_use]
mod util;
mod backlight;
mod config;
mod consts;
mod errors;
mod writer;

pub use crate::backlight::{Backlight, DefaultReason, Reading};
pub use crate::config::{BacklitConfig, WriterKind};
pub use crate::consts::{DEFAULT_MAX_BRIGHTNESS, DEVICES_PATH};
pub use crate::errors::{BacklitError, Result};
pub use crate::util::{brightness_percent, value_for_percent};
