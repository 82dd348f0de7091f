//! # Layout configuration
//!
//! A keyboard is described by one TOML layout file: the settings, the
//! code-text collections (varias, shortcut lists and sets, modify rolls), the
//! buttons and an optional touch script for the demo binary.
//!
//! Missing configuration degrades to defaults. Without a layout file the
//! built-in layout is used; without a `[settings]` table the values of
//! [`BoardSettings::default`] apply.

pub mod error;
pub mod layout;

pub use error::ConfigError;
pub use layout::{BuiltLayout, Layout, DEFAULT_LAYOUT};

use crate::board::ROOT_BOARD;
use crate::text::LENGTH_LIMIT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables of the keyboard core
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct BoardSettings {
    /// Characters kept by the text buffers around the cursor
    pub text_limit: usize,
    /// Second tap of a double button must come within this window
    pub double_tap_window_ms: u64,
    /// Interval between repeats of a held repeating packet
    pub repeat_interval_ms: u64,
    /// Board names, the first one is the root board
    pub boards: Vec<String>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            text_limit: LENGTH_LIMIT,
            double_tap_window_ms: 300,
            repeat_interval_ms: 100,
            boards: vec![ROOT_BOARD.to_string()],
        }
    }
}

impl BoardSettings {
    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_window_ms)
    }

    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms)
    }
}
