//! Application configuration.
//!
//! Loaded from TOML; every field is optional and falls back to its default.
//!
//! ```toml
//! max_tick = 0.05
//! scrollbar_width = 8.0
//! wheel_step = 24.0
//! spacing = 4.0
//! tab_cycles_focus = true
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::layout::Linear;

/// Largest animation step, in seconds, handed to `tick` after a stall.
pub const DEFAULT_MAX_TICK: f32 = 0.05;
pub const DEFAULT_SCROLLBAR_WIDTH: f32 = 8.0;
/// Scroll distance per wheel notch.
pub const DEFAULT_WHEEL_STEP: f32 = 24.0;
pub const DEFAULT_SPACING: f32 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub max_tick: f32,
    pub scrollbar_width: f32,
    pub wheel_step: f32,
    pub spacing: f32,
    /// Tab / Shift+Tab move focus when the focused widget does not consume them.
    pub tab_cycles_focus: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_tick: DEFAULT_MAX_TICK,
            scrollbar_width: DEFAULT_SCROLLBAR_WIDTH,
            wheel_step: DEFAULT_WHEEL_STEP,
            spacing: DEFAULT_SPACING,
            tab_cycles_focus: true,
        }
    }
}

impl AppConfig {
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |field, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: "must be positive",
                })
            }
        };
        positive("max_tick", self.max_tick)?;
        positive("wheel_step", self.wheel_step)?;
        if !(self.scrollbar_width.is_finite() && self.scrollbar_width >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "scrollbar_width",
                reason: "must not be negative",
            });
        }
        if !(self.spacing.is_finite() && self.spacing >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "spacing",
                reason: "must not be negative",
            });
        }
        Ok(())
    }

    pub fn max_tick_duration(&self) -> Duration {
        Duration::from_secs_f32(self.max_tick)
    }

    /// A column using the configured spacing and scrollbar width.
    pub fn column(&self) -> Linear {
        Linear::column()
            .with_spacing(self.spacing)
            .with_scrollbar_width(self.scrollbar_width)
    }

    /// A row using the configured spacing and scrollbar width.
    pub fn row(&self) -> Linear {
        Linear::row()
            .with_spacing(self.spacing)
            .with_scrollbar_width(self.scrollbar_width)
    }
}
