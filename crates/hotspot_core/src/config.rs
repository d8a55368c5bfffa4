use crate::error::{CoreError, Result};
use crate::types::{HotspotStyle, Shape};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest default window accepted from configuration: one day.
pub const MAX_WINDOW_SECS: f64 = 86_400.0;

/// Defaults applied when the author creates a new hotspot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Width and height of a new hotspot, in container pixels.
    pub default_size: f64,
    /// Length of a new hotspot's time window.
    pub default_window_secs: f64,
    pub default_shape: Shape,
    pub default_opacity: f64,
    pub default_style: HotspotStyle,
    pub name_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_size: crate::geometry::MIN_HOTSPOT_SIZE,
            default_window_secs: 5.0,
            default_shape: Shape::Circle,
            default_opacity: 0.8,
            default_style: HotspotStyle::default(),
            name_prefix: "Hotspot".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&data)
    }

    /// Reject values that would produce a hotspot breaking its own
    /// invariants: a window must be positive, opacity lies in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        let numbers = [self.default_size, self.default_window_secs, self.default_opacity];
        if let Some(bad) = numbers.iter().find(|v| !v.is_finite()) {
            return Err(CoreError::MalformedNumericInput(bad.to_string()));
        }
        if self.default_window_secs <= 0.0 || self.default_window_secs > MAX_WINDOW_SECS {
            return Err(CoreError::InvalidGeometry(format!(
                "default_window_secs must be in (0, {MAX_WINDOW_SECS}], got {}",
                self.default_window_secs
            )));
        }
        if !(0.0..=1.0).contains(&self.default_opacity) {
            return Err(CoreError::InvalidGeometry(format!(
                "default_opacity must be in [0, 1], got {}",
                self.default_opacity
            )));
        }
        if self.default_size <= 0.0 {
            return Err(CoreError::InvalidGeometry(format!(
                "default_size must be positive, got {}",
                self.default_size
            )));
        }
        Ok(())
    }
}
