//! Animation settings
//!
//! Platform accessibility/performance toggles plus the defaults used by the
//! animated widgets. Settings are owned by a [`Widget`](crate::Widget) and
//! queried when an animation starts; there is no process-wide global.
//!
//! Settings can be stored as TOML:
//!
//! ```toml
//! enable_animations = true
//! reduced_motion = false
//!
//! [spring]
//! damping_ratio = 1.0
//! mass = 1.0
//! stiffness = 100.0
//! epsilon = 0.001
//!
//! [carousel]
//! reveal_duration_ms = 200
//! spacing = 12
//! scroll_duration_ms = 200
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Animation-related settings for a host
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    /// When false, animations jump straight to their end value
    #[serde(default = "default_true")]
    pub enable_animations: bool,
    /// Request to avoid large motion; honoured by the animated widgets
    #[serde(default)]
    pub reduced_motion: bool,
    #[serde(default)]
    pub spring: SpringSettings,
    #[serde(default)]
    pub carousel: CarouselSettings,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_animations: true,
            reduced_motion: false,
            spring: SpringSettings::default(),
            carousel: CarouselSettings::default(),
        }
    }
}

/// Default spring used by widgets that animate with springs
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct SpringSettings {
    #[serde(default = "default_damping_ratio")]
    pub damping_ratio: f64,
    #[serde(default = "default_mass")]
    pub mass: f64,
    #[serde(default = "default_stiffness")]
    pub stiffness: f64,
    /// Settle threshold for displacement and velocity
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

fn default_damping_ratio() -> f64 {
    1.0
}

fn default_mass() -> f64 {
    1.0
}

fn default_stiffness() -> f64 {
    100.0
}

fn default_epsilon() -> f64 {
    0.001
}

impl Default for SpringSettings {
    fn default() -> Self {
        Self {
            damping_ratio: default_damping_ratio(),
            mass: default_mass(),
            stiffness: default_stiffness(),
            epsilon: default_epsilon(),
        }
    }
}

/// Carousel defaults
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct CarouselSettings {
    /// Duration of the page reveal animation on insert/remove
    #[serde(default)]
    pub reveal_duration_ms: u32,
    /// Spacing between pages in pixels
    #[serde(default)]
    pub spacing: u32,
    /// Duration used by animated programmatic scrolling
    #[serde(default = "default_scroll_duration")]
    pub scroll_duration_ms: u32,
}

fn default_scroll_duration() -> u32 {
    200
}

impl Default for CarouselSettings {
    fn default() -> Self {
        Self {
            reveal_duration_ms: 0,
            spacing: 0,
            scroll_duration_ms: default_scroll_duration(),
        }
    }
}

impl Settings {
    /// Parse settings from a TOML string. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings: Self = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that every value can be used to build an animation
    pub fn validate(&self) -> Result<()> {
        let spring = &self.spring;
        check(
            "spring.damping_ratio",
            spring.damping_ratio,
            spring.damping_ratio >= 0.0,
            "must be non-negative",
        )?;
        check("spring.mass", spring.mass, spring.mass > 0.0, "must be positive")?;
        check(
            "spring.stiffness",
            spring.stiffness,
            spring.stiffness > 0.0,
            "must be positive",
        )?;
        check("spring.epsilon", spring.epsilon, spring.epsilon > 0.0, "must be positive")
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&source)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Serialize settings to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write settings to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = self.to_toml_string()?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn check(field: &'static str, value: f64, valid: bool, requirement: &str) -> Result<()> {
    if value.is_finite() && valid {
        return Ok(());
    }
    Err(ConfigError::Invalid {
        field,
        reason: format!("{requirement}, got {value}"),
    })
}
