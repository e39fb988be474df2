//! Scoring calibration, weights and policies.

use serde::{Deserialize, Serialize};

use crate::category::Breakpoints;

/// A calibration interval; values are normalised to [0, 1] across it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Position of `value` across the interval, clamped to [0, 1].
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    fn validate(&self, name: &str) -> Result<(), String> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min >= self.max {
            return Err(format!(
                "scoring.{} must satisfy min < max, got {}..{}",
                name, self.min, self.max
            ));
        }
        Ok(())
    }
}

/// Relative weights of the score components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    #[serde(default = "default_vegetation_weight")]
    pub vegetation: f64,
    #[serde(default = "default_weather_weight")]
    pub weather: f64,
    /// Weather sub-weights
    #[serde(default = "default_sub_weight")]
    pub temperature: f64,
    #[serde(default = "default_sub_weight")]
    pub humidity: f64,
    #[serde(default = "default_sub_weight")]
    pub wind: f64,
}

fn default_vegetation_weight() -> f64 {
    0.4
}

fn default_weather_weight() -> f64 {
    0.6
}

fn default_sub_weight() -> f64 {
    1.0
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            vegetation: default_vegetation_weight(),
            weather: default_weather_weight(),
            temperature: default_sub_weight(),
            humidity: default_sub_weight(),
            wind: default_sub_weight(),
        }
    }
}

impl Weights {
    fn validate(&self) -> Result<(), String> {
        let all = [
            ("vegetation", self.vegetation),
            ("weather", self.weather),
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("wind", self.wind),
        ];
        for (name, w) in all {
            if !w.is_finite() || w < 0.0 {
                return Err(format!(
                    "scoring.weights.{} must be a non-negative number, got {}",
                    name, w
                ));
            }
        }
        if self.vegetation + self.weather <= 0.0 {
            return Err("scoring.weights.vegetation + weather must be > 0".to_string());
        }
        if self.temperature + self.humidity + self.wind <= 0.0 {
            return Err("scoring.weights.temperature + humidity + wind must be > 0".to_string());
        }
        Ok(())
    }
}

/// What to do when no vegetation pixel survived masking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InconclusivePolicy {
    /// Score on weather alone and flag the result low-confidence.
    #[default]
    WeatherOnly,
    /// Fail with `InsufficientVegetationData`.
    Reject,
}

/// Complete heuristic scorer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// NDVI at or below `min` is full stress, at or above `max` none
    #[serde(default = "default_ndvi")]
    pub ndvi: Bounds,
    #[serde(default = "default_temperature")]
    pub temperature_c: Bounds,
    #[serde(default = "default_wind")]
    pub wind_kmh: Bounds,
    /// Stress rises as humidity falls towards `min`
    #[serde(default = "default_humidity")]
    pub humidity_pct: Bounds,
    #[serde(default)]
    pub weights: Weights,
    #[serde(default)]
    pub breakpoints: Breakpoints,
    #[serde(default)]
    pub inconclusive_policy: InconclusivePolicy,
}

fn default_ndvi() -> Bounds {
    Bounds::new(0.0, 0.8)
}

fn default_temperature() -> Bounds {
    Bounds::new(5.0, 45.0)
}

fn default_wind() -> Bounds {
    Bounds::new(0.0, 60.0)
}

fn default_humidity() -> Bounds {
    Bounds::new(0.0, 100.0)
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            ndvi: default_ndvi(),
            temperature_c: default_temperature(),
            wind_kmh: default_wind(),
            humidity_pct: default_humidity(),
            weights: Weights::default(),
            breakpoints: Breakpoints::default(),
            inconclusive_policy: InconclusivePolicy::default(),
        }
    }
}

impl ScoringConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.ndvi.validate("ndvi")?;
        if self.ndvi.min < -1.0 || self.ndvi.max > 1.0 {
            return Err(format!(
                "scoring.ndvi must lie within -1..1, got {}..{}",
                self.ndvi.min, self.ndvi.max
            ));
        }
        self.temperature_c.validate("temperature_c")?;
        self.wind_kmh.validate("wind_kmh")?;
        self.humidity_pct.validate("humidity_pct")?;
        self.weights.validate()?;
        self.breakpoints.validate()?;
        Ok(())
    }
}
