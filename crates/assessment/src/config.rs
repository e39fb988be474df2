//! Pipeline configuration.
//!
//! Loaded from YAML, then overridden by `FIRE_RISK_*` environment
//! variables, then validated. Every section and field has a default, so an
//! empty file is a valid configuration.

use std::path::Path;

use preview::PreviewConfig;
use risk_common::RetryPolicy;
use risk_scorer::ScoringConfig;
use scene_catalog::StacConfig;
use serde::{Deserialize, Serialize};
use vegetation::MaskClasses;
use weather_client::WeatherConfig;

use crate::error::{ConfigError, ConfigResult};

/// Scene selection defaults and request limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Cloud cover ceiling used when a request does not give one
    #[serde(default = "default_max_cloud_pct")]
    pub max_cloud_pct: f64,

    /// Lookback window used when a request does not give one
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Largest accepted bbox, in square degrees
    #[serde(default = "default_max_bbox_area")]
    pub max_bbox_area_sq_deg: f64,
}

fn default_max_cloud_pct() -> f64 {
    25.0
}

fn default_lookback_days() -> u32 {
    30
}

fn default_max_bbox_area() -> f64 {
    1.0
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_cloud_pct: default_max_cloud_pct(),
            lookback_days: default_lookback_days(),
            max_bbox_area_sq_deg: default_max_bbox_area(),
        }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.max_cloud_pct) {
            return Err(format!(
                "selection.max_cloud_pct must be within 0..=100, got {}",
                self.max_cloud_pct
            ));
        }
        if self.lookback_days == 0 {
            return Err("selection.lookback_days must be > 0".to_string());
        }
        if self.max_bbox_area_sq_deg.is_nan() || self.max_bbox_area_sq_deg <= 0.0 {
            return Err(format!(
                "selection.max_bbox_area_sq_deg must be > 0, got {}",
                self.max_bbox_area_sq_deg
            ));
        }
        Ok(())
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub masking: MaskClasses,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub catalog: StacConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

impl PipelineConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Load the optional file, apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Apply `FIRE_RISK_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
            value.and_then(|v| v.trim().parse().ok())
        }

        if let Some(v) = parsed(lookup("FIRE_RISK_MAX_CLOUD_PCT")) {
            self.selection.max_cloud_pct = v;
        }
        if let Some(v) = parsed(lookup("FIRE_RISK_LOOKBACK_DAYS")) {
            self.selection.lookback_days = v;
        }
        if let Some(v) = parsed(lookup("FIRE_RISK_MAX_BBOX_AREA")) {
            self.selection.max_bbox_area_sq_deg = v;
        }

        if let Some(v) = lookup("FIRE_RISK_STAC_URL") {
            self.catalog.api_url = v;
        }
        if let Some(v) = lookup("FIRE_RISK_STAC_COLLECTION") {
            self.catalog.collection = v;
        }
        if let Some(v) = lookup("FIRE_RISK_CROP_URL") {
            self.catalog.crop_url = v;
        }

        if let Some(v) = lookup("FIRE_RISK_WEATHER_URL") {
            self.weather.base_url = v;
        }
        if let Some(v) = parsed(lookup("FIRE_RISK_WEATHER_GRID_SIZE")) {
            self.weather.grid_size = v;
        }

        if let Some(v) = parsed(lookup("FIRE_RISK_MAX_RETRIES")) {
            self.retry.max_retries = v;
        }
        if let Some(v) = parsed(lookup("FIRE_RISK_REQUEST_TIMEOUT_MS")) {
            self.retry.request_timeout_ms = v;
        }

        if let Some(v) = lookup("FIRE_RISK_PREVIEW") {
            self.preview.enabled = v.eq_ignore_ascii_case("true") || v == "1";
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.selection.validate()?;
        self.scoring.validate()?;
        self.masking.validate()?;
        self.retry.validate()?;
        self.catalog.validate()?;
        self.weather.validate()?;
        self.preview.validate()?;
        Ok(())
    }
}
