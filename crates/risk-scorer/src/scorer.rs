//! Risk scoring strategies.

use chrono::{DateTime, Utc};
use risk_common::{PreviewImage, RiskStatus, WeatherSnapshot};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vegetation::{IndexStatus, VegetationIndexResult, VegetationStats};

use crate::category::RiskCategory;
use crate::config::{InconclusivePolicy, ScoringConfig};
use crate::error::{Result, ScoringError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Normal,
    /// Scored without vegetation data.
    Low,
}

/// A scored fire-risk assessment for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Composite score in [0, 100]
    pub score: f64,
    pub category: RiskCategory,
    pub confidence: Confidence,
    /// `Success`, or `Inconclusive` for a weather-only score
    pub status: RiskStatus,
    /// Vegetation stress term in [0, 1]; absent when no pixel was valid
    pub vegetation_stress: Option<f64>,
    /// Weather stress term in [0, 1]
    pub weather_stress: f64,
    pub vegetation: VegetationStats,
    pub weather: WeatherSnapshot,
    pub scene_timestamp: DateTime<Utc>,
    /// NDVI overlay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<PreviewImage>,
    /// True-colour image of the scene
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_color_preview: Option<PreviewImage>,
}

/// Turns vegetation and weather inputs into a risk assessment.
///
/// Implementations must be pure: the same inputs give the same assessment.
pub trait RiskScorer: Send + Sync {
    /// Score one request.
    ///
    /// # Arguments
    /// * `vegetation` - Masked index result for the scene
    /// * `weather` - Current conditions over the area
    /// * `scene_timestamp` - Acquisition time of the scene
    ///
    /// # Returns
    /// The assessment, or `InsufficientVegetationData` when the vegetation
    /// result is inconclusive and the scorer cannot do without it.
    fn score(
        &self,
        vegetation: &VegetationIndexResult,
        weather: &WeatherSnapshot,
        scene_timestamp: DateTime<Utc>,
    ) -> Result<RiskAssessment>;

    /// Scorer name for logging.
    fn name(&self) -> &str;
}

/// Weighted linear combination of calibrated stress terms.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    config: ScoringConfig,
}

impl HeuristicScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// `clamp((high - mean) / (high - low), 0, 1)`
    pub fn vegetation_stress(&self, mean_ndvi: f64) -> f64 {
        1.0 - self.config.ndvi.normalize(mean_ndvi)
    }

    /// Weighted mean of the temperature, wind and dryness terms.
    pub fn weather_stress(&self, weather: &WeatherSnapshot) -> f64 {
        let c = &self.config;
        let temperature = c.temperature_c.normalize(weather.temperature_c);
        let wind = c.wind_kmh.normalize(weather.wind_speed_kmh);
        let dryness = 1.0 - c.humidity_pct.normalize(weather.relative_humidity_pct);

        let w = &c.weights;
        (w.temperature * temperature + w.wind * wind + w.humidity * dryness)
            / (w.temperature + w.wind + w.humidity)
    }
}

impl RiskScorer for HeuristicScorer {
    fn score(
        &self,
        vegetation: &VegetationIndexResult,
        weather: &WeatherSnapshot,
        scene_timestamp: DateTime<Utc>,
    ) -> Result<RiskAssessment> {
        let inputs = [
            weather.temperature_c,
            weather.wind_speed_kmh,
            weather.relative_humidity_pct,
        ];
        if inputs.iter().any(|v| !v.is_finite()) {
            return Err(ScoringError::InvalidInput(format!(
                "weather values must be finite, got {:?}",
                inputs
            )));
        }

        let weather_stress = self.weather_stress(weather);
        let weights = &self.config.weights;

        let mean = match (vegetation.status(), vegetation.mean()) {
            (IndexStatus::Valid, Some(mean)) => Some(mean),
            _ => None,
        };

        let (raw, vegetation_stress, confidence, status) = match mean {
            Some(mean) => {
                let veg = self.vegetation_stress(mean);
                let raw = (weights.vegetation * veg + weights.weather * weather_stress)
                    / (weights.vegetation + weights.weather);
                (raw, Some(veg), Confidence::Normal, RiskStatus::Success)
            }
            None => match self.config.inconclusive_policy {
                InconclusivePolicy::WeatherOnly => {
                    (weather_stress, None, Confidence::Low, RiskStatus::Inconclusive)
                }
                InconclusivePolicy::Reject => {
                    return Err(ScoringError::InsufficientVegetationData(format!(
                        "no valid vegetation pixels out of {}",
                        vegetation.stats().total_pixels
                    )));
                }
            },
        };

        if !raw.is_finite() {
            return Err(ScoringError::InvalidInput(format!(
                "composite score is not finite with weights {:?}",
                weights
            )));
        }

        let score = (100.0 * raw).clamp(0.0, 100.0);
        let category = RiskCategory::from_score(score, &self.config.breakpoints);

        debug!(
            score = score,
            category = %category,
            vegetation_stress = ?vegetation_stress,
            weather_stress = weather_stress,
            "Scored assessment"
        );

        Ok(RiskAssessment {
            score,
            category,
            confidence,
            status,
            vegetation_stress,
            weather_stress,
            vegetation: vegetation.stats().clone(),
            weather: weather.clone(),
            scene_timestamp,
            preview: None,
            true_color_preview: None,
        })
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
