//! Open-Meteo forecast API client.
//!
//! Uses the `current` block of `/v1/forecast`. Several points are fetched in
//! one request by passing comma-separated coordinate lists, in which case the
//! API answers with a JSON array instead of an object.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use risk_common::{BoundingBox, WeatherSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::adapter::WeatherAdapter;
use crate::error::{Result, WeatherError};

const CURRENT_VARIABLES: &str =
    "temperature_2m,relative_humidity_2m,wind_speed_10m,wind_direction_10m";

/// Weather source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Open-Meteo API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sample points per axis across the bbox; 1 samples only the centroid
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
}

fn default_base_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_grid_size() -> usize {
    1
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            grid_size: default_grid_size(),
        }
    }
}

impl WeatherConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.base_url.is_empty() {
            return Err("weather.base_url must not be empty".to_string());
        }
        if self.grid_size == 0 || self.grid_size > 10 {
            return Err(format!(
                "weather.grid_size must be within 1..=10, got {}",
                self.grid_size
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ForecastPayload {
    Many(Vec<Forecast>),
    One(Forecast),
}

#[derive(Debug, Deserialize)]
struct Forecast {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    /// Unix seconds (requested with `timeformat=unixtime`).
    time: i64,
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
}

impl CurrentConditions {
    fn into_snapshot(self) -> Result<WeatherSnapshot> {
        let observed_at: DateTime<Utc> = Utc
            .timestamp_opt(self.time, 0)
            .single()
            .ok_or_else(|| WeatherError::Decode(format!("invalid timestamp {}", self.time)))?;

        let require = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| WeatherError::Decode(format!("missing current.{}", name)))
        };

        let snapshot = WeatherSnapshot::new(
            require(self.temperature_2m, "temperature_2m")?,
            require(self.wind_speed_10m, "wind_speed_10m")?,
            require(self.relative_humidity_2m, "relative_humidity_2m")?,
            observed_at,
        );

        Ok(match self.wind_direction_10m {
            Some(deg) => snapshot.with_wind_direction(deg),
            None => snapshot,
        })
    }
}

/// Parse a forecast response body into one snapshot per requested point.
fn parse_response(body: &str) -> Result<Vec<WeatherSnapshot>> {
    let payload: ForecastPayload = serde_json::from_str(body)
        .map_err(|e| WeatherError::Decode(format!("parsing Open-Meteo response: {}", e)))?;

    let forecasts = match payload {
        ForecastPayload::Many(forecasts) => forecasts,
        ForecastPayload::One(forecast) => vec![forecast],
    };

    forecasts
        .into_iter()
        .map(|f| f.current.into_snapshot())
        .collect()
}

fn join_coords(values: impl Iterator<Item = f64>) -> String {
    values
        .map(|v| format!("{:.5}", v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Open-Meteo weather source.
pub struct OpenMeteoClient {
    client: Client,
    config: WeatherConfig,
}

impl OpenMeteoClient {
    pub fn new(config: WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| WeatherError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn with_client(client: Client, config: WeatherConfig) -> Self {
        Self { client, config }
    }

    fn forecast_url(&self) -> String {
        format!("{}/v1/forecast", self.config.base_url.trim_end_matches('/'))
    }

    /// Fetch current conditions for several `(lon, lat)` points in one call.
    async fn fetch_points(&self, points: &[(f64, f64)]) -> Result<Vec<WeatherSnapshot>> {
        for (lon, lat) in points {
            if !(-90.0..=90.0).contains(lat) || !(-180.0..=180.0).contains(lon) {
                return Err(WeatherError::InvalidCoordinates(format!(
                    "({}, {}) is outside WGS84 range",
                    lat, lon
                )));
            }
        }

        let latitudes = join_coords(points.iter().map(|(_, lat)| *lat));
        let longitudes = join_coords(points.iter().map(|(lon, _)| *lon));

        let response = self
            .client
            .get(self.forecast_url())
            .query(&[
                ("latitude", latitudes.as_str()),
                ("longitude", longitudes.as_str()),
                ("current", CURRENT_VARIABLES),
                ("wind_speed_unit", "kmh"),
                ("timeformat", "unixtime"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = format!(
                "Open-Meteo returned HTTP {}: {}",
                status,
                body.chars().take(300).collect::<String>()
            );
            return Err(
                if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    WeatherError::Unavailable(detail)
                } else {
                    WeatherError::Rejected(detail)
                },
            );
        }

        let snapshots = parse_response(&body)?;
        if snapshots.len() != points.len() {
            return Err(WeatherError::Decode(format!(
                "requested {} points, Open-Meteo returned {}",
                points.len(),
                snapshots.len()
            )));
        }

        debug!(points = points.len(), "Fetched current weather");
        Ok(snapshots)
    }
}

#[async_trait]
impl WeatherAdapter for OpenMeteoClient {
    async fn fetch_current(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot> {
        self.fetch_points(&[(lon, lat)])
            .await?
            .pop()
            .ok_or_else(|| WeatherError::Decode("empty Open-Meteo response".to_string()))
    }

    /// Fetches all sample points in a single request.
    #[instrument(skip(self, bbox), fields(bbox = %bbox))]
    async fn fetch_area(&self, bbox: &BoundingBox, grid_size: usize) -> Result<WeatherSnapshot> {
        let points = bbox.sample_grid(grid_size);
        let samples = self.fetch_points(&points).await?;

        WeatherSnapshot::mean(&samples)
            .ok_or_else(|| WeatherError::Decode("no weather samples returned".to_string()))
    }

    fn name(&self) -> &str {
        "open-meteo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = r#"{
        "latitude": 38.65,
        "longitude": -8.9,
        "generationtime_ms": 0.05,
        "utc_offset_seconds": 0,
        "current_units": {"time": "unixtime", "temperature_2m": "°C", "wind_speed_10m": "km/h"},
        "current": {
            "time": 1721300400,
            "interval": 900,
            "temperature_2m": 31.4,
            "relative_humidity_2m": 22,
            "wind_speed_10m": 18.7,
            "wind_direction_10m": 315
        }
    }"#;

    #[test]
    fn test_parse_single_point() {
        let snapshots = parse_response(SINGLE).unwrap();
        assert_eq!(snapshots.len(), 1);

        let s = &snapshots[0];
        assert_eq!(s.temperature_c, 31.4);
        assert_eq!(s.relative_humidity_pct, 22.0);
        assert_eq!(s.wind_speed_kmh, 18.7);
        assert_eq!(s.wind_direction_deg, Some(315.0));
        assert_eq!(s.observed_at.timestamp(), 1_721_300_400);
    }

    #[test]
    fn test_parse_multiple_points() {
        let body = format!("[{},{}]", SINGLE, SINGLE.replace("31.4", "29.0"));
        let snapshots = parse_response(&body).unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1].temperature_c, 29.0);
    }

    #[test]
    fn test_missing_variable_is_decode_error() {
        let body = r#"{"current": {"time": 1721300400, "temperature_2m": null,
            "relative_humidity_2m": 22, "wind_speed_10m": 3.0}}"#;
        let err = parse_response(body).unwrap_err();
        assert!(matches!(err, WeatherError::Decode(ref m) if m.contains("temperature_2m")));
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            parse_response("<html>oops</html>"),
            Err(WeatherError::Decode(_))
        ));
    }

    #[test]
    fn test_join_coords() {
        assert_eq!(join_coords([38.6, 38.7].into_iter()), "38.60000,38.70000");
    }

    #[test]
    fn test_config_validation() {
        assert!(WeatherConfig::default().validate().is_ok());
        let config = WeatherConfig {
            grid_size: 0,
            ..WeatherConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
