//! Point-in-time weather observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions at (or averaged over) the area of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub relative_humidity_pct: f64,
    pub observed_at: DateTime<Utc>,
    /// Direction the wind blows from, degrees clockwise from north.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction_deg: Option<f64>,
    /// Number of sample points averaged into this snapshot.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
}

fn default_sample_count() -> usize {
    1
}

impl WeatherSnapshot {
    pub fn new(
        temperature_c: f64,
        wind_speed_kmh: f64,
        relative_humidity_pct: f64,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            temperature_c,
            wind_speed_kmh,
            relative_humidity_pct,
            observed_at,
            wind_direction_deg: None,
            sample_count: 1,
        }
    }

    pub fn with_wind_direction(mut self, degrees: f64) -> Self {
        self.wind_direction_deg = Some(degrees);
        self
    }

    /// Average several snapshots into one.
    ///
    /// Scalars use the arithmetic mean; wind direction uses the vector mean so
    /// that 350° and 10° average to 0° rather than 180°. The observation time
    /// is the latest of the inputs. Returns `None` for an empty slice.
    pub fn mean(samples: &[WeatherSnapshot]) -> Option<WeatherSnapshot> {
        let first = samples.first()?;
        let n = samples.len() as f64;

        let temperature_c = samples.iter().map(|s| s.temperature_c).sum::<f64>() / n;
        let wind_speed_kmh = samples.iter().map(|s| s.wind_speed_kmh).sum::<f64>() / n;
        let relative_humidity_pct =
            samples.iter().map(|s| s.relative_humidity_pct).sum::<f64>() / n;
        let observed_at = samples
            .iter()
            .map(|s| s.observed_at)
            .max()
            .unwrap_or(first.observed_at);

        let directions: Vec<f64> = samples.iter().filter_map(|s| s.wind_direction_deg).collect();
        let wind_direction_deg = if directions.is_empty() {
            None
        } else {
            let (x, y) = directions.iter().fold((0.0, 0.0), |(x, y), deg| {
                let rad = deg.to_radians();
                (x + rad.sin(), y + rad.cos())
            });
            let mut deg = x.atan2(y).to_degrees();
            if deg < 0.0 {
                deg += 360.0;
            }
            Some(deg)
        };

        Some(WeatherSnapshot {
            temperature_c,
            wind_speed_kmh,
            relative_humidity_pct,
            observed_at,
            wind_direction_deg,
            sample_count: samples.iter().map(|s| s.sample_count).sum(),
        })
    }
}
