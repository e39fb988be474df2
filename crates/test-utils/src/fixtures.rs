//! Common test fixtures.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use risk_common::{BandId, BoundingBox, SceneReference, WeatherSnapshot};

/// A small area of interest north of Lisbon (about 11 x 11 km).
pub fn lisbon_aoi() -> BoundingBox {
    BoundingBox {
        min_lon: -8.95,
        min_lat: 38.60,
        max_lon: -8.85,
        max_lat: 38.70,
    }
}

/// A 1 x 1 degree box in central California.
pub fn sierra_aoi() -> BoundingBox {
    BoundingBox {
        min_lon: -120.0,
        min_lat: 37.0,
        max_lon: -119.0,
        max_lat: 38.0,
    }
}

/// Fixed "now" used by tests that anchor a lookback window.
pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 31, 12, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("valid fixture timestamp"))
}

/// A scene `days_ago` days before [`reference_time`] with all three bands.
pub fn scene(id: &str, days_ago: i64, cloud_cover_pct: f64) -> SceneReference {
    let assets: HashMap<BandId, String> = BandId::ALL
        .iter()
        .map(|band| (*band, format!("mem://{}/{}", id, band)))
        .collect();

    SceneReference::new(
        id,
        reference_time() - chrono::Duration::days(days_ago),
        cloud_cover_pct,
        assets,
    )
    .with_collection("sentinel-2-l2a")
}

/// Hot, dry and windy afternoon conditions.
pub fn fire_weather() -> WeatherSnapshot {
    WeatherSnapshot::new(35.0, 40.0, 15.0, reference_time())
}

/// Cool, humid and calm conditions.
pub fn mild_weather() -> WeatherSnapshot {
    WeatherSnapshot::new(12.0, 5.0, 85.0, reference_time())
}
