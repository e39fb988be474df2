//! Satellite scene references and acquisition windows.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The bands the pipeline reads from a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandId {
    Red,
    Nir,
    /// Scene classification / cloud-water mask layer.
    Mask,
    Green,
    Blue,
}

impl BandId {
    pub const ALL: [BandId; 5] = [
        BandId::Red,
        BandId::Nir,
        BandId::Mask,
        BandId::Green,
        BandId::Blue,
    ];

    /// Bands every assessment reads.
    pub const REQUIRED: [BandId; 3] = [BandId::Red, BandId::Nir, BandId::Mask];

    /// Bands of the true-colour preview, in RGB order.
    pub const TRUE_COLOR: [BandId; 3] = [BandId::Red, BandId::Green, BandId::Blue];

    pub fn as_str(&self) -> &'static str {
        match self {
            BandId::Red => "red",
            BandId::Nir => "nir",
            BandId::Mask => "mask",
            BandId::Green => "green",
            BandId::Blue => "blue",
        }
    }
}

impl std::fmt::Display for BandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog scene chosen for assessment.
///
/// Fields are private so a selected reference cannot be altered on its way
/// through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneReference {
    id: String,
    collection: Option<String>,
    acquired_at: DateTime<Utc>,
    cloud_cover_pct: f64,
    assets: HashMap<BandId, String>,
}

impl SceneReference {
    pub fn new(
        id: impl Into<String>,
        acquired_at: DateTime<Utc>,
        cloud_cover_pct: f64,
        assets: HashMap<BandId, String>,
    ) -> Self {
        Self {
            id: id.into(),
            collection: None,
            acquired_at,
            cloud_cover_pct,
            assets,
        }
    }

    /// Set the catalog collection the scene belongs to.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    pub fn cloud_cover_pct(&self) -> f64 {
        self.cloud_cover_pct
    }

    /// Locator (URL, asset key or path) for a band.
    pub fn asset(&self, band: BandId) -> Option<&str> {
        self.assets.get(&band).map(String::as_str)
    }

    /// Whether red, NIR and mask locators are all present.
    pub fn has_all_bands(&self) -> bool {
        BandId::REQUIRED.iter().all(|b| self.assets.contains_key(b))
    }

    /// Whether red, green and blue locators are all present.
    pub fn has_true_color(&self) -> bool {
        BandId::TRUE_COLOR.iter().all(|b| self.assets.contains_key(b))
    }
}

/// Closed acquisition window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// The `days` days leading up to and including `end`.
    pub fn lookback(end: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }

    /// RFC 3339 interval string, e.g. `2024-06-01T00:00:00Z/2024-06-30T00:00:00Z`.
    pub fn to_interval(&self) -> String {
        format!(
            "{}/{}",
            self.start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        )
    }
}
