//! STAC API catalog client.
//!
//! Scenes come from `POST {api_url}/search`; band pixels come from a crop
//! endpoint that returns a single-band GeoTIFF in EPSG:4326 for a bbox, such
//! as the Planetary Computer data API.

mod client;
pub mod models;

pub use client::StacCatalog;

use risk_common::{BandId, BoundingBox};
use serde::{Deserialize, Serialize};

/// STAC catalog configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StacConfig {
    /// STAC API root
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    /// Asset key of the red band
    #[serde(default = "default_red_asset")]
    pub red_asset: String,

    /// Asset key of the near-infrared band
    #[serde(default = "default_nir_asset")]
    pub nir_asset: String,

    /// Asset key of the scene classification layer
    #[serde(default = "default_mask_asset")]
    pub mask_asset: String,

    /// Asset key of the green band (true-colour preview only)
    #[serde(default = "default_green_asset")]
    pub green_asset: String,

    /// Asset key of the blue band (true-colour preview only)
    #[serde(default = "default_blue_asset")]
    pub blue_asset: String,

    /// Crop endpoint template. Placeholders: `{collection}`, `{item}`,
    /// `{asset}`, `{minx}`, `{miny}`, `{maxx}`, `{maxy}`, `{width}`,
    /// `{height}`.
    #[serde(default = "default_crop_url")]
    pub crop_url: String,

    /// Output pixel size in degrees. Every band is resampled to this grid,
    /// so 10 m and 20 m bands come back aligned.
    #[serde(default = "default_resolution_deg")]
    pub resolution_deg: f64,

    /// Items requested per search page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Stop paginating after this many items
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Server-side `eo:cloud_cover` ceiling sent with the search
    #[serde(default)]
    pub cloud_cover_lte: Option<f64>,

    /// Pixel value treated as no-data in decoded bands
    #[serde(default = "default_band_nodata")]
    pub band_nodata: Option<f32>,
}

fn default_api_url() -> String {
    "https://planetarycomputer.microsoft.com/api/stac/v1".to_string()
}

fn default_collection() -> String {
    "sentinel-2-l2a".to_string()
}

fn default_red_asset() -> String {
    "B04".to_string()
}

fn default_nir_asset() -> String {
    "B08".to_string()
}

fn default_mask_asset() -> String {
    "SCL".to_string()
}

fn default_green_asset() -> String {
    "B03".to_string()
}

fn default_blue_asset() -> String {
    "B02".to_string()
}

fn default_crop_url() -> String {
    "https://planetarycomputer.microsoft.com/api/data/v1/item/bbox/{minx},{miny},{maxx},{maxy}/{width}x{height}.tif?collection={collection}&item={item}&assets={asset}".to_string()
}

fn default_resolution_deg() -> f64 {
    0.0002
}

fn default_page_size() -> u32 {
    50
}

fn default_max_items() -> usize {
    200
}

fn default_band_nodata() -> Option<f32> {
    Some(0.0)
}

impl Default for StacConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            collection: default_collection(),
            red_asset: default_red_asset(),
            nir_asset: default_nir_asset(),
            mask_asset: default_mask_asset(),
            green_asset: default_green_asset(),
            blue_asset: default_blue_asset(),
            crop_url: default_crop_url(),
            resolution_deg: default_resolution_deg(),
            page_size: default_page_size(),
            max_items: default_max_items(),
            cloud_cover_lte: None,
            band_nodata: default_band_nodata(),
        }
    }
}

impl StacConfig {
    /// Asset key configured for a band.
    pub fn asset_key(&self, band: BandId) -> &str {
        match band {
            BandId::Red => &self.red_asset,
            BandId::Nir => &self.nir_asset,
            BandId::Mask => &self.mask_asset,
            BandId::Green => &self.green_asset,
            BandId::Blue => &self.blue_asset,
        }
    }

    /// Output grid size for a crop over `bbox` at `resolution_deg`.
    pub fn crop_dimensions(&self, bbox: &BoundingBox) -> (usize, usize) {
        let pixels = |extent: f64| (extent / self.resolution_deg).round().max(1.0) as usize;
        (pixels(bbox.width()), pixels(bbox.height()))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.is_empty() {
            return Err("catalog.api_url must not be empty".to_string());
        }
        for placeholder in ["{minx}", "{miny}", "{maxx}", "{maxy}", "{width}", "{height}"] {
            if !self.crop_url.contains(placeholder) {
                return Err(format!(
                    "catalog.crop_url must contain the {} placeholder",
                    placeholder
                ));
            }
        }
        if !self.resolution_deg.is_finite() || self.resolution_deg <= 0.0 {
            return Err(format!(
                "catalog.resolution_deg must be > 0, got {}",
                self.resolution_deg
            ));
        }
        if self.page_size == 0 {
            return Err("catalog.page_size must be > 0".to_string());
        }
        if self.max_items == 0 {
            return Err("catalog.max_items must be > 0".to_string());
        }
        if let Some(lte) = self.cloud_cover_lte {
            if !(0.0..=100.0).contains(&lte) {
                return Err(format!(
                    "catalog.cloud_cover_lte must be within 0..=100, got {}",
                    lte
                ));
            }
        }
        Ok(())
    }
}
