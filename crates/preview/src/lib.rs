//! Assessment previews.
//!
//! Renders a masked vegetation index grid as a translucent red/yellow/green
//! PNG, and the red, green and blue bands as a true-colour PNG. Both are
//! sized one image pixel per raster pixel and base64-encoded together with
//! the geographic bounds they cover.

pub mod error;
pub mod overlay;
pub mod png;
pub mod true_color;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use risk_common::{BoundingBox, PreviewImage, RasterGrid};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vegetation::VegetationIndexResult;

pub use error::{PreviewError, Result};
pub use overlay::OverlayPalette;
pub use png::encode_rgba;
pub use true_color::TrueColorStretch;

/// Preview configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Render previews for requests that do not say otherwise
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub palette: OverlayPalette,

    #[serde(default)]
    pub true_color: TrueColorStretch,
}

fn default_enabled() -> bool {
    true
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            palette: OverlayPalette::default(),
            true_color: TrueColorStretch::default(),
        }
    }
}

impl PreviewConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.palette.validate()?;
        self.true_color.validate()
    }
}

/// Renders vegetation index results and scene bands to preview images.
#[derive(Debug, Clone, Default)]
pub struct PreviewRenderer {
    palette: OverlayPalette,
    stretch: TrueColorStretch,
}

impl PreviewRenderer {
    pub fn new(palette: OverlayPalette) -> Self {
        Self {
            palette,
            stretch: TrueColorStretch::default(),
        }
    }

    pub fn from_config(config: &PreviewConfig) -> Self {
        Self {
            palette: config.palette.clone(),
            stretch: config.true_color.clone(),
        }
    }

    /// Render `index` as a base64 PNG overlay.
    pub fn render(&self, index: &VegetationIndexResult) -> Result<PreviewImage> {
        let (width, height) = (index.width(), index.height());
        let pixels = self.palette.colorize(index.values());
        let png = encode_rgba(&pixels, width, height)?;

        debug!(width, height, bytes = png.len(), "Rendered NDVI preview");

        Ok(image(&png, width, height, &index.extent()))
    }

    /// Render aligned red, green and blue grids as a base64 PNG.
    pub fn render_true_color(
        &self,
        red: &RasterGrid,
        green: &RasterGrid,
        blue: &RasterGrid,
    ) -> Result<PreviewImage> {
        let (width, height) = (red.width(), red.height());
        let pixels = self.stretch.compose(red, green, blue)?;
        let png = encode_rgba(&pixels, width, height)?;

        debug!(width, height, bytes = png.len(), "Rendered true-colour preview");

        Ok(image(&png, width, height, &red.extent()))
    }
}

fn image(png: &[u8], width: usize, height: usize, extent: &BoundingBox) -> PreviewImage {
    PreviewImage {
        media_type: "image/png".to_string(),
        data_base64: BASE64.encode(png),
        width: width as u32,
        height: height as u32,
        bounds: PreviewImage::bounds_from(extent),
    }
}
