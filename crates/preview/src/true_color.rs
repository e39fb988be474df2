//! True-colour previews from the red, green and blue bands.

use rayon::prelude::*;
use risk_common::RasterGrid;
use serde::{Deserialize, Serialize};

use crate::error::{PreviewError, Result};

/// Linear reflectance stretch for true-colour previews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrueColorStretch {
    /// Reflectance mapped to full brightness; brighter pixels clip.
    /// Sentinel-2 land surfaces rarely exceed 3000.
    #[serde(default = "default_max_reflectance")]
    pub max_reflectance: f32,
}

fn default_max_reflectance() -> f32 {
    3000.0
}

impl Default for TrueColorStretch {
    fn default() -> Self {
        Self {
            max_reflectance: default_max_reflectance(),
        }
    }
}

impl TrueColorStretch {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.max_reflectance.is_finite() || self.max_reflectance <= 0.0 {
            return Err(format!(
                "preview.true_color.max_reflectance must be > 0, got {}",
                self.max_reflectance
            ));
        }
        Ok(())
    }

    #[inline]
    fn channel(&self, value: f32) -> u8 {
        (value.clamp(0.0, self.max_reflectance) / self.max_reflectance * 255.0) as u8
    }

    /// Compose aligned red, green and blue grids into RGBA bytes.
    ///
    /// A pixel that is no-data in any band is fully transparent.
    pub fn compose(&self, red: &RasterGrid, green: &RasterGrid, blue: &RasterGrid) -> Result<Vec<u8>> {
        for (name, other) in [("green", green), ("blue", blue)] {
            if !red.same_geometry(other) {
                return Err(PreviewError::GeometryMismatch(format!(
                    "red is {}x{}, {} is {}x{} or has a different geotransform",
                    red.width(),
                    red.height(),
                    name,
                    other.width(),
                    other.height()
                )));
            }
        }

        let mut pixels = vec![0u8; red.len() * 4];
        pixels
            .par_chunks_exact_mut(4)
            .zip(red.data().par_iter())
            .zip(green.data().par_iter().zip(blue.data().par_iter()))
            .for_each(|((px, &r), (&g, &b))| {
                if red.is_nodata(r) || green.is_nodata(g) || blue.is_nodata(b) {
                    return;
                }
                px.copy_from_slice(&[self.channel(r), self.channel(g), self.channel(b), 255]);
            });
        Ok(pixels)
    }
}
