//! NDVI overlay colouring.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Three-class NDVI colour ramp.
///
/// Masked pixels are always fully transparent; every other pixel gets one
/// of three colours at the same alpha.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPalette {
    /// NDVI below zero: water, bare rock, burn scars
    #[serde(default = "default_negative")]
    pub negative: [u8; 3],

    /// NDVI from zero up to `dense_threshold`
    #[serde(default = "default_sparse")]
    pub sparse: [u8; 3],

    /// NDVI at or above `dense_threshold`
    #[serde(default = "default_dense")]
    pub dense: [u8; 3],

    #[serde(default = "default_dense_threshold")]
    pub dense_threshold: f32,

    /// Opacity of coloured pixels
    #[serde(default = "default_alpha")]
    pub alpha: u8,
}

fn default_negative() -> [u8; 3] {
    [215, 48, 39]
}

fn default_sparse() -> [u8; 3] {
    [253, 231, 37]
}

fn default_dense() -> [u8; 3] {
    [26, 152, 80]
}

fn default_dense_threshold() -> f32 {
    0.5
}

fn default_alpha() -> u8 {
    160
}

impl Default for OverlayPalette {
    fn default() -> Self {
        Self {
            negative: default_negative(),
            sparse: default_sparse(),
            dense: default_dense(),
            dense_threshold: default_dense_threshold(),
            alpha: default_alpha(),
        }
    }
}

impl OverlayPalette {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.dense_threshold) {
            return Err(format!(
                "preview.palette.dense_threshold must be within 0..=1, got {}",
                self.dense_threshold
            ));
        }
        Ok(())
    }

    /// RGBA colour for one pixel; `None` is masked.
    #[inline]
    pub fn color(&self, ndvi: Option<f32>) -> [u8; 4] {
        let rgb = match ndvi {
            None => return [0, 0, 0, 0],
            Some(v) if v < 0.0 => self.negative,
            Some(v) if v < self.dense_threshold => self.sparse,
            Some(_) => self.dense,
        };
        [rgb[0], rgb[1], rgb[2], self.alpha]
    }

    /// Colour a whole grid of index values into RGBA bytes.
    pub fn colorize(&self, values: &[Option<f32>]) -> Vec<u8> {
        let mut pixels = vec![0u8; values.len() * 4];
        pixels
            .par_chunks_exact_mut(4)
            .zip(values.par_iter())
            .for_each(|(px, v)| px.copy_from_slice(&self.color(*v)));
        pixels
    }
}
