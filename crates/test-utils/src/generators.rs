//! Synthetic band generators.
//!
//! All grids cover the given bbox exactly, row-major with the north row
//! first, so bands generated over the same bbox and size are aligned.

use risk_common::{BoundingBox, RasterGrid};

/// Sentinel-2 SCL code for vegetation.
pub const SCL_VEGETATION: f32 = 4.0;
/// Sentinel-2 SCL code for bare soil.
pub const SCL_BARE_SOIL: f32 = 5.0;
/// Sentinel-2 SCL code for water.
pub const SCL_WATER: f32 = 6.0;
/// Sentinel-2 SCL code for high-probability cloud.
pub const SCL_CLOUD_HIGH: f32 = 9.0;

/// Creates a band from explicit values.
///
/// # Panics
///
/// If `values.len() != width * height`.
pub fn band(values: Vec<f32>, width: usize, height: usize, bbox: &BoundingBox) -> RasterGrid {
    RasterGrid::from_bbox(values, width, height, bbox, None)
        .unwrap_or_else(|e| panic!("invalid test band: {}", e))
}

/// Creates a band holding the same value everywhere.
pub fn uniform_band(value: f32, width: usize, height: usize, bbox: &BoundingBox) -> RasterGrid {
    band(vec![value; width * height], width, height, bbox)
}

/// Creates a classification band with a single class everywhere.
pub fn uniform_mask(code: f32, width: usize, height: usize, bbox: &BoundingBox) -> RasterGrid {
    uniform_band(code, width, height, bbox)
}

/// Creates red, near-infrared and vegetation-mask bands whose NDVI is
/// `ndvi` at every pixel.
///
/// Uses `red = 1 - ndvi`, `nir = 1 + ndvi`, so `(nir - red) / (nir + red)`
/// is `ndvi` up to f32 rounding.
pub fn bands_with_ndvi(
    ndvi: f32,
    width: usize,
    height: usize,
    bbox: &BoundingBox,
) -> (RasterGrid, RasterGrid, RasterGrid) {
    (
        uniform_band(1.0 - ndvi, width, height, bbox),
        uniform_band(1.0 + ndvi, width, height, bbox),
        uniform_mask(SCL_VEGETATION, width, height, bbox),
    )
}

/// Creates a near-infrared band with an NDVI gradient from `-1` in the
/// west column to `+1` in the east column, paired with a constant red band.
///
/// Returns `(red, nir)`.
pub fn ndvi_gradient_bands(
    width: usize,
    height: usize,
    bbox: &BoundingBox,
) -> (RasterGrid, RasterGrid) {
    let red = uniform_band(1.0, width, height, bbox);
    let last = width.saturating_sub(1).max(1) as f32;

    let mut nir = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            // ndvi = (n - 1) / (n + 1)  =>  n = (1 + ndvi) / (1 - ndvi)
            let ndvi = -0.99 + 1.98 * col as f32 / last;
            nir.push((1.0 + ndvi) / (1.0 - ndvi));
        }
    }

    (red, band(nir, width, height, bbox))
}

/// Creates a classification band alternating `a` and `b` in a checkerboard.
pub fn checkerboard_mask(
    a: f32,
    b: f32,
    width: usize,
    height: usize,
    bbox: &BoundingBox,
) -> RasterGrid {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(if (row + col) % 2 == 0 { a } else { b });
        }
    }
    band(data, width, height, bbox)
}
