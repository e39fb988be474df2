//! Georeferenced raster grids.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{RiskError, RiskResult};

/// Tolerance used when comparing geotransform coefficients.
const TRANSFORM_EPSILON: f64 = 1e-9;

/// North-up affine transform between pixel and geographic coordinates.
///
/// ```text
/// lon = origin_x + col * pixel_width
/// lat = origin_y + row * pixel_height
/// ```
///
/// `pixel_height` is negative for the usual top-down row order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// Longitude of the upper-left corner
    pub origin_x: f64,
    /// Latitude of the upper-left corner
    pub origin_y: f64,
    /// Cell size in X
    pub pixel_width: f64,
    /// Cell size in Y, usually negative
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Transform that stretches `width` x `height` pixels over `bbox`.
    pub fn from_bbox(bbox: &BoundingBox, width: usize, height: usize) -> Self {
        Self {
            origin_x: bbox.min_lon,
            origin_y: bbox.max_lat,
            pixel_width: bbox.width() / width.max(1) as f64,
            pixel_height: -bbox.height() / height.max(1) as f64,
        }
    }

    /// Geographic coordinates of a pixel center.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Transform for a window starting at `(col, row)` of this one.
    pub fn offset(&self, col: usize, row: usize) -> Self {
        Self {
            origin_x: self.origin_x + col as f64 * self.pixel_width,
            origin_y: self.origin_y + row as f64 * self.pixel_height,
            ..*self
        }
    }

    /// Coefficient-wise equality within a small tolerance.
    pub fn approx_eq(&self, other: &GeoTransform) -> bool {
        (self.origin_x - other.origin_x).abs() <= TRANSFORM_EPSILON
            && (self.origin_y - other.origin_y).abs() <= TRANSFORM_EPSILON
            && (self.pixel_width - other.pixel_width).abs() <= TRANSFORM_EPSILON
            && (self.pixel_height - other.pixel_height).abs() <= TRANSFORM_EPSILON
    }
}

/// A single band of raster values over a georeferenced pixel grid.
///
/// Values are row-major, top row first. A grid is never modified once built;
/// clipping and index computation produce new values.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    data: Vec<f32>,
    width: usize,
    height: usize,
    transform: GeoTransform,
    nodata: Option<f32>,
}

impl RasterGrid {
    /// Create a grid, checking that `data` holds exactly `width * height` values.
    pub fn new(
        data: Vec<f32>,
        width: usize,
        height: usize,
        transform: GeoTransform,
        nodata: Option<f32>,
    ) -> RiskResult<Self> {
        if data.len() != width * height {
            return Err(RiskError::GeometryMismatch(format!(
                "raster holds {} values but is declared {}x{}",
                data.len(),
                width,
                height
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            transform,
            nodata,
        })
    }

    /// Create a grid whose pixels exactly cover `bbox`.
    pub fn from_bbox(
        data: Vec<f32>,
        width: usize,
        height: usize,
        bbox: &BoundingBox,
        nodata: Option<f32>,
    ) -> RiskResult<Self> {
        Self::new(
            data,
            width,
            height,
            GeoTransform::from_bbox(bbox, width, height),
            nodata,
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn nodata(&self) -> Option<f32> {
        self.nodata
    }

    /// Get the value at a specific pixel.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// NaN and the declared sentinel both count as no-data.
    pub fn is_nodata(&self, value: f32) -> bool {
        value.is_nan() || self.nodata.map_or(false, |nd| value == nd)
    }

    /// Geographic extent covered by the grid.
    pub fn extent(&self) -> BoundingBox {
        let t = &self.transform;
        let x0 = t.origin_x;
        let x1 = t.origin_x + self.width as f64 * t.pixel_width;
        let y0 = t.origin_y;
        let y1 = t.origin_y + self.height as f64 * t.pixel_height;

        BoundingBox {
            min_lon: x0.min(x1),
            min_lat: y0.min(y1),
            max_lon: x0.max(x1),
            max_lat: y0.max(y1),
        }
    }

    /// Whether both grids have the same shape and geotransform.
    pub fn same_geometry(&self, other: &RasterGrid) -> bool {
        self.shape() == other.shape() && self.transform.approx_eq(&other.transform)
    }

    /// Keep only the pixels whose centers fall inside `bbox`.
    ///
    /// Returns `None` when no pixel center lies inside the box.
    pub fn clip(&self, bbox: &BoundingBox) -> Option<RasterGrid> {
        let (col_start, col_end) = pixel_span(
            bbox.min_lon,
            bbox.max_lon,
            self.transform.origin_x,
            self.transform.pixel_width,
            self.width,
        )?;
        let (row_start, row_end) = pixel_span(
            bbox.min_lat,
            bbox.max_lat,
            self.transform.origin_y,
            self.transform.pixel_height,
            self.height,
        )?;

        let width = col_end - col_start;
        let height = row_end - row_start;

        let data: Vec<f32> = (row_start..row_end)
            .flat_map(|row| {
                let start = row * self.width + col_start;
                self.data[start..start + width].iter().copied()
            })
            .collect();

        Some(RasterGrid {
            data,
            width,
            height,
            transform: self.transform.offset(col_start, row_start),
            nodata: self.nodata,
        })
    }
}

/// Half-open index range `[start, end)` of pixels along one axis whose
/// centers fall within `[lo, hi]`.
fn pixel_span(lo: f64, hi: f64, origin: f64, step: f64, len: usize) -> Option<(usize, usize)> {
    if step == 0.0 || len == 0 {
        return None;
    }

    // Center of pixel i is origin + (i + 0.5) * step. Solve for i at both
    // bounds; a negative step (rows) swaps which bound is the first index.
    let a = (lo - origin) / step - 0.5;
    let b = (hi - origin) / step - 0.5;
    let (first, last) = if a <= b { (a, b) } else { (b, a) };

    let start = first.ceil().max(0.0);
    let end = (last.floor() + 1.0).min(len as f64);

    if end <= start {
        return None;
    }

    Some((start as usize, end as usize))
}
