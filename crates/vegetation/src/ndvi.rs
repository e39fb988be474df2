//! NDVI computation and masked reduction.
//!
//! The index is computed elementwise over the flat row-major grids, then
//! reduced over the pixels that survived masking. Both passes run on rayon.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use risk_common::{BoundingBox, GeoTransform, RasterGrid};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, VegetationError};
use crate::mask::{MaskClasses, MaskReason};

/// Whether the reduction produced a usable vegetation scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    Valid,
    /// No pixel survived masking; there is no mean.
    Inconclusive,
}

/// Number of pixels excluded per reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskedCounts {
    pub no_data: usize,
    pub invalid_reflectance: usize,
    pub water: usize,
    pub urban: usize,
    pub cloud: usize,
    pub cloud_shadow: usize,
    pub snow: usize,
    pub defective: usize,
}

impl MaskedCounts {
    fn record(&mut self, reason: MaskReason) {
        let slot = match reason {
            MaskReason::NoData => &mut self.no_data,
            MaskReason::InvalidReflectance => &mut self.invalid_reflectance,
            MaskReason::Water => &mut self.water,
            MaskReason::Urban => &mut self.urban,
            MaskReason::Cloud => &mut self.cloud,
            MaskReason::CloudShadow => &mut self.cloud_shadow,
            MaskReason::Snow => &mut self.snow,
            MaskReason::Defective => &mut self.defective,
        };
        *slot += 1;
    }

    fn merge(self, other: MaskedCounts) -> MaskedCounts {
        MaskedCounts {
            no_data: self.no_data + other.no_data,
            invalid_reflectance: self.invalid_reflectance + other.invalid_reflectance,
            water: self.water + other.water,
            urban: self.urban + other.urban,
            cloud: self.cloud + other.cloud,
            cloud_shadow: self.cloud_shadow + other.cloud_shadow,
            snow: self.snow + other.snow,
            defective: self.defective + other.defective,
        }
    }

    /// Total masked pixels across all reasons.
    pub fn total(&self) -> usize {
        self.no_data
            + self.invalid_reflectance
            + self.water
            + self.urban
            + self.cloud
            + self.cloud_shadow
            + self.snow
            + self.defective
    }
}

/// Aggregate statistics over unmasked pixels.
///
/// `mean`, `min`, `max` and `std_dev` are `None` when no pixel is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VegetationStats {
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub std_dev: Option<f64>,
    pub valid_fraction: f64,
    pub valid_pixels: usize,
    pub total_pixels: usize,
    pub masked: MaskedCounts,
}

/// Masked per-pixel index plus its statistics.
#[derive(Debug, Clone)]
pub struct VegetationIndexResult {
    values: Vec<Option<f32>>,
    width: usize,
    height: usize,
    transform: GeoTransform,
    stats: VegetationStats,
    status: IndexStatus,
}

impl VegetationIndexResult {
    /// Row-major index values; masked pixels are `None`.
    pub fn values(&self) -> &[Option<f32>] {
        &self.values
    }

    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.values[row * self.width + col]
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Geographic extent of the index grid.
    pub fn extent(&self) -> BoundingBox {
        let (west, north) = (self.transform.origin_x, self.transform.origin_y);
        let east = west + self.transform.pixel_width * self.width as f64;
        let south = north + self.transform.pixel_height * self.height as f64;
        BoundingBox {
            min_lon: west.min(east),
            min_lat: south.min(north),
            max_lon: west.max(east),
            max_lat: south.max(north),
        }
    }

    pub fn stats(&self) -> &VegetationStats {
        &self.stats
    }

    pub fn status(&self) -> IndexStatus {
        self.status
    }

    pub fn is_inconclusive(&self) -> bool {
        self.status == IndexStatus::Inconclusive
    }

    /// Mean index over valid pixels.
    pub fn mean(&self) -> Option<f64> {
        self.stats.mean
    }
}

/// Running sums for the masked reduce.
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: usize,
    sum: f64,
    sum_sq: f64,
    min: f64,
    max: f64,
    masked: MaskedCounts,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sum_sq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            masked: MaskedCounts::default(),
        }
    }
}

impl Accumulator {
    fn push(mut self, outcome: &std::result::Result<f32, MaskReason>) -> Self {
        match outcome {
            Ok(v) => {
                let v = *v as f64;
                self.count += 1;
                self.sum += v;
                self.sum_sq += v * v;
                self.min = self.min.min(v);
                self.max = self.max.max(v);
            }
            Err(reason) => self.masked.record(*reason),
        }
        self
    }

    fn merge(self, other: Accumulator) -> Self {
        Self {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            sum_sq: self.sum_sq + other.sum_sq,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            masked: self.masked.merge(other.masked),
        }
    }

    fn finish(self, total_pixels: usize) -> VegetationStats {
        let valid_fraction = if total_pixels == 0 {
            0.0
        } else {
            self.count as f64 / total_pixels as f64
        };

        if self.count == 0 {
            return VegetationStats {
                mean: None,
                min: None,
                max: None,
                std_dev: None,
                valid_fraction,
                valid_pixels: 0,
                total_pixels,
                masked: self.masked,
            };
        }

        let n = self.count as f64;
        let mean = self.sum / n;
        let variance = (self.sum_sq / n - mean * mean).max(0.0);

        VegetationStats {
            mean: Some(mean.clamp(-1.0, 1.0)),
            min: Some(self.min),
            max: Some(self.max),
            std_dev: Some(variance.sqrt()),
            valid_fraction,
            valid_pixels: self.count,
            total_pixels,
            masked: self.masked,
        }
    }
}

/// Rows per unit of parallel work; the abort flag is checked between units.
const ROWS_PER_CHUNK: usize = 64;

/// Computes NDVI from red and near-infrared reflectance with class masking.
#[derive(Debug, Clone, Default)]
pub struct VegetationIndexEngine {
    classes: MaskClasses,
}

impl VegetationIndexEngine {
    pub fn new(classes: MaskClasses) -> Self {
        Self { classes }
    }

    pub fn classes(&self) -> &MaskClasses {
        &self.classes
    }

    /// Compute the masked NDVI grid and its statistics.
    ///
    /// # Arguments
    /// * `red` - Red reflectance
    /// * `nir` - Near-infrared reflectance
    /// * `mask` - Scene classification codes
    ///
    /// # Returns
    /// The index result, flagged `Inconclusive` when no pixel is valid, or
    /// `GeometryMismatch` / `EmptyRegion` for unusable inputs.
    pub fn compute_index(
        &self,
        red: &RasterGrid,
        nir: &RasterGrid,
        mask: &RasterGrid,
    ) -> Result<VegetationIndexResult> {
        self.compute_index_cancellable(red, nir, mask, &AtomicBool::new(false))
    }

    /// [`compute_index`](Self::compute_index) that stops with `Cancelled`
    /// once `abort` is set.
    pub fn compute_index_cancellable(
        &self,
        red: &RasterGrid,
        nir: &RasterGrid,
        mask: &RasterGrid,
        abort: &AtomicBool,
    ) -> Result<VegetationIndexResult> {
        for (name, other) in [("nir", nir), ("mask", mask)] {
            if !red.same_geometry(other) {
                return Err(VegetationError::GeometryMismatch(format!(
                    "red is {}x{}, {} is {}x{} or has a different geotransform",
                    red.width(),
                    red.height(),
                    name,
                    other.width(),
                    other.height()
                )));
            }
        }
        if red.is_empty() {
            return Err(VegetationError::EmptyRegion);
        }

        let chunk = red.width() * ROWS_PER_CHUNK;
        let rows: Vec<Vec<std::result::Result<f32, MaskReason>>> = red
            .data()
            .par_chunks(chunk)
            .zip(nir.data().par_chunks(chunk))
            .zip(mask.data().par_chunks(chunk))
            .map(|((r, n), m)| {
                if abort.load(Ordering::Relaxed) {
                    return Err(VegetationError::Cancelled);
                }
                Ok(r.iter()
                    .zip(n)
                    .zip(m)
                    .map(|((&r, &n), &m)| self.pixel(red, nir, mask, r, n, m))
                    .collect::<Vec<_>>())
            })
            .collect::<Result<_>>()?;
        let outcomes: Vec<_> = rows.into_iter().flatten().collect();

        let stats = outcomes
            .par_iter()
            .fold(Accumulator::default, Accumulator::push)
            .reduce(Accumulator::default, Accumulator::merge)
            .finish(outcomes.len());

        let status = if stats.valid_pixels == 0 {
            IndexStatus::Inconclusive
        } else {
            IndexStatus::Valid
        };

        debug!(
            width = red.width(),
            height = red.height(),
            valid_pixels = stats.valid_pixels,
            valid_fraction = stats.valid_fraction,
            mean = ?stats.mean,
            status = ?status,
            "Computed vegetation index"
        );

        Ok(VegetationIndexResult {
            values: outcomes.into_iter().map(|o| o.ok()).collect(),
            width: red.width(),
            height: red.height(),
            transform: *red.transform(),
            stats,
            status,
        })
    }

    fn pixel(
        &self,
        red: &RasterGrid,
        nir: &RasterGrid,
        mask: &RasterGrid,
        r: f32,
        n: f32,
        m: f32,
    ) -> std::result::Result<f32, MaskReason> {
        if red.is_nodata(r) || nir.is_nodata(n) || mask.is_nodata(m) {
            return Err(MaskReason::NoData);
        }
        if let Some(reason) = self.classes.classify(m) {
            return Err(reason);
        }
        if !r.is_finite() || !n.is_finite() {
            return Err(MaskReason::InvalidReflectance);
        }

        let (r, n) = (r as f64, n as f64);
        let sum = n + r;
        if sum == 0.0 {
            return Err(MaskReason::InvalidReflectance);
        }
        let ndvi = (n - r) / sum;
        if !ndvi.is_finite() {
            return Err(MaskReason::InvalidReflectance);
        }
        Ok(ndvi.clamp(-1.0, 1.0) as f32)
    }
}
