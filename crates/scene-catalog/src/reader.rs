//! Reads the red, near-infrared and mask bands of a scene as aligned grids.

use std::sync::Arc;

use risk_common::{BandId, BoundingBox, RasterGrid, RetryPolicy, SceneReference};
use tracing::{debug, instrument};

use crate::catalog::ImageryCatalog;
use crate::error::{CatalogError, Result};

/// The three bands an index is computed from, clipped to the request bbox.
///
/// All three share shape and geotransform.
#[derive(Debug, Clone)]
pub struct BandSet {
    pub red: RasterGrid,
    pub nir: RasterGrid,
    pub mask: RasterGrid,
}

/// Visible bands for a true-colour image, on the same grid as [`BandSet`].
#[derive(Debug, Clone)]
pub struct VisibleBands {
    pub green: RasterGrid,
    pub blue: RasterGrid,
}

pub struct BandReader {
    catalog: Arc<dyn ImageryCatalog>,
    retry: RetryPolicy,
}

impl BandReader {
    pub fn new(catalog: Arc<dyn ImageryCatalog>, retry: RetryPolicy) -> Self {
        Self { catalog, retry }
    }

    /// Fetch all three bands concurrently and clip them to `bbox`.
    ///
    /// Fails with `EmptyRegion` when a band has no pixel center inside the
    /// box and with `GeometryMismatch` when the clipped grids disagree.
    #[instrument(skip(self, scene, bbox), fields(scene_id = %scene.id(), bbox = %bbox))]
    pub async fn read_bands(&self, scene: &SceneReference, bbox: &BoundingBox) -> Result<BandSet> {
        let (red, nir, mask) = futures::try_join!(
            self.fetch(scene, BandId::Red, bbox),
            self.fetch(scene, BandId::Nir, bbox),
            self.fetch(scene, BandId::Mask, bbox),
        )?;

        let red = clip(red, BandId::Red, bbox)?;
        let nir = clip(nir, BandId::Nir, bbox)?;
        let mask = clip(mask, BandId::Mask, bbox)?;

        for (band, grid) in [(BandId::Nir, &nir), (BandId::Mask, &mask)] {
            if !red.same_geometry(grid) {
                return Err(CatalogError::GeometryMismatch(format!(
                    "{} band is {}x{} at {:?}, red band is {}x{} at {:?}",
                    band,
                    grid.width(),
                    grid.height(),
                    grid.transform(),
                    red.width(),
                    red.height(),
                    red.transform()
                )));
            }
        }

        debug!(
            width = red.width(),
            height = red.height(),
            "Read scene bands"
        );

        Ok(BandSet { red, nir, mask })
    }

    /// Fetch the green and blue bands concurrently and clip them to `bbox`.
    ///
    /// Fails with `MissingAsset` when the scene carries neither.
    #[instrument(skip(self, scene, bbox), fields(scene_id = %scene.id(), bbox = %bbox))]
    pub async fn read_visible(
        &self,
        scene: &SceneReference,
        bbox: &BoundingBox,
    ) -> Result<VisibleBands> {
        let (green, blue) = futures::try_join!(
            self.fetch(scene, BandId::Green, bbox),
            self.fetch(scene, BandId::Blue, bbox),
        )?;

        let green = clip(green, BandId::Green, bbox)?;
        let blue = clip(blue, BandId::Blue, bbox)?;
        if !green.same_geometry(&blue) {
            return Err(CatalogError::GeometryMismatch(format!(
                "blue band is {}x{}, green band is {}x{}",
                blue.width(),
                blue.height(),
                green.width(),
                green.height()
            )));
        }

        Ok(VisibleBands { green, blue })
    }

    async fn fetch(
        &self,
        scene: &SceneReference,
        band: BandId,
        bbox: &BoundingBox,
    ) -> Result<RasterGrid> {
        if scene.asset(band).is_none() {
            return Err(CatalogError::MissingAsset {
                scene: scene.id().to_string(),
                band,
            });
        }

        let catalog = &self.catalog;
        let operation = format!("fetch {} band", band);
        self.retry
            .run(&operation, move || catalog.fetch_band(scene, band, bbox))
            .await
    }
}

fn clip(grid: RasterGrid, band: BandId, bbox: &BoundingBox) -> Result<RasterGrid> {
    grid.clip(bbox).ok_or_else(|| {
        CatalogError::EmptyRegion(format!(
            "{} band covering {} has no pixels inside {}",
            band,
            grid.extent(),
            bbox
        ))
    })
}
