//! Least-cloudy recent scene selection.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use risk_common::{BoundingBox, DateRange, RetryPolicy, SceneReference};
use tracing::{debug, info, instrument, warn};

use crate::catalog::ImageryCatalog;
use crate::error::{CatalogError, Result};

/// Chooses the scene an assessment is computed from.
pub struct SceneSelector {
    catalog: Arc<dyn ImageryCatalog>,
    retry: RetryPolicy,
}

impl SceneSelector {
    pub fn new(catalog: Arc<dyn ImageryCatalog>, retry: RetryPolicy) -> Self {
        Self { catalog, retry }
    }

    /// Select the best scene acquired in the `lookback_days` before now.
    pub async fn select_scene(
        &self,
        bbox: &BoundingBox,
        max_cloud_pct: f64,
        lookback_days: u32,
    ) -> Result<SceneReference> {
        self.select_scene_until(bbox, max_cloud_pct, lookback_days, Utc::now())
            .await
    }

    /// Select the best scene acquired in the `lookback_days` before `end`.
    ///
    /// # Arguments
    /// * `bbox` - Area of interest
    /// * `max_cloud_pct` - Cloud cover ceiling, inclusive
    /// * `lookback_days` - Window length, at least 1
    /// * `end` - Window end
    ///
    /// # Returns
    /// The most recent qualifying scene, or `NotFound`.
    #[instrument(skip(self, bbox), fields(catalog = %self.catalog.name(), bbox = %bbox))]
    pub async fn select_scene_until(
        &self,
        bbox: &BoundingBox,
        max_cloud_pct: f64,
        lookback_days: u32,
        end: DateTime<Utc>,
    ) -> Result<SceneReference> {
        validate_selection(max_cloud_pct, lookback_days)?;

        let range = DateRange::lookback(end, lookback_days);
        let (catalog, window) = (&self.catalog, &range);
        let candidates = self
            .retry
            .run("catalog search", move || catalog.search(bbox, window))
            .await?;

        debug!(candidates = candidates.len(), "Catalog search returned");

        let scene = pick_best(candidates, max_cloud_pct, &range).ok_or_else(|| {
            CatalogError::NotFound(format!(
                "no scene over {} with cloud cover <= {}% in {}",
                bbox,
                max_cloud_pct,
                range.to_interval()
            ))
        })?;

        info!(
            scene_id = %scene.id(),
            acquired_at = %scene.acquired_at(),
            cloud_cover_pct = scene.cloud_cover_pct(),
            "Selected scene"
        );

        Ok(scene)
    }
}

fn validate_selection(max_cloud_pct: f64, lookback_days: u32) -> Result<()> {
    if !(0.0..=100.0).contains(&max_cloud_pct) {
        return Err(CatalogError::InvalidRequest(format!(
            "max_cloud_pct must be within 0..=100, got {}",
            max_cloud_pct
        )));
    }
    if lookback_days == 0 {
        return Err(CatalogError::InvalidRequest(
            "lookback_days must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Pick the winning scene from catalog candidates.
///
/// Candidates outside `range`, above `max_cloud_pct` or missing a band are
/// dropped. The rest are ranked by acquisition time (newest first), then
/// cloud cover (lowest first), then id (lexicographically smallest first).
pub fn pick_best(
    candidates: Vec<SceneReference>,
    max_cloud_pct: f64,
    range: &DateRange,
) -> Option<SceneReference> {
    candidates
        .into_iter()
        .filter(|scene| range.contains(scene.acquired_at()))
        .filter(|scene| scene.cloud_cover_pct() <= max_cloud_pct)
        .filter(|scene| {
            let complete = scene.has_all_bands();
            if !complete {
                warn!(scene_id = %scene.id(), "Skipping scene without all required bands");
            }
            complete
        })
        .min_by(rank)
}

/// `Less` means `a` is preferred over `b`.
fn rank(a: &SceneReference, b: &SceneReference) -> Ordering {
    b.acquired_at()
        .cmp(&a.acquired_at())
        .then_with(|| a.cloud_cover_pct().total_cmp(&b.cloud_cover_pct()))
        .then_with(|| a.id().cmp(b.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use risk_common::BandId;
    use std::collections::HashMap;

    fn scene(id: &str, day: u32, cloud: f64) -> SceneReference {
        let assets: HashMap<BandId, String> = BandId::ALL
            .iter()
            .map(|b| (*b, format!("{}/{}.tif", id, b)))
            .collect();
        SceneReference::new(
            id,
            Utc.with_ymd_and_hms(2024, 7, day, 10, 30, 0).unwrap(),
            cloud,
            assets,
        )
    }

    fn july() -> DateRange {
        DateRange::lookback(Utc.with_ymd_and_hms(2024, 7, 31, 0, 0, 0).unwrap(), 30)
    }

    #[test]
    fn test_most_recent_wins() {
        let best = pick_best(
            vec![scene("a", 3, 1.0), scene("b", 20, 15.0), scene("c", 10, 0.0)],
            25.0,
            &july(),
        )
        .unwrap();
        assert_eq!(best.id(), "b");
    }

    #[test]
    fn test_cloud_threshold_is_inclusive() {
        let best = pick_best(
            vec![scene("exact", 20, 25.0), scene("over", 21, 25.1)],
            25.0,
            &july(),
        )
        .unwrap();
        assert_eq!(best.id(), "exact");
    }

    #[test]
    fn test_tie_breaks_on_cloud_then_id() {
        let best = pick_best(
            vec![scene("b", 20, 5.0), scene("c", 20, 2.0), scene("a", 20, 2.0)],
            25.0,
            &july(),
        )
        .unwrap();
        assert_eq!(best.id(), "a");
    }

    #[test]
    fn test_out_of_window_and_incomplete_scenes_are_skipped() {
        let partial = SceneReference::new(
            "partial",
            Utc.with_ymd_and_hms(2024, 7, 25, 0, 0, 0).unwrap(),
            0.0,
            HashMap::from([(BandId::Red, "partial/red.tif".to_string())]),
        );
        let old = SceneReference::new(
            "old",
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            0.0,
            BandId::ALL
                .iter()
                .map(|b| (*b, format!("old/{}.tif", b)))
                .collect(),
        );

        assert!(pick_best(vec![partial, old], 25.0, &july()).is_none());
    }

    #[test]
    fn test_validate_selection() {
        assert!(validate_selection(25.0, 30).is_ok());
        assert!(matches!(
            validate_selection(101.0, 30),
            Err(CatalogError::InvalidRequest(_))
        ));
        assert!(matches!(
            validate_selection(f64::NAN, 30),
            Err(CatalogError::InvalidRequest(_))
        ));
        assert!(matches!(
            validate_selection(25.0, 0),
            Err(CatalogError::InvalidRequest(_))
        ));
    }
}
