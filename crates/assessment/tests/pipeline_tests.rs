//! End-to-end pipeline runs against in-memory collaborators.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use assessment::{AssessmentPipeline, AssessmentRequest, ConfigError, PipelineConfig};
use risk_common::{BoundingBox, RetryPolicy, RiskError, RiskStatus};
use risk_scorer::{Confidence, InconclusivePolicy, RiskCategory};
use test_utils::{
    assert_approx_eq, bands_with_ndvi, fire_weather, lisbon_aoi, reference_time, scene, sierra_aoi,
    uniform_band, uniform_mask, FakeCatalog, FakeWeather, Fault, SCL_WATER,
};
use tokio_util::sync::CancellationToken;

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        retry: RetryPolicy {
            max_retries: 2,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            request_timeout_ms: 100,
        },
        ..PipelineConfig::default()
    }
}

/// A catalog holding one clear scene, three days old, with uniform NDVI.
fn catalog_with_ndvi(ndvi: f32) -> FakeCatalog {
    let (red, nir, mask) = bands_with_ndvi(ndvi, 8, 8, &lisbon_aoi());
    FakeCatalog::new().with_scene(scene("S2A_MSIL2A_T29SMC", 3, 5.0), red, nir, mask)
}

/// [`catalog_with_ndvi`] plus green and blue bands for a true-colour image.
fn catalog_with_visible_bands(ndvi: f32) -> FakeCatalog {
    let aoi = lisbon_aoi();
    catalog_with_ndvi(ndvi).with_visible_bands(
        "S2A_MSIL2A_T29SMC",
        uniform_band(900.0, 8, 8, &aoi),
        uniform_band(600.0, 8, 8, &aoi),
    )
}

fn request() -> AssessmentRequest {
    AssessmentRequest::new(lisbon_aoi()).with_end_date(reference_time())
}

fn pipeline(catalog: Arc<FakeCatalog>, weather: Arc<FakeWeather>) -> AssessmentPipeline {
    AssessmentPipeline::new(fast_config(), catalog, weather).unwrap()
}

// ============================================================================
// Successful runs
// ============================================================================

#[tokio::test]
async fn test_dry_sparse_vegetation_scores_extreme() {
    let catalog = Arc::new(catalog_with_visible_bands(0.1));
    let weather = Arc::new(FakeWeather::new(fire_weather()));

    let response = pipeline(catalog.clone(), weather.clone())
        .run(request(), CancellationToken::new())
        .await;

    assert_eq!(response.status, RiskStatus::Success, "{}", response.message);
    let assessment = response.assessment.expect("assessment");
    assert_approx_eq!(assessment.score, 80.33, 0.01);
    assert_eq!(assessment.category, RiskCategory::Extreme);
    assert_eq!(assessment.confidence, Confidence::Normal);
    assert_eq!(assessment.vegetation.valid_fraction, 1.0);
    assert_eq!(
        assessment.scene_timestamp,
        reference_time() - chrono::Duration::days(3)
    );
    assert!(response.message.contains("Extreme"));

    let preview = assessment.preview.expect("preview enabled by default");
    assert_eq!((preview.width, preview.height), (8, 8));
    assert_eq!(preview.media_type, "image/png");

    let true_color = assessment.true_color_preview.expect("true colour");
    assert_eq!((true_color.width, true_color.height), (8, 8));

    assert_eq!(catalog.search_calls(), 1);
    assert_eq!(catalog.fetch_calls(), 5);
    assert_eq!(weather.calls(), 1);
}

#[tokio::test]
async fn test_preview_can_be_declined() {
    let catalog = Arc::new(catalog_with_visible_bands(0.6));
    let response = pipeline(catalog.clone(), Arc::new(FakeWeather::new(fire_weather())))
        .run(request().with_preview(false), CancellationToken::new())
        .await;

    let assessment = response.assessment.expect("assessment");
    assert!(assessment.preview.is_none());
    assert!(assessment.true_color_preview.is_none());
    assert_eq!(catalog.fetch_calls(), 3);
}

#[tokio::test]
async fn test_missing_visible_bands_only_drop_true_color() {
    let response = pipeline(
        Arc::new(catalog_with_ndvi(0.6)),
        Arc::new(FakeWeather::new(fire_weather())),
    )
    .run(request(), CancellationToken::new())
    .await;

    assert_eq!(response.status, RiskStatus::Success, "{}", response.message);
    let assessment = response.assessment.expect("assessment");
    assert!(assessment.preview.is_some());
    assert!(assessment.true_color_preview.is_none());
}

#[tokio::test]
async fn test_misaligned_visible_bands_only_drop_true_color() {
    let aoi = lisbon_aoi();
    let catalog = catalog_with_ndvi(0.6).with_visible_bands(
        "S2A_MSIL2A_T29SMC",
        uniform_band(900.0, 4, 4, &aoi),
        uniform_band(600.0, 4, 4, &aoi),
    );

    let response = pipeline(Arc::new(catalog), Arc::new(FakeWeather::new(fire_weather())))
        .run(request(), CancellationToken::new())
        .await;

    let assessment = response.assessment.expect("assessment");
    assert!(assessment.preview.is_some());
    assert!(assessment.true_color_preview.is_none());
}

#[tokio::test]
async fn test_all_water_scene_is_inconclusive() {
    let aoi = lisbon_aoi();
    let (red, nir, _) = bands_with_ndvi(0.3, 4, 4, &aoi);
    let catalog = FakeCatalog::new().with_scene(
        scene("S2A_lake", 1, 0.0),
        red,
        nir,
        uniform_mask(SCL_WATER, 4, 4, &aoi),
    );

    let response = pipeline(Arc::new(catalog), Arc::new(FakeWeather::new(fire_weather())))
        .run(request(), CancellationToken::new())
        .await;

    assert_eq!(response.status, RiskStatus::Inconclusive);
    assert!(response.is_success());
    let assessment = response.assessment.expect("weather-only assessment");
    assert_eq!(assessment.confidence, Confidence::Low);
    assert_eq!(assessment.vegetation.mean, None);
}

#[tokio::test]
async fn test_reject_policy_fails_inconclusive_scene() {
    let aoi = lisbon_aoi();
    let (red, nir, _) = bands_with_ndvi(0.3, 4, 4, &aoi);
    let catalog = FakeCatalog::new().with_scene(
        scene("S2A_lake", 1, 0.0),
        red,
        nir,
        uniform_mask(SCL_WATER, 4, 4, &aoi),
    );
    let mut config = fast_config();
    config.scoring.inconclusive_policy = InconclusivePolicy::Reject;

    let response = AssessmentPipeline::new(
        config,
        Arc::new(catalog),
        Arc::new(FakeWeather::new(fire_weather())),
    )
    .unwrap()
    .run(request(), CancellationToken::new())
    .await;

    assert_eq!(response.status, RiskStatus::InsufficientVegetationData);
    assert!(response.assessment.is_none());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_no_scene_is_not_found() {
    let response = pipeline(
        Arc::new(FakeCatalog::new()),
        Arc::new(FakeWeather::new(fire_weather())),
    )
    .run(request(), CancellationToken::new())
    .await;

    assert_eq!(response.status, RiskStatus::NotFound);
    assert!(response.assessment.is_none());
    assert!(!response.message.is_empty());
}

#[tokio::test]
async fn test_bbox_outside_scene_is_empty_region() {
    let response = pipeline(
        Arc::new(catalog_with_ndvi(0.4)),
        Arc::new(FakeWeather::new(fire_weather())),
    )
    .run(
        AssessmentRequest::new(sierra_aoi()).with_end_date(reference_time()),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(response.status, RiskStatus::EmptyRegion);
}

#[tokio::test]
async fn test_oversized_bbox_is_rejected_before_any_fetch() {
    let catalog = Arc::new(catalog_with_ndvi(0.4));
    let weather = Arc::new(FakeWeather::new(fire_weather()));
    let continent = BoundingBox::new(-10.0, 36.0, -6.0, 42.0).unwrap();

    let response = pipeline(catalog.clone(), weather.clone())
        .run(AssessmentRequest::new(continent), CancellationToken::new())
        .await;

    assert_eq!(response.status, RiskStatus::InvalidRequest);
    assert_eq!(catalog.search_calls(), 0);
    assert_eq!(weather.calls(), 0);
}

#[tokio::test]
async fn test_invalid_cloud_ceiling() {
    let response = pipeline(
        Arc::new(catalog_with_ndvi(0.4)),
        Arc::new(FakeWeather::new(fire_weather())),
    )
    .run(request().with_max_cloud_pct(140.0), CancellationToken::new())
    .await;

    assert_eq!(response.status, RiskStatus::InvalidRequest);
}

#[tokio::test]
async fn test_corrupt_band_fails_without_retry() {
    let catalog = Arc::new(catalog_with_ndvi(0.1).with_fetch_faults([Fault::Corrupt]));
    let request = request().with_preview(false);

    let response = pipeline(catalog.clone(), Arc::new(FakeWeather::new(fire_weather())))
        .run(request.clone(), CancellationToken::new())
        .await;

    assert_eq!(response.status, RiskStatus::CorruptData);
    assert_ne!(response.status, RiskStatus::UpstreamUnavailable);
    assert!(response.assessment.is_none());
    assert!(catalog.fetch_calls() <= 3);

    let catalog = Arc::new(catalog_with_ndvi(0.1).with_fetch_faults([Fault::Corrupt]));
    let err = pipeline(catalog, Arc::new(FakeWeather::new(fire_weather())))
        .assess(&request, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RiskError::CorruptData(_)));
    assert!(!err.is_retryable());
}

// ============================================================================
// Retries and timeouts
// ============================================================================

#[tokio::test]
async fn test_transient_timeouts_are_retried() {
    let catalog = Arc::new(catalog_with_ndvi(0.1).with_search_faults([Fault::Hang]));
    let weather = Arc::new(FakeWeather::new(fire_weather()).with_faults([Fault::Unavailable]));

    let response = pipeline(catalog.clone(), weather.clone())
        .run(request(), CancellationToken::new())
        .await;

    assert_eq!(response.status, RiskStatus::Success, "{}", response.message);
    assert_eq!(catalog.search_calls(), 2);
    assert_eq!(weather.calls(), 2);
}

#[tokio::test]
async fn test_persistent_timeout_surfaces_as_upstream_timeout() {
    let catalog = Arc::new(
        catalog_with_ndvi(0.1).with_search_faults([Fault::Hang, Fault::Hang, Fault::Hang]),
    );
    let weather = Arc::new(FakeWeather::new(fire_weather()));

    let response = pipeline(catalog.clone(), weather)
        .run(request(), CancellationToken::new())
        .await;

    assert_eq!(response.status, RiskStatus::UpstreamTimeout);
    assert_eq!(catalog.search_calls(), 3);
    assert_eq!(catalog.fetch_calls(), 0);
}

#[tokio::test]
async fn test_weather_outage_fails_the_request() {
    let weather = Arc::new(
        FakeWeather::new(fire_weather()).with_faults([
            Fault::Unavailable,
            Fault::Unavailable,
            Fault::Unavailable,
        ]),
    );

    let response = pipeline(Arc::new(catalog_with_ndvi(0.1)), weather.clone())
        .run(request(), CancellationToken::new())
        .await;

    assert_eq!(response.status, RiskStatus::UpstreamUnavailable);
    assert_eq!(weather.calls(), 3);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancellation_abandons_in_flight_fetches() {
    let catalog = Arc::new(catalog_with_ndvi(0.1).with_fetch_delay(Duration::from_secs(30)));
    let mut config = fast_config();
    config.retry.request_timeout_ms = 60_000;
    let pipeline = AssessmentPipeline::new(
        config,
        catalog,
        Arc::new(FakeWeather::new(fire_weather())),
    )
    .unwrap();

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let response = pipeline.run(request(), token).await;

    assert_eq!(response.status, RiskStatus::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancelled_request_makes_no_calls() {
    let catalog = Arc::new(catalog_with_ndvi(0.1));
    let weather = Arc::new(FakeWeather::new(fire_weather()));
    let token = CancellationToken::new();
    token.cancel();

    let response = pipeline(catalog.clone(), weather.clone()).run(request(), token).await;

    assert_eq!(response.status, RiskStatus::Cancelled);
    assert_eq!(catalog.search_calls(), 0);
    assert_eq!(weather.calls(), 0);
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let pipeline = Arc::new(pipeline(
        Arc::new(catalog_with_ndvi(0.1)),
        Arc::new(FakeWeather::new(fire_weather())),
    ));

    let cancelled = CancellationToken::new();
    cancelled.cancel();

    let (a, b) = tokio::join!(
        pipeline.run(request(), cancelled),
        pipeline.run(request(), CancellationToken::new()),
    );

    assert_eq!(a.status, RiskStatus::Cancelled);
    assert_eq!(b.status, RiskStatus::Success);
    assert_ne!(a.request_id, b.request_id);
}

// ============================================================================
// Configuration files
// ============================================================================

#[test]
fn test_config_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "selection:\n  max_cloud_pct: 15\n  lookback_days: 10\npreview:\n  enabled: false"
    )
    .unwrap();

    let config = PipelineConfig::from_yaml_file(file.path()).unwrap();

    assert_eq!(config.selection.max_cloud_pct, 15.0);
    assert_eq!(config.selection.lookback_days, 10);
    assert!(!config.preview.enabled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_config_is_rejected_at_construction() {
    let mut config = fast_config();
    config.scoring.weights.vegetation = 0.0;
    config.scoring.weights.weather = 0.0;

    let err = AssessmentPipeline::new(
        config,
        Arc::new(catalog_with_ndvi(0.1)),
        Arc::new(FakeWeather::new(fire_weather())),
    )
    .err()
    .expect("zero weights must be rejected");

    assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("weights")));
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = PipelineConfig::from_yaml_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
