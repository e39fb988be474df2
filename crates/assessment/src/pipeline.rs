//! The end-to-end assessment pipeline.
//!
//! ```text
//! bbox ─┬─> SceneSelector ─> BandReader ─> VegetationIndexEngine ─┬─> RiskScorer ─> ResultAssembler
//!       └─> WeatherAdapter ───────────────────────────────────────┘
//! ```
//!
//! Imagery and weather are fetched concurrently. When a preview is wanted the
//! green and blue bands are read alongside the index bands for a true-colour
//! image; losing them never fails the request. Each request is checked
//! against its cancellation token around every network await and between
//! stages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::{join, try_join};
use metrics::{counter, histogram};
use preview::PreviewRenderer;
use risk_common::{
    BoundingBox, RiskError, RiskResult, SceneReference, WeatherSnapshot,
};
use risk_scorer::{HeuristicScorer, RiskAssessment, RiskScorer};
use scene_catalog::{
    BandReader, BandSet, ImageryCatalog, SceneSelector, StacCatalog, VisibleBands,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;
use vegetation::{VegetationIndexEngine, VegetationIndexResult};
use weather_client::{OpenMeteoClient, WeatherAdapter};

use crate::assembler::ResultAssembler;
use crate::config::PipelineConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::request::{AssessmentRequest, AssessmentResponse};

/// Request parameters after defaults are applied.
#[derive(Debug, Clone, Copy)]
struct Resolved {
    bbox: BoundingBox,
    max_cloud_pct: f64,
    lookback_days: u32,
    end: DateTime<Utc>,
    include_preview: bool,
}

/// What was read for the selected scene.
struct Imagery {
    scene: SceneReference,
    bands: BandSet,
    visible: Option<VisibleBands>,
}

/// Runs risk assessments against an imagery catalog and a weather source.
///
/// The pipeline holds no per-request state; one instance serves any number
/// of concurrent requests.
pub struct AssessmentPipeline {
    config: PipelineConfig,
    selector: SceneSelector,
    reader: BandReader,
    weather: Arc<dyn WeatherAdapter>,
    engine: VegetationIndexEngine,
    scorer: Arc<dyn RiskScorer>,
    assembler: ResultAssembler,
}

impl AssessmentPipeline {
    /// Build a pipeline over the given collaborators, scoring with the
    /// configured heuristic.
    ///
    /// Fails with `ConfigError::Invalid` when `config` does not validate.
    pub fn new(
        config: PipelineConfig,
        catalog: Arc<dyn ImageryCatalog>,
        weather: Arc<dyn WeatherAdapter>,
    ) -> ConfigResult<Self> {
        config.validate().map_err(ConfigError::Invalid)?;

        Ok(Self {
            selector: SceneSelector::new(catalog.clone(), config.retry.clone()),
            reader: BandReader::new(catalog, config.retry.clone()),
            weather,
            engine: VegetationIndexEngine::new(config.masking.clone()),
            scorer: Arc::new(HeuristicScorer::new(config.scoring.clone())),
            assembler: ResultAssembler::new(PreviewRenderer::from_config(&config.preview)),
            config,
        })
    }

    /// Build a pipeline over the STAC catalog and Open-Meteo.
    pub fn from_config(config: PipelineConfig) -> RiskResult<Self> {
        config.validate().map_err(ConfigError::Invalid)?;
        let catalog = StacCatalog::new(config.catalog.clone())?;
        let weather = OpenMeteoClient::new(config.weather.clone())?;

        info!(
            stac = %config.catalog.api_url,
            collection = %config.catalog.collection,
            weather = %config.weather.base_url,
            "Pipeline collaborators configured"
        );

        Ok(Self::new(config, Arc::new(catalog), Arc::new(weather))?)
    }

    /// Replace the scoring strategy.
    pub fn with_scorer(mut self, scorer: Arc<dyn RiskScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one request to a structured response.
    ///
    /// Never fails: every error becomes a response carrying its status and
    /// message.
    pub async fn run(
        &self,
        request: AssessmentRequest,
        cancel: CancellationToken,
    ) -> AssessmentResponse {
        let request_id = Uuid::new_v4();
        let span = info_span!("assessment", request_id = %request_id, bbox = %request.bbox);
        let started = Instant::now();

        let outcome = self.assess(&request, &cancel).instrument(span.clone()).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let response = match outcome {
            Ok(assessment) => AssessmentResponse::success(request_id, assessment),
            Err(e) => {
                span.in_scope(|| warn!(error = %e, status = %e.status(), "Assessment failed"));
                AssessmentResponse::failure(request_id, &e)
            }
        };

        counter!("assessments_total", "status" => response.status.as_str()).increment(1);
        histogram!("assessment_duration_ms").record(elapsed_ms);
        span.in_scope(|| info!(status = %response.status, elapsed_ms, "Assessment finished"));

        response
    }

    /// Run one request, returning the assessment or the pipeline error.
    pub async fn assess(
        &self,
        request: &AssessmentRequest,
        cancel: &CancellationToken,
    ) -> RiskResult<RiskAssessment> {
        let req = self.resolve(request)?;
        if cancel.is_cancelled() {
            return Err(RiskError::Cancelled);
        }

        let imagery = self.acquire_imagery(&req);
        let weather = self.fetch_weather(&req.bbox);

        let (imagery, weather) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RiskError::Cancelled),
            joined = try_join(imagery, weather) => joined?,
        };

        let Imagery {
            scene,
            bands,
            visible,
        } = imagery;
        let true_color = visible.map(|v| (bands.red.clone(), v));

        let index = self.compute_index(bands, cancel).await?;
        histogram!("vegetation_valid_fraction").record(index.stats().valid_fraction);

        if cancel.is_cancelled() {
            return Err(RiskError::Cancelled);
        }

        let assessment = self.scorer.score(&index, &weather, scene.acquired_at())?;

        info!(
            scene_id = %scene.id(),
            scorer = self.scorer.name(),
            score = assessment.score,
            category = %assessment.category,
            confidence = ?assessment.confidence,
            "Scored assessment"
        );

        let assessment = self
            .assembler
            .assemble(assessment, &index, req.include_preview);
        Ok(match true_color {
            Some((red, visible)) => {
                self.assembler
                    .attach_true_color(assessment, &red, &visible.green, &visible.blue)
            }
            None => assessment,
        })
    }

    fn resolve(&self, request: &AssessmentRequest) -> RiskResult<Resolved> {
        let selection = &self.config.selection;
        let bbox = request.bbox;
        bbox.validate()?;

        if bbox.area() > selection.max_bbox_area_sq_deg {
            return Err(RiskError::InvalidRequest(format!(
                "bbox covers {:.4} square degrees, the limit is {}; zoom in",
                bbox.area(),
                selection.max_bbox_area_sq_deg
            )));
        }

        let max_cloud_pct = request.max_cloud_pct.unwrap_or(selection.max_cloud_pct);
        if !(0.0..=100.0).contains(&max_cloud_pct) {
            return Err(RiskError::InvalidRequest(format!(
                "max_cloud_pct must be within 0..=100, got {}",
                max_cloud_pct
            )));
        }

        let lookback_days = request.lookback_days.unwrap_or(selection.lookback_days);
        if lookback_days == 0 {
            return Err(RiskError::InvalidRequest(
                "lookback_days must be at least 1".to_string(),
            ));
        }

        Ok(Resolved {
            bbox,
            max_cloud_pct,
            lookback_days,
            end: request.end_date.unwrap_or_else(Utc::now),
            include_preview: request.include_preview.unwrap_or(self.config.preview.enabled),
        })
    }

    async fn acquire_imagery(&self, req: &Resolved) -> RiskResult<Imagery> {
        let scene = self
            .selector
            .select_scene_until(&req.bbox, req.max_cloud_pct, req.lookback_days, req.end)
            .await?;

        if !req.include_preview {
            let bands = self.reader.read_bands(&scene, &req.bbox).await?;
            return Ok(Imagery {
                scene,
                bands,
                visible: None,
            });
        }

        let (bands, visible) = join(
            self.reader.read_bands(&scene, &req.bbox),
            self.reader.read_visible(&scene, &req.bbox),
        )
        .await;
        let bands = bands?;
        let visible = match visible {
            Ok(visible) if bands.red.same_geometry(&visible.green) => Some(visible),
            Ok(_) => {
                warn!("Visible bands are not aligned with the red band, skipping true colour");
                None
            }
            Err(e) => {
                warn!(error = %e, "Could not read visible bands, skipping true colour");
                None
            }
        };

        Ok(Imagery {
            scene,
            bands,
            visible,
        })
    }

    async fn fetch_weather(&self, bbox: &BoundingBox) -> RiskResult<WeatherSnapshot> {
        let (weather, grid_size) = (&self.weather, self.config.weather.grid_size);
        let snapshot = self
            .config
            .retry
            .run("weather fetch", move || weather.fetch_area(bbox, grid_size))
            .await?;

        debug!(
            source = weather.name(),
            temperature_c = snapshot.temperature_c,
            wind_speed_kmh = snapshot.wind_speed_kmh,
            relative_humidity_pct = snapshot.relative_humidity_pct,
            samples = snapshot.sample_count,
            "Fetched weather"
        );
        Ok(snapshot)
    }

    /// NDVI runs on the blocking pool. Cancelling the request raises the
    /// abort flag so the task stops at its next row chunk.
    async fn compute_index(
        &self,
        bands: BandSet,
        cancel: &CancellationToken,
    ) -> RiskResult<VegetationIndexResult> {
        let engine = self.engine.clone();
        let abort = Arc::new(AtomicBool::new(false));
        let flag = abort.clone();
        let task = tokio::task::spawn_blocking(move || {
            engine.compute_index_cancellable(&bands.red, &bands.nir, &bands.mask, &flag)
        });

        let joined = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                abort.store(true, Ordering::Relaxed);
                return Err(RiskError::Cancelled);
            }
            joined = task => joined,
        };

        let result =
            joined.map_err(|e| RiskError::Internal(format!("vegetation index task failed: {}", e)))?;
        Ok(result?)
    }
}
