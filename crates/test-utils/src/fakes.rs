//! In-memory catalog and weather fakes.
//!
//! Both fakes can be scripted to fail their next calls, and count every
//! call so tests can assert on retry behaviour.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use risk_common::{BandId, BoundingBox, DateRange, RasterGrid, SceneReference, WeatherSnapshot};
use scene_catalog::{CatalogError, ImageryCatalog};
use weather_client::{WeatherAdapter, WeatherError};

/// A scripted failure for the next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Never answer, so the caller's timeout fires.
    Hang,
    /// Answer with a retryable "service unavailable".
    Unavailable,
    /// Answer with undecodable data.
    Corrupt,
}

const HANG: Duration = Duration::from_secs(3600);

fn next_fault(queue: &Mutex<VecDeque<Fault>>) -> Option<Fault> {
    queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .pop_front()
}

/// Imagery catalog serving fixed scenes and bands from memory.
#[derive(Default)]
pub struct FakeCatalog {
    scenes: Vec<SceneReference>,
    bands: HashMap<(String, BandId), RasterGrid>,
    search_faults: Mutex<VecDeque<Fault>>,
    fetch_faults: Mutex<VecDeque<Fault>>,
    fetch_delay: Option<Duration>,
    search_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scene with its three bands.
    pub fn with_scene(
        mut self,
        scene: SceneReference,
        red: RasterGrid,
        nir: RasterGrid,
        mask: RasterGrid,
    ) -> Self {
        let id = scene.id().to_string();
        self.bands.insert((id.clone(), BandId::Red), red);
        self.bands.insert((id.clone(), BandId::Nir), nir);
        self.bands.insert((id, BandId::Mask), mask);
        self.scenes.push(scene);
        self
    }

    /// Add green and blue bands to a scene already added.
    pub fn with_visible_bands(mut self, scene_id: &str, green: RasterGrid, blue: RasterGrid) -> Self {
        self.bands.insert((scene_id.to_string(), BandId::Green), green);
        self.bands.insert((scene_id.to_string(), BandId::Blue), blue);
        self
    }

    /// Add a scene the search returns but whose bands are absent.
    pub fn with_listed_scene(mut self, scene: SceneReference) -> Self {
        self.scenes.push(scene);
        self
    }

    /// Fail the next searches with these faults, in order.
    pub fn with_search_faults(self, faults: impl IntoIterator<Item = Fault>) -> Self {
        self.search_faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(faults);
        self
    }

    /// Fail the next band fetches with these faults, in order.
    pub fn with_fetch_faults(self, faults: impl IntoIterator<Item = Fault>) -> Self {
        self.fetch_faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(faults);
        self
    }

    /// Delay every band fetch.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    async fn apply(fault: Option<Fault>) -> Result<(), CatalogError> {
        match fault {
            None => Ok(()),
            Some(Fault::Hang) => {
                tokio::time::sleep(HANG).await;
                Err(CatalogError::Timeout("fake catalog hung".to_string()))
            }
            Some(Fault::Unavailable) => Err(CatalogError::Unavailable(
                "fake catalog returned HTTP 503".to_string(),
            )),
            Some(Fault::Corrupt) => Err(CatalogError::Decode(
                "fake catalog returned garbage".to_string(),
            )),
        }
    }
}

#[async_trait]
impl ImageryCatalog for FakeCatalog {
    async fn search(
        &self,
        _bbox: &BoundingBox,
        range: &DateRange,
    ) -> Result<Vec<SceneReference>, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Self::apply(next_fault(&self.search_faults)).await?;

        Ok(self
            .scenes
            .iter()
            .filter(|s| range.contains(s.acquired_at()))
            .cloned()
            .collect())
    }

    async fn fetch_band(
        &self,
        scene: &SceneReference,
        band: BandId,
        _bbox: &BoundingBox,
    ) -> Result<RasterGrid, CatalogError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Self::apply(next_fault(&self.fetch_faults)).await?;

        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        self.bands
            .get(&(scene.id().to_string(), band))
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("{} band of {}", band, scene.id())))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Weather source returning a fixed snapshot.
pub struct FakeWeather {
    snapshot: WeatherSnapshot,
    faults: Mutex<VecDeque<Fault>>,
    calls: AtomicUsize,
}

impl FakeWeather {
    pub fn new(snapshot: WeatherSnapshot) -> Self {
        Self {
            snapshot,
            faults: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail the next point lookups with these faults, in order.
    pub fn with_faults(self, faults: impl IntoIterator<Item = Fault>) -> Self {
        self.faults
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(faults);
        self
    }

    /// Number of point lookups made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherAdapter for FakeWeather {
    async fn fetch_current(&self, _lat: f64, _lon: f64) -> Result<WeatherSnapshot, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match next_fault(&self.faults) {
            None => Ok(self.snapshot.clone()),
            Some(Fault::Hang) => {
                tokio::time::sleep(HANG).await;
                Err(WeatherError::Timeout("fake weather hung".to_string()))
            }
            Some(Fault::Unavailable) => Err(WeatherError::Unavailable(
                "fake weather returned HTTP 503".to_string(),
            )),
            Some(Fault::Corrupt) => Err(WeatherError::Decode(
                "fake weather returned garbage".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}
