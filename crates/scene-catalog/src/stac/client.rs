use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat};
use reqwest::{Client, Response, StatusCode};
use risk_common::{BandId, BoundingBox, DateRange, RasterGrid, SceneReference};
use tracing::{debug, instrument, warn};

use super::models::{Item, ItemCollection, Link, SearchBody, SortBy};
use super::StacConfig;
use crate::catalog::ImageryCatalog;
use crate::error::{CatalogError, Result};

/// Imagery catalog backed by a STAC API and a bbox crop endpoint.
pub struct StacCatalog {
    client: Client,
    config: StacConfig,
}

impl StacCatalog {
    pub fn new(config: StacConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| CatalogError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn with_client(client: Client, config: StacConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &StacConfig {
        &self.config
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.api_url.trim_end_matches('/'))
    }

    fn search_body(&self, bbox: &BoundingBox, range: &DateRange) -> SearchBody {
        let query = self
            .config
            .cloud_cover_lte
            .map(|lte| serde_json::json!({ "eo:cloud_cover": { "lte": lte } }));

        SearchBody {
            collections: vec![self.config.collection.clone()],
            bbox: bbox.to_array(),
            datetime: range.to_interval(),
            limit: self.config.page_size,
            query,
            sortby: vec![SortBy {
                field: "properties.datetime".to_string(),
                direction: "desc".to_string(),
            }],
            token: None,
        }
    }

    /// Crop endpoint URL for one band of a scene over `bbox`.
    pub fn crop_url(&self, scene: &SceneReference, band: BandId, bbox: &BoundingBox) -> String {
        let collection = scene.collection().unwrap_or(&self.config.collection);
        let (width, height) = self.config.crop_dimensions(bbox);
        self.config
            .crop_url
            .replace("{collection}", collection)
            .replace("{item}", scene.id())
            .replace("{asset}", self.config.asset_key(band))
            .replace("{minx}", &bbox.min_lon.to_string())
            .replace("{miny}", &bbox.min_lat.to_string())
            .replace("{maxx}", &bbox.max_lon.to_string())
            .replace("{maxy}", &bbox.max_lat.to_string())
            .replace("{width}", &width.to_string())
            .replace("{height}", &height.to_string())
    }

    /// Convert a STAC item into a scene reference.
    ///
    /// Items without a parseable `datetime` are skipped. Missing
    /// `eo:cloud_cover` counts as fully cloudy.
    fn to_scene(&self, item: Item) -> Option<SceneReference> {
        let acquired_at = match item
            .properties
            .datetime
            .as_deref()
            .map(DateTime::parse_from_rfc3339)
        {
            Some(Ok(dt)) => dt.with_timezone(&Utc),
            _ => {
                warn!(item_id = %item.id, "Skipping STAC item without a valid datetime");
                return None;
            }
        };

        let assets: HashMap<BandId, String> = BandId::ALL
            .iter()
            .filter_map(|band| {
                item.assets
                    .get(self.config.asset_key(*band))
                    .map(|asset| (*band, asset.href.clone()))
            })
            .collect();

        let scene = SceneReference::new(
            item.id,
            acquired_at,
            item.properties.cloud_cover.unwrap_or(100.0),
            assets,
        );

        Some(match item.collection {
            Some(collection) => scene.with_collection(collection),
            None => scene,
        })
    }

    async fn post_page(&self, url: &str, body: &serde_json::Value) -> Result<ItemCollection> {
        let response = self.client.post(url).json(body).send().await?;
        let response = check_status(response, "STAC search").await?;
        parse_page(response).await
    }

    async fn get_page(&self, url: &str) -> Result<ItemCollection> {
        let response = self.client.get(url).send().await?;
        let response = check_status(response, "STAC pagination").await?;
        parse_page(response).await
    }

    /// Fetch the page a `next` link points at. POST links update `body` to
    /// the request actually sent so later merges build on it.
    async fn follow_next(&self, link: &Link, body: &mut serde_json::Value) -> Result<ItemCollection> {
        let is_post = link
            .method
            .as_deref()
            .map_or(false, |m| m.eq_ignore_ascii_case("POST"));

        if !is_post {
            return self.get_page(&link.href).await;
        }

        match (&link.body, link.merge.unwrap_or(false)) {
            (Some(link_body), true) => {
                if let (Some(base), Some(overlay)) = (body.as_object_mut(), link_body.as_object()) {
                    for (k, v) in overlay {
                        base.insert(k.clone(), v.clone());
                    }
                }
            }
            (Some(link_body), false) => *body = link_body.clone(),
            (None, _) => {}
        }

        self.post_page(&link.href, body).await
    }
}

#[async_trait]
impl ImageryCatalog for StacCatalog {
    #[instrument(skip(self, bbox, range), fields(bbox = %bbox))]
    async fn search(&self, bbox: &BoundingBox, range: &DateRange) -> Result<Vec<SceneReference>> {
        let mut body = serde_json::to_value(self.search_body(bbox, range))
            .map_err(|e| CatalogError::InvalidRequest(format!("serializing search body: {}", e)))?;

        let mut items: Vec<Item> = Vec::new();
        let mut page = self.post_page(&self.search_url(), &body).await?;

        loop {
            let next = page.next_link().cloned();
            items.append(&mut page.features);

            if items.len() >= self.config.max_items {
                break;
            }

            match next {
                Some(link) => {
                    page = self.follow_next(&link, &mut body).await?;
                    if page.features.is_empty() {
                        break;
                    }
                }
                None => break,
            }
        }

        items.truncate(self.config.max_items);
        debug!(items = items.len(), "STAC search complete");

        Ok(items.into_iter().filter_map(|item| self.to_scene(item)).collect())
    }

    #[instrument(skip(self, scene, band, bbox), fields(scene_id = %scene.id(), band = %band))]
    async fn fetch_band(
        &self,
        scene: &SceneReference,
        band: BandId,
        bbox: &BoundingBox,
    ) -> Result<RasterGrid> {
        let url = self.crop_url(scene, band, bbox);
        let response = self.client.get(&url).send().await?;
        let response = check_status(response, "band crop").await?;
        let bytes = response.bytes().await?;

        debug!(bytes = bytes.len(), "Downloaded band crop");

        let (data, width, height) = tokio::task::spawn_blocking(move || decode_band(&bytes))
            .await
            .map_err(|e| CatalogError::Decode(format!("decode task failed: {}", e)))??;

        let expected = self.config.crop_dimensions(bbox);
        if (width, height) != expected {
            return Err(CatalogError::GeometryMismatch(format!(
                "{} crop came back {}x{}, requested {}x{}",
                band, width, height, expected.0, expected.1
            )));
        }

        Ok(RasterGrid::from_bbox(
            data,
            width,
            height,
            bbox,
            self.config.band_nodata,
        )?)
    }

    fn name(&self) -> &str {
        "stac"
    }
}

/// Map a non-success response into the retryable/non-retryable split.
async fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = format!(
        "{} returned HTTP {}: {}",
        what,
        status,
        body.chars().take(300).collect::<String>()
    );

    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(CatalogError::Unavailable(detail))
    } else {
        Err(CatalogError::Rejected(detail))
    }
}

async fn parse_page(response: Response) -> Result<ItemCollection> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| CatalogError::Decode(format!("parsing STAC response: {}", e)))
}

/// Decode a single-band TIFF into row-major values.
///
/// Pixels with a zero alpha sample become NaN.
pub(crate) fn decode_band(bytes: &[u8]) -> Result<(Vec<f32>, usize, usize)> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Tiff)
        .map_err(|e| CatalogError::Decode(e.to_string()))?;
    let (width, height) = (img.width() as usize, img.height() as usize);

    let data: Vec<f32> = match img {
        DynamicImage::ImageLuma8(buf) => buf.pixels().map(|p| f32::from(p.0[0])).collect(),
        DynamicImage::ImageLuma16(buf) => buf.pixels().map(|p| f32::from(p.0[0])).collect(),
        DynamicImage::ImageLumaA8(buf) => buf
            .pixels()
            .map(|p| masked(f32::from(p.0[0]), p.0[1] == 0))
            .collect(),
        DynamicImage::ImageLumaA16(buf) => buf
            .pixels()
            .map(|p| masked(f32::from(p.0[0]), p.0[1] == 0))
            .collect(),
        other => other
            .to_luma_alpha16()
            .pixels()
            .map(|p| masked(f32::from(p.0[0]), p.0[1] == 0))
            .collect(),
    };

    Ok((data, width, height))
}

fn masked(value: f32, transparent: bool) -> f32 {
    if transparent {
        f32::NAN
    } else {
        value
    }
}
