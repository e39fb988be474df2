//! Serde models for STAC Item Search.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Body for `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchBody {
    pub collections: Vec<String>,

    /// `[west, south, east, north]`
    pub bbox: [f64; 4],

    /// RFC 3339 interval, `start/end`.
    pub datetime: String,

    pub limit: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sortby: Vec<SortBy>,

    /// Pagination token for catalogs that page through the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub direction: String,
}

/// A page of search results.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemCollection {
    #[serde(default)]
    pub features: Vec<Item>,

    #[serde(default)]
    pub links: Vec<Link>,
}

impl ItemCollection {
    /// The `next` pagination link, if any.
    pub fn next_link(&self) -> Option<&Link> {
        self.links.iter().find(|l| l.rel == "next")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub id: String,

    #[serde(default)]
    pub collection: Option<String>,

    pub properties: ItemProperties,

    #[serde(default)]
    pub assets: HashMap<String, Asset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemProperties {
    /// RFC 3339 acquisition time. Null for items that only carry a range.
    #[serde(default)]
    pub datetime: Option<String>,

    #[serde(rename = "eo:cloud_cover", default)]
    pub cloud_cover: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub href: String,

    #[serde(rename = "type", default)]
    pub media_type: Option<String>,
}

/// A link object; `next` links may carry a POST body.
#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,

    #[serde(default)]
    pub method: Option<String>,

    #[serde(default)]
    pub body: Option<serde_json::Value>,

    /// Merge `body` into the previous request body instead of replacing it.
    #[serde(default)]
    pub merge: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {
          "type": "Feature",
          "id": "S2B_MSIL2A_20240718T112119_R037_T29SND_20240718T133515",
          "collection": "sentinel-2-l2a",
          "bbox": [-9.0, 38.5, -7.8, 39.5],
          "properties": {
            "datetime": "2024-07-18T11:21:19.024000Z",
            "eo:cloud_cover": 3.41,
            "platform": "Sentinel-2B"
          },
          "assets": {
            "B04": {"href": "https://example.blob/B04.tif", "type": "image/tiff; application=geotiff; profile=cloud-optimized"},
            "B08": {"href": "https://example.blob/B08.tif"},
            "SCL": {"href": "https://example.blob/SCL.tif"}
          }
        }
      ],
      "links": [
        {"rel": "self", "href": "https://example.com/search"},
        {"rel": "next", "href": "https://example.com/search", "method": "POST", "body": {"token": "next:abc"}, "merge": true}
      ]
    }"#;

    #[test]
    fn test_parse_item_collection() {
        let page: ItemCollection = serde_json::from_str(PAGE).unwrap();
        assert_eq!(page.features.len(), 1);

        let item = &page.features[0];
        assert_eq!(item.properties.cloud_cover, Some(3.41));
        assert_eq!(item.assets["SCL"].href, "https://example.blob/SCL.tif");

        let next = page.next_link().unwrap();
        assert_eq!(next.method.as_deref(), Some("POST"));
        assert_eq!(next.merge, Some(true));
    }

    #[test]
    fn test_search_body_omits_empty_fields() {
        let body = SearchBody {
            collections: vec!["sentinel-2-l2a".to_string()],
            bbox: [-9.0, 38.6, -8.9, 38.7],
            datetime: "2024-07-01T00:00:00Z/2024-07-31T00:00:00Z".to_string(),
            limit: 50,
            query: None,
            sortby: Vec::new(),
            token: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("query").is_none());
        assert!(json.get("sortby").is_none());
        assert_eq!(json["bbox"][0], -9.0);
    }
}
