//! Derived artifacts attached to an assessment.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;

/// A rendered NDVI overlay ready to drape over a web map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewImage {
    pub media_type: String,
    /// Base64-encoded image bytes.
    pub data_base64: String,
    pub width: u32,
    pub height: u32,
    /// `[[min_lat, min_lon], [max_lat, max_lon]]`, the corner order Leaflet
    /// image overlays take.
    pub bounds: [[f64; 2]; 2],
}

impl PreviewImage {
    pub fn bounds_from(bbox: &BoundingBox) -> [[f64; 2]; 2] {
        [[bbox.min_lat, bbox.min_lon], [bbox.max_lat, bbox.max_lon]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_lat_lon_pairs() {
        let bbox = BoundingBox::new(-8.95, 38.6, -8.85, 38.7).unwrap();
        assert_eq!(
            PreviewImage::bounds_from(&bbox),
            [[38.6, -8.95], [38.7, -8.85]]
        );
    }
}
