//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in WGS84 degrees.
///
/// Construct through [`BoundingBox::new`], which rejects degenerate, inverted
/// and out-of-range boxes. The fields stay public so the type can be
/// serialized as a plain record; callers deserializing untrusted input should
/// run [`BoundingBox::validate`] afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a validated bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, BboxError> {
        let bbox = Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Parse a `"minLon,minLat,maxLon,maxLat"` string.
    pub fn parse(s: &str) -> Result<Self, BboxError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| BboxError::InvalidNumber(part.to_string()))?;
        }

        Self::new(values[0], values[1], values[2], values[3])
    }

    /// Check the min < max invariant and the WGS84 coordinate range.
    pub fn validate(&self) -> Result<(), BboxError> {
        let coords = [self.min_lon, self.min_lat, self.max_lon, self.max_lat];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(BboxError::NonFinite);
        }
        if self.min_lon >= self.max_lon || self.min_lat >= self.max_lat {
            return Err(BboxError::Degenerate(*self));
        }
        if self.min_lon < -180.0 || self.max_lon > 180.0 {
            return Err(BboxError::OutOfRange(format!(
                "longitude span {}..{} exceeds -180..180",
                self.min_lon, self.max_lon
            )));
        }
        if self.min_lat < -90.0 || self.max_lat > 90.0 {
            return Err(BboxError::OutOfRange(format!(
                "latitude span {}..{} exceeds -90..90",
                self.min_lat, self.max_lat
            )));
        }
        Ok(())
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Area in square degrees.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Center point as `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Check if this bbox overlaps another with non-zero area.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon < other.max_lon
            && self.max_lon > other.min_lon
            && self.min_lat < other.max_lat
            && self.max_lat > other.min_lat
    }

    /// Compute the intersection of two bounding boxes.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingBox {
            min_lon: self.min_lon.max(other.min_lon),
            min_lat: self.min_lat.max(other.min_lat),
            max_lon: self.max_lon.min(other.max_lon),
            max_lat: self.max_lat.min(other.max_lat),
        })
    }

    /// Check if a point is contained within this bbox (edges inclusive).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Evenly spaced sample points across the box, `n` per axis, ordered
    /// north to south then west to east. `n == 1` yields the center.
    pub fn sample_grid(&self, n: usize) -> Vec<(f64, f64)> {
        if n <= 1 {
            return vec![self.center()];
        }

        let last = (n - 1) as f64;

        let mut points = Vec::with_capacity(n * n);
        for row in 0..n {
            let lat = self.max_lat - (row as f64 / last) * self.height();
            for col in 0..n {
                let lon = self.min_lon + (col as f64 / last) * self.width();
                points.push((lon, lat));
            }
        }
        points
    }

    /// `[west, south, east, north]`, the order STAC and GeoJSON expect.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.6},{:.6},{:.6},{:.6}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxError {
    #[error("Invalid bbox format: {0}. Expected 'minLon,minLat,maxLon,maxLat'")]
    InvalidFormat(String),

    #[error("Invalid number in bbox: {0}")]
    InvalidNumber(String),

    #[error("Bbox coordinates must be finite")]
    NonFinite,

    #[error("Degenerate or inverted bbox: {0}")]
    Degenerate(BoundingBox),

    #[error("Bbox out of range: {0}")]
    OutOfRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = BoundingBox::parse("-122.5, 37.5, -122.0, 38.0").unwrap();
        assert_eq!(bbox.min_lon, -122.5);
        assert_eq!(bbox.min_lat, 37.5);
        assert_eq!(bbox.max_lon, -122.0);
        assert_eq!(bbox.max_lat, 38.0);
    }

    #[test]
    fn test_rejects_inverted_and_degenerate() {
        assert!(matches!(
            BoundingBox::new(10.0, 0.0, 5.0, 1.0),
            Err(BboxError::Degenerate(_))
        ));
        assert!(matches!(
            BoundingBox::new(0.0, 1.0, 1.0, 1.0),
            Err(BboxError::Degenerate(_))
        ));
        assert!(matches!(
            BoundingBox::new(0.0, f64::NAN, 1.0, 1.0),
            Err(BboxError::NonFinite)
        ));
        assert!(matches!(
            BoundingBox::new(-190.0, 0.0, 1.0, 1.0),
            Err(BboxError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            BoundingBox::parse("1,2,3"),
            Err(BboxError::InvalidFormat(_))
        ));
        assert!(matches!(
            BoundingBox::parse("1,2,x,4"),
            Err(BboxError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0).unwrap();
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0).unwrap();

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));

        let intersection = a.intersection(&b).unwrap();
        assert_eq!(intersection.min_lon, 5.0);
        assert_eq!(intersection.min_lat, 5.0);
        assert_eq!(intersection.max_lon, 10.0);
        assert_eq!(intersection.max_lat, 10.0);
        assert!(a.intersection(&c).is_none());
    }

    #[test]
    fn test_sample_grid() {
        let bbox = BoundingBox::new(0.0, 0.0, 3.0, 3.0).unwrap();
        assert_eq!(bbox.sample_grid(1), vec![(1.5, 1.5)]);

        let points = bbox.sample_grid(4);
        assert_eq!(points.len(), 16);
        assert_eq!(points[0], (0.0, 3.0));
        assert_eq!(points[3], (3.0, 3.0));
        assert_eq!(points[15], (3.0, 0.0));
    }
}
