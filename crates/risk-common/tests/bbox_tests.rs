//! Tests for BoundingBox validation, parsing and geometry helpers.

use proptest::prelude::*;
use risk_common::bbox::{BboxError, BoundingBox};
use risk_common::{RiskError, RiskStatus};

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_negative_coordinates() {
    let bbox = BoundingBox::parse("-8.95,38.60,-8.85,38.70").unwrap();
    assert!((bbox.min_lon - (-8.95)).abs() < 1e-12);
    assert!((bbox.max_lat - 38.70).abs() < 1e-12);
}

#[test]
fn test_parse_rejects_inverted() {
    let err = BoundingBox::parse("-8.85,38.60,-8.95,38.70").unwrap_err();
    assert!(matches!(err, BboxError::Degenerate(_)));
}

#[test]
fn test_parse_rejects_extra_components() {
    assert!(matches!(
        BoundingBox::parse("1,2,3,4,5"),
        Err(BboxError::InvalidFormat(_))
    ));
}

#[test]
fn test_invalid_bbox_surfaces_as_invalid_request() {
    let err: RiskError = BoundingBox::parse("0,0,0,0").unwrap_err().into();
    assert_eq!(err.status(), RiskStatus::InvalidRequest);
    assert_eq!(err.http_status_code(), 400);
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn test_center_and_area() {
    let bbox = BoundingBox::new(-120.0, 35.0, -119.0, 36.0).unwrap();
    assert_eq!(bbox.center(), (-119.5, 35.5));
    assert!((bbox.area() - 1.0).abs() < 1e-12);
}

#[test]
fn test_touching_boxes_do_not_intersect() {
    let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
    let b = BoundingBox::new(1.0, 0.0, 2.0, 1.0).unwrap();
    assert!(!a.intersects(&b));
    assert!(a.intersection(&b).is_none());
}

#[test]
fn test_display_is_parseable() {
    let bbox = BoundingBox::new(-8.95, 38.6, -8.85, 38.7).unwrap();
    let reparsed = BoundingBox::parse(&bbox.to_string()).unwrap();
    assert_eq!(bbox, reparsed);
}

proptest! {
    #[test]
    fn prop_intersection_is_contained_in_both(
        a_lon in -170.0f64..160.0, a_lat in -80.0f64..70.0,
        b_lon in -170.0f64..160.0, b_lat in -80.0f64..70.0,
        a_w in 0.01f64..10.0, a_h in 0.01f64..10.0,
        b_w in 0.01f64..10.0, b_h in 0.01f64..10.0,
    ) {
        let a = BoundingBox::new(a_lon, a_lat, a_lon + a_w, a_lat + a_h).unwrap();
        let b = BoundingBox::new(b_lon, b_lat, b_lon + b_w, b_lat + b_h).unwrap();

        if let Some(i) = a.intersection(&b) {
            prop_assert!(i.validate().is_ok());
            prop_assert!(i.min_lon >= a.min_lon && i.max_lon <= a.max_lon);
            prop_assert!(i.min_lat >= b.min_lat && i.max_lat <= b.max_lat);
        }
    }

    #[test]
    fn prop_sample_grid_stays_inside(n in 1usize..6) {
        let bbox = BoundingBox::new(10.0, 40.0, 10.5, 40.25).unwrap();
        let points = bbox.sample_grid(n);
        prop_assert_eq!(points.len(), n * n);
        for (lon, lat) in points {
            prop_assert!(bbox.contains(lon, lat));
        }
    }
}
