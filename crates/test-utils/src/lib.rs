//! Shared test utilities for the wildfire risk workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic band generators
//! - Scene, bbox and weather fixtures
//! - In-memory catalog and weather fakes with fault injection
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! The fakes implement the catalog and weather traits, so only integration
//! tests under `tests/` should use them.

pub mod fakes;
pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fakes::*;
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Approximate equality for an `Option<f64>` that must be `Some`.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_some_approx_eq;
///
/// assert_some_approx_eq!(stats.mean, 0.5, 1e-6);
/// ```
#[macro_export]
macro_rules! assert_some_approx_eq {
    ($option:expr, $expected:expr, $epsilon:expr) => {{
        match $option {
            Some(value) => $crate::assert_approx_eq!(value, $expected, $epsilon),
            None => panic!("assertion failed: expected Some(≈{:?}), got None", $expected),
        }
    }};
}
