//! Fire-risk scoring.
//!
//! [`RiskScorer`] is the seam between the pipeline and the scoring model.
//! [`HeuristicScorer`] combines a vegetation stress term derived from mean
//! NDVI with a weather stress term built from temperature, wind and
//! humidity, each normalised across a configurable calibration interval:
//!
//! ```text
//! vegetation = clamp((ndvi_high - mean) / (ndvi_high - ndvi_low), 0, 1)
//! weather    = weighted mean of temperature, wind and dryness terms
//! score      = 100 * (w_veg * vegetation + w_weather * weather) / (w_veg + w_weather)
//! ```

pub mod category;
pub mod config;
pub mod error;
pub mod scorer;

pub use category::{Breakpoints, RiskCategory};
pub use config::{Bounds, InconclusivePolicy, ScoringConfig, Weights};
pub use error::{Result, ScoringError};
pub use scorer::{Confidence, HeuristicScorer, RiskAssessment, RiskScorer};
