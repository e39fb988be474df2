//! Wildfire risk assessment for a bounding box.
//!
//! [`AssessmentPipeline`] selects the most recent clear scene, reads its red,
//! near-infrared and classification bands, computes a masked NDVI, joins it
//! with current weather and scores the result. Every request yields an
//! [`AssessmentResponse`] with a status and message, whether or not it
//! produced an assessment.
//!
//! # Example
//!
//! ```ignore
//! use assessment::{AssessmentPipeline, AssessmentRequest, PipelineConfig};
//! use risk_common::BoundingBox;
//! use tokio_util::sync::CancellationToken;
//!
//! let pipeline = AssessmentPipeline::from_config(PipelineConfig::default())?;
//! let bbox = BoundingBox::parse("-8.95,38.60,-8.85,38.70")?;
//! let response = pipeline
//!     .run(AssessmentRequest::new(bbox), CancellationToken::new())
//!     .await;
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! ```

pub mod assembler;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod request;

pub use assembler::ResultAssembler;
pub use config::{PipelineConfig, SelectionConfig};
pub use error::{ConfigError, ConfigResult};
pub use pipeline::AssessmentPipeline;
pub use request::{AssessmentRequest, AssessmentResponse};
