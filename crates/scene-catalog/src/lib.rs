//! Scene selection and band reading.
//!
//! The pipeline sees imagery only through the [`ImageryCatalog`] trait:
//! [`SceneSelector`] searches it for the best recent scene and
//! [`BandReader`] fetches that scene's red, near-infrared and classification
//! bands as aligned grids. [`StacCatalog`] is the bundled implementation.

pub mod catalog;
pub mod error;
pub mod reader;
pub mod selector;
pub mod stac;

pub use catalog::ImageryCatalog;
pub use error::{CatalogError, Result};
pub use reader::{BandReader, BandSet, VisibleBands};
pub use selector::{pick_best, SceneSelector};
pub use stac::{StacCatalog, StacConfig};
