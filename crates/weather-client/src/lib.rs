//! Current weather for an area of interest.
//!
//! The pipeline only sees [`WeatherAdapter`]; [`OpenMeteoClient`] is the
//! bundled implementation.

pub mod adapter;
pub mod error;
pub mod open_meteo;

pub use adapter::WeatherAdapter;
pub use error::{Result, WeatherError};
pub use open_meteo::{OpenMeteoClient, WeatherConfig};
