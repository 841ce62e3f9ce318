//! Core library for the Slack weather bot.
//!
//! This crate defines:
//! - Configuration read from the environment
//! - The weather provider abstraction and the WeatherAPI.com client
//! - The flat `ForecastView` display model
//!
//! It is used by `weather-bot`, but has no Slack knowledge of its own.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use config::{Config, SlackConfig, WeatherApiConfig};
pub use error::WeatherError;
pub use model::{ForecastView, LookupOutcome};
pub use provider::{WeatherApiProvider, WeatherProvider};
