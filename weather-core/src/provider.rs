use crate::{LookupOutcome, WeatherError};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod weatherapi;

pub use weatherapi::WeatherApiProvider;

/// Source of one-day forecasts keyed by a free-text city name.
///
/// Any transport or provider-side failure is reported as
/// [`LookupOutcome::CityNotFound`]; only malformed data surfaces as an error.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn lookup(&self, city: &str) -> Result<LookupOutcome, WeatherError>;
}
