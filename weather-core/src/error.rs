use thiserror::Error;

/// Failures that are not "the provider did not recognize the city".
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Failed to parse WeatherAPI forecast JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("WeatherAPI response contained no forecastday data")]
    NoForecastDay,

    #[error("WeatherAPI returned an out-of-range update time: {0}")]
    InvalidTimestamp(i64),
}
