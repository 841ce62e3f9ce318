use chrono::{DateTime, Utc};

/// Flat display record for one city: current conditions plus today's forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastView {
    pub city: String,
    pub country: String,
    pub last_updated: DateTime<Utc>,

    pub condition: String,
    pub icon_url: String,
    pub temp_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_mb: f64,
    pub wind_kph: f64,
    pub wind_dir: String,

    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub avg_temp_c: f64,
    pub chance_of_rain_pct: u8,
    /// Raw provider string, e.g. `06:05 AM`.
    pub sunrise: String,
    pub sunset: String,
}

/// Result of a lookup that reached a decision about the city.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(Box<ForecastView>),
    CityNotFound,
}
