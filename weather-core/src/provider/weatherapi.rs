use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    config::WeatherApiConfig,
    error::WeatherError,
    model::{ForecastView, LookupOutcome},
};

use super::WeatherProvider;

/// WeatherAPI.com forecast endpoint, reached through RapidAPI.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    api_host: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(config: &WeatherApiConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_host: config.api_host.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Fetch the raw body of a one-day forecast, or `None` when the provider
    /// could not be reached or rejected the request.
    async fn fetch_forecast_body(&self, city: &str) -> Option<String> {
        let url = format!("{}/forecast.json", self.base_url);

        let res = match self
            .http
            .get(&url)
            .query(&[("q", city), ("days", "1")])
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                warn!(error = %e, city, "Failed to send request to WeatherAPI.com (forecast)");
                return None;
            }
        };

        let status = res.status();
        let body = match res.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, city, "Failed to read WeatherAPI forecast response body");
                return None;
            }
        };

        if !status.is_success() {
            debug!(
                %status,
                body = %truncate_body(&body),
                city,
                "WeatherAPI forecast request failed"
            );
            return None;
        }

        Some(body)
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    last_updated_epoch: i64,
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    pressure_mb: f64,
    wind_kph: f64,
    wind_dir: String,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    avgtemp_c: f64,
    daily_chance_of_rain: u8,
}

#[derive(Debug, Deserialize)]
struct WaAstro {
    sunrise: String,
    sunset: String,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    day: WaDay,
    astro: WaAstro,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    current: WaCurrent,
    forecast: WaForecast,
}

impl TryFrom<WaForecastResponse> for ForecastView {
    type Error = WeatherError;

    fn try_from(parsed: WaForecastResponse) -> Result<Self, Self::Error> {
        let WaForecastResponse { location, current, forecast } = parsed;

        let today = forecast.forecastday.into_iter().next().ok_or(WeatherError::NoForecastDay)?;

        let last_updated = unix_to_utc(current.last_updated_epoch)
            .ok_or(WeatherError::InvalidTimestamp(current.last_updated_epoch))?;

        Ok(ForecastView {
            city: location.name,
            country: location.country,
            last_updated,
            icon_url: absolute_icon_url(&current.condition.icon),
            condition: current.condition.text,
            temp_c: current.temp_c,
            feels_like_c: current.feelslike_c,
            humidity_pct: current.humidity,
            pressure_mb: current.pressure_mb,
            wind_kph: current.wind_kph,
            wind_dir: current.wind_dir,
            max_temp_c: today.day.maxtemp_c,
            min_temp_c: today.day.mintemp_c,
            avg_temp_c: today.day.avgtemp_c,
            chance_of_rain_pct: today.day.daily_chance_of_rain,
            sunrise: today.astro.sunrise,
            sunset: today.astro.sunset,
        })
    }
}

/// Reshape a successful forecast body into a [`ForecastView`].
pub fn parse_forecast(body: &str) -> Result<ForecastView, WeatherError> {
    let parsed: WaForecastResponse = serde_json::from_str(body)?;
    ForecastView::try_from(parsed)
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn lookup(&self, city: &str) -> Result<LookupOutcome, WeatherError> {
        let Some(body) = self.fetch_forecast_body(city).await else {
            return Ok(LookupOutcome::CityNotFound);
        };

        let view = parse_forecast(&body)?;
        Ok(LookupOutcome::Found(Box::new(view)))
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

// Icons come back protocol-relative: `//cdn.weatherapi.com/...`.
fn absolute_icon_url(icon: &str) -> String {
    if icon.starts_with("//") { format!("https:{icon}") } else { icon.to_string() }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path, query_param},
    };

    const LONDON: &str = r#"{
        "location": {
            "name": "London",
            "region": "City of London, Greater London",
            "country": "United Kingdom",
            "localtime_epoch": 1697630400
        },
        "current": {
            "last_updated_epoch": 1697629500,
            "temp_c": 12.0,
            "feelslike_c": 10.5,
            "humidity": 82,
            "pressure_mb": 1012.0,
            "wind_kph": 15.1,
            "wind_dir": "WSW",
            "uv": 3.0,
            "condition": {
                "text": "Partly cloudy",
                "icon": "//cdn.weatherapi.com/weather/64x64/day/116.png",
                "code": 1003
            }
        },
        "forecast": {
            "forecastday": [{
                "date": "2023-10-18",
                "day": {
                    "maxtemp_c": 14.2,
                    "mintemp_c": 8.0,
                    "avgtemp_c": 11.3,
                    "daily_chance_of_rain": 74
                },
                "astro": {
                    "sunrise": "07:25 AM",
                    "sunset": "06:01 PM"
                }
            }]
        }
    }"#;

    fn provider_for(base_url: &str) -> WeatherApiProvider {
        WeatherApiProvider::new(&WeatherApiConfig {
            api_key: "KEY".into(),
            api_host: "weatherapi-com.p.rapidapi.com".into(),
            base_url: base_url.into(),
        })
    }

    #[test]
    fn parse_forecast_flattens_first_day() {
        let view = parse_forecast(LONDON).expect("fixture must parse");

        assert_eq!(view.city, "London");
        assert_eq!(view.country, "United Kingdom");
        assert_eq!(view.last_updated.timestamp(), 1697629500);
        assert_eq!(view.condition, "Partly cloudy");
        assert_eq!(view.icon_url, "https://cdn.weatherapi.com/weather/64x64/day/116.png");
        assert_eq!(view.humidity_pct, 82);
        assert_eq!(view.wind_dir, "WSW");
        assert_eq!(view.max_temp_c, 14.2);
        assert_eq!(view.chance_of_rain_pct, 74);
        assert_eq!(view.sunrise, "07:25 AM");
        assert_eq!(view.sunset, "06:01 PM");
    }

    #[test]
    fn parse_forecast_errors_without_forecast_day() {
        let mut json: serde_json::Value = serde_json::from_str(LONDON).unwrap();
        json["forecast"]["forecastday"] = serde_json::json!([]);

        let err = parse_forecast(&json.to_string()).unwrap_err();
        assert!(matches!(err, WeatherError::NoForecastDay));
    }

    #[test]
    fn parse_forecast_errors_on_missing_fields() {
        let err = parse_forecast(r#"{"location": {"name": "London"}}"#).unwrap_err();
        assert!(matches!(err, WeatherError::Decode(_)));
    }

    #[test]
    fn icon_url_keeps_absolute_urls() {
        assert_eq!(absolute_icon_url("https://x/y.png"), "https://x/y.png");
        assert_eq!(absolute_icon_url("//x/y.png"), "https://x/y.png");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(300);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[tokio::test]
    async fn lookup_sends_query_and_rapidapi_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .and(query_param("q", "London"))
            .and(query_param("days", "1"))
            .and(header("X-RapidAPI-Key", "KEY"))
            .and(header("X-RapidAPI-Host", "weatherapi-com.p.rapidapi.com"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LONDON))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = provider_for(&server.uri()).lookup("London").await.unwrap();

        match outcome {
            LookupOutcome::Found(view) => assert_eq!(view.city, "London"),
            LookupOutcome::CityNotFound => panic!("expected a forecast"),
        }
    }

    #[tokio::test]
    async fn lookup_maps_provider_error_to_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .respond_with(ResponseTemplate::new(400).set_body_string(
                r#"{"error":{"code":1006,"message":"No matching location found."}}"#,
            ))
            .mount(&server)
            .await;

        let outcome = provider_for(&server.uri()).lookup("Zzqx123").await.unwrap();
        assert_eq!(outcome, LookupOutcome::CityNotFound);
    }

    #[tokio::test]
    async fn lookup_maps_unreachable_provider_to_not_found() {
        // Nothing listens on port 1.
        let outcome = provider_for("http://127.0.0.1:1").lookup("London").await.unwrap();
        assert_eq!(outcome, LookupOutcome::CityNotFound);
    }

    #[tokio::test]
    async fn lookup_surfaces_malformed_success_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = provider_for(&server.uri()).lookup("London").await.unwrap_err();
        assert!(matches!(err, WeatherError::Decode(_)));
    }
}
