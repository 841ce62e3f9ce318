use anyhow::{Context, Result, anyhow};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_WEATHER_API_URL: &str = "https://weatherapi-com.p.rapidapi.com";
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

/// Credentials for the RapidAPI-hosted WeatherAPI.com forecast endpoint.
#[derive(Debug, Clone)]
pub struct WeatherApiConfig {
    pub api_key: String,
    pub api_host: String,
    pub base_url: String,
}

/// Slack tokens: the bot token posts messages, the app-level token opens the socket.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    pub app_token: String,
    pub api_url: String,
}

/// Top-level configuration, read from the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub slack: SlackConfig,
    pub weather: WeatherApiConfig,

    /// Kept for parity with HTTP deployments; Socket Mode does not listen on it.
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required: `SLACK_BOT_TOKEN`, `SLACK_APP_TOKEN`, `RAPIDAPI_KEY`, `RAPIDAPI_HOST`.
    /// Optional: `PORT`, `WEATHER_API_URL`, `SLACK_API_URL`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
                anyhow!(
                    "Missing required environment variable {key}.\n\
                     Hint: set it in the environment or in a .env file next to the bot."
                )
            })
        };

        let port = match lookup("PORT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got '{raw}'"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            slack: SlackConfig {
                bot_token: required("SLACK_BOT_TOKEN")?,
                app_token: required("SLACK_APP_TOKEN")?,
                api_url: lookup("SLACK_API_URL")
                    .unwrap_or_else(|| DEFAULT_SLACK_API_URL.to_string()),
            },
            weather: WeatherApiConfig {
                api_key: required("RAPIDAPI_KEY")?,
                api_host: required("RAPIDAPI_HOST")?,
                base_url: lookup("WEATHER_API_URL")
                    .unwrap_or_else(|| DEFAULT_WEATHER_API_URL.to_string()),
            },
            port,
        })
    }
}
