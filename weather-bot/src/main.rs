//! Binary crate for the Slack weather bot.
//!
//! This crate focuses on:
//! - The Socket Mode connection to Slack
//! - Reacting to messages and city submissions
//! - Rendering forecasts as Block Kit messages

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use weather_core::{Config, WeatherApiProvider, WeatherProvider};

use crate::slack::{SlackClient, SocketModeRunner};

mod format;
mod handlers;
mod logging;
mod slack;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing()?;

    // reqwest and tokio-tungstenite may both pull a rustls backend in.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(port = config.port, "Starting weather bot in Socket Mode");

    let slack = Arc::new(SlackClient::new(&config.slack));
    let provider: Arc<dyn WeatherProvider> = Arc::new(WeatherApiProvider::new(&config.weather));
    let runner = SocketModeRunner::new(slack, provider);

    tokio::select! {
        res = runner.run() => res,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down");
            Ok(())
        }
    }
}
