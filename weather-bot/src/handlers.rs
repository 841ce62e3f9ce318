//! The two reactions of the bot: prompting on any message and answering a submitted city.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use tracing::{debug, error, info};
use weather_core::{LookupOutcome, WeatherProvider};

use crate::format::{self, CITY_ACTION_ID, CITY_NOT_FOUND, GENERIC_ERROR};
use crate::slack::blocks::Message;
use crate::slack::events::{BlockActions, InteractionPayload, SlackEvent};

/// Reply channel bound to one inbound envelope.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Tell Slack the envelope was received. Must precede any slow work.
    async fn ack(&self) -> Result<()>;

    /// Post `message` where the envelope came from.
    async fn say(&self, message: Message) -> Result<()>;
}

pub async fn on_event(event: SlackEvent, responder: &dyn Responder) -> Result<()> {
    responder.ack().await?;

    let SlackEvent::Message(message) = event else {
        return Ok(());
    };

    if !message.is_from_user() {
        debug!(channel = %message.channel, "Ignoring message not written by a user");
        return Ok(());
    }

    let user = message.user.as_deref().unwrap_or_default();
    responder.say(format::city_prompt(user)).await.context("Failed to post city prompt")
}

pub async fn on_interaction(
    payload: InteractionPayload,
    responder: &dyn Responder,
    provider: &dyn WeatherProvider,
) -> Result<()> {
    responder.ack().await?;

    match payload {
        InteractionPayload::BlockActions(actions) => {
            on_block_actions(actions, responder, provider).await
        }
        InteractionPayload::Unsupported => Ok(()),
    }
}

async fn on_block_actions(
    actions: BlockActions,
    responder: &dyn Responder,
    provider: &dyn WeatherProvider,
) -> Result<()> {
    let Some(action) = actions.actions.into_iter().find(|a| a.action_id == CITY_ACTION_ID) else {
        return Ok(());
    };

    let city = action.value.unwrap_or_default();
    info!(user = %actions.user.id, city = %city, "Weather requested");

    if let Err(e) = answer_city(&city, responder, provider).await {
        error!(error = ?e, city = %city, "Failed to answer weather request");
        responder
            .say(Message::text(GENERIC_ERROR))
            .await
            .context("Failed to post error message")?;
    }

    Ok(())
}

async fn answer_city(
    city: &str,
    responder: &dyn Responder,
    provider: &dyn WeatherProvider,
) -> Result<()> {
    let reply = match provider.lookup(city).await? {
        LookupOutcome::CityNotFound => Message::text(CITY_NOT_FOUND),
        LookupOutcome::Found(view) => format::forecast_message(&view, &Local),
    };

    responder.say(reply).await
}
