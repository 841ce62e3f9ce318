use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};
use weather_core::WeatherProvider;

use super::{
    api::SlackClient,
    blocks::Message,
    events::{Envelope, Inbound, InteractionPayload, SlackEvent},
};
use crate::handlers::{self, Responder};

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Keeps a Socket Mode connection open and hands every envelope to the handlers.
pub struct SocketModeRunner {
    slack: Arc<SlackClient>,
    provider: Arc<dyn WeatherProvider>,
}

impl SocketModeRunner {
    pub fn new(slack: Arc<SlackClient>, provider: Arc<dyn WeatherProvider>) -> Self {
        Self { slack, provider }
    }

    /// Serve forever. Fails only if the very first connection cannot be opened.
    pub async fn run(&self) -> Result<()> {
        let mut connected_once = false;

        loop {
            match self.serve_connection(&mut connected_once).await {
                Ok(()) => info!("Socket Mode connection closed, reconnecting"),
                Err(e) if !connected_once => return Err(e),
                Err(e) => warn!(error = ?e, "Socket Mode connection failed, reconnecting"),
            }

            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    /// Run one websocket connection until Slack closes or asks us to reconnect.
    pub(crate) async fn serve_connection(&self, connected_once: &mut bool) -> Result<()> {
        let url = self.slack.open_connection().await?;
        let (ws, _) = connect_async(url.as_str())
            .await
            .context("Failed to connect to the Socket Mode websocket")?;
        *connected_once = true;
        info!("Connected to Slack in Socket Mode");

        let (mut sink, mut stream) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

        let writer = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = sink.send(frame).await {
                    warn!(error = %e, "Failed to write to Socket Mode websocket");
                    break;
                }
            }
        });

        let result = loop {
            let Some(frame) = stream.next().await else {
                break Ok(());
            };

            match frame.context("Failed to read from Socket Mode websocket") {
                Ok(WsMessage::Text(text)) => {
                    if !self.dispatch(text.as_str(), &tx) {
                        break Ok(());
                    }
                }
                Ok(WsMessage::Close(close)) => {
                    debug!(?close, "Slack closed the websocket");
                    break Ok(());
                }
                Ok(_) => {}
                Err(e) => break Err(e),
            }
        };

        // The writer only stops once every queued ack is on the wire.
        drop(tx);
        if let Err(e) = writer.await {
            warn!(error = %e, "Socket Mode writer task failed");
        }

        result
    }

    /// Queue the ack for each envelope, then hand it to a handler task.
    /// Returns `false` when the connection should be dropped.
    fn dispatch(&self, text: &str, tx: &mpsc::UnboundedSender<WsMessage>) -> bool {
        let envelope = match Envelope::parse(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = ?e, "Dropping unreadable Socket Mode frame");
                return true;
            }
        };

        let envelope_id = envelope.envelope_id.clone();
        if let Some(id) = &envelope_id {
            let _ = tx.send(ack_frame(id));
        }

        let inbound = match envelope.into_inbound() {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(error = ?e, ?envelope_id, "Acked but dropped an undecodable envelope");
                return true;
            }
        };

        match inbound {
            Inbound::Hello => debug!("Socket Mode hello"),
            Inbound::Disconnect { reason } => {
                info!(?reason, "Slack requested a reconnect");
                return false;
            }
            Inbound::Event { envelope_id, event } => {
                debug!(envelope_id = %envelope_id, "events_api envelope");
                let channel = match &event {
                    SlackEvent::Message(message) => Some(message.channel.clone()),
                    SlackEvent::Unsupported => None,
                };
                let responder = self.responder(envelope_id, channel);

                tokio::spawn(async move {
                    if let Err(e) = handlers::on_event(event, &responder).await {
                        error!(error = ?e, "Message handler failed");
                    }
                });
            }
            Inbound::Interaction { envelope_id, payload } => {
                debug!(envelope_id = %envelope_id, "interactive envelope");
                let channel = match &payload {
                    InteractionPayload::BlockActions(actions) => {
                        actions.channel.as_ref().map(|c| c.id.clone())
                    }
                    InteractionPayload::Unsupported => None,
                };
                let responder = self.responder(envelope_id, channel);
                let provider = Arc::clone(&self.provider);

                tokio::spawn(async move {
                    if let Err(e) =
                        handlers::on_interaction(payload, &responder, provider.as_ref()).await
                    {
                        error!(error = ?e, "Interaction handler failed");
                    }
                });
            }
            Inbound::Other { kind, .. } => {
                debug!(kind = %kind, "Ignoring unsupported Socket Mode envelope");
            }
        }

        true
    }

    fn responder(&self, envelope_id: String, channel: Option<String>) -> EnvelopeResponder {
        EnvelopeResponder { envelope_id, channel, slack: Arc::clone(&self.slack) }
    }
}

fn ack_frame(envelope_id: &str) -> WsMessage {
    WsMessage::text(json!({ "envelope_id": envelope_id }).to_string())
}

/// Replies through `chat.postMessage`; the envelope ack was queued by `dispatch`.
struct EnvelopeResponder {
    envelope_id: String,
    channel: Option<String>,
    slack: Arc<SlackClient>,
}

#[async_trait]
impl Responder for EnvelopeResponder {
    async fn ack(&self) -> Result<()> {
        // Already on the writer queue before this handler was spawned.
        Ok(())
    }

    async fn say(&self, message: Message) -> Result<()> {
        let channel = self
            .channel
            .as_deref()
            .ok_or_else(|| anyhow!("Envelope {} has no channel to reply to", self.envelope_id))?;
        self.slack.post_message(channel, &message).await
    }
}
