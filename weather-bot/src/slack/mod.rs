//! Slack plumbing: Web API calls, Socket Mode transport and Block Kit payloads.

pub mod api;
pub mod blocks;
pub mod events;
pub mod socket;

pub use api::SlackClient;
pub use socket::SocketModeRunner;
