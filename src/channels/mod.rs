//! Channel abstraction for chat I/O.
//!
//! A [`Channel`] produces a stream of [`IncomingEvent`]s; a [`Messenger`]
//! delivers [`Prompt`]s back. Transports usually implement both.

pub mod cli;
pub mod telegram;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::ChannelError;
use crate::router::{InboundEvent, Prompt};
use crate::session::UserId;

pub use cli::CliChannel;
pub use telegram::TelegramChannel;

/// An event received from a channel, tagged with its sender.
#[derive(Debug, Clone)]
pub struct IncomingEvent {
    /// Name of the channel it arrived on.
    pub channel: &'static str,
    pub user_id: UserId,
    pub event: InboundEvent,
}

impl IncomingEvent {
    pub fn new(channel: &'static str, user_id: UserId, event: InboundEvent) -> Self {
        Self {
            channel,
            user_id,
            event,
        }
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = IncomingEvent> + Send>>;

/// Outbound side: deliver one prompt to one user.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_prompt(&self, user_id: &UserId, prompt: &Prompt) -> Result<(), ChannelError>;
}

/// Inbound side of a transport.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Begin receiving. The stream ends when the transport stops.
    async fn start(&self) -> Result<EventStream, ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError>;
}
