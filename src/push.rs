#[cfg(test)]
pub mod mock;
pub mod ws;

use crate::fault::Fallible;
use crate::feed::structs::RawPost;
use crate::source::RequestContext;
use async_trait::async_trait;
use futures::Stream;
use serde::Deserialize;
use std::pin::Pin;

/// One push-channel delivery: a single post-creation event.
#[derive(Deserialize, Clone, Debug)]
pub struct Envelope {
    /// Monotonically increasing position in the server's event log. Lets a
    /// reconnecting subscriber ask for everything it missed instead of waiting
    /// for a full remount.
    pub cursor: u64,
    pub post: RawPost,
}

/// Deliveries in the order the channel produces them. An `Err` item means the
/// channel is no longer usable and the subscriber should reconnect.
pub type EnvelopeStream = Pin<Box<dyn Stream<Item = anyhow::Result<Envelope>>>>;

#[async_trait(?Send)]
/// The interface to the remote push channel.
pub trait PushChannel {
    /// Open one subscription. The connection's lifetime belongs to the channel
    /// implementation; dropping the stream just stops delivery.
    async fn subscribe(&self, ctx: &RequestContext) -> Fallible<EnvelopeStream>;
}
