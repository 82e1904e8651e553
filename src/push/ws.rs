use crate::config::Config;
use crate::fault::{Cause, ExplainErr, Fallible, UserFacing};
use crate::push::{Envelope, EnvelopeStream, PushChannel};
use crate::source::RequestContext;
use anyhow::anyhow;
use async_trait::async_trait;
use awc::error::WsProtocolError;
use awc::http::header;
use awc::ws::Frame;
use futures::{future, StreamExt};
use url::Url;

/// An implementation of push::PushChannel backed by the AlumniConnect
/// websocket broadcast. Each text frame carries one JSON envelope.
pub struct WsPushChannel {
    client: awc::Client,
    url: Url,
}

impl WsPushChannel {
    pub fn new(config: &Config) -> Result<Self, anyhow::Error> {
        Ok(Self {
            client: awc::Client::new(),
            url: Url::parse(&config.push_url)?,
        })
    }
}

#[async_trait(?Send)]
impl PushChannel for WsPushChannel {
    async fn subscribe(&self, ctx: &RequestContext) -> Fallible<EnvelopeStream> {
        let (_response, framed) = self
            .client
            .ws(self.url.as_str())
            .header(header::AUTHORIZATION, ctx.bearer())
            .connect()
            .await
            .map_err(|e| anyhow!("opening push channel to {}: {}", self.url, e))
            .explain_err(UserFacing {
                cause: Cause::ChannelDown,
                text: "Live updates are unavailable",
            })?;
        // Keepalive pings are the transport's concern; if the connection dies,
        // the subscriber sees an Err item and reconnects.
        Ok(Box::pin(
            framed.filter_map(|frame| future::ready(decode(frame))),
        ))
    }
}

fn decode(frame: Result<Frame, WsProtocolError>) -> Option<anyhow::Result<Envelope>> {
    match frame {
        Ok(Frame::Text(bytes)) | Ok(Frame::Binary(bytes)) => {
            Some(serde_json::from_slice(&bytes).map_err(|e| anyhow!("bad push payload: {}", e)))
        }
        Ok(Frame::Ping(_)) | Ok(Frame::Pong(_)) => None,
        Ok(Frame::Close(reason)) => Some(Err(anyhow!("push channel closed: {:?}", reason))),
        Ok(Frame::Continuation(_)) => Some(Err(anyhow!("unexpected continuation frame"))),
        Err(e) => Some(Err(anyhow!("push channel protocol error: {}", e))),
    }
}
