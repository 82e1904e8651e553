use crate::fault::{Cause, Explain, Fallible, UserFacing};
use crate::feed::structs::raw_fixture;
use crate::push::{Envelope, EnvelopeStream, PushChannel};
use crate::source::RequestContext;
use anyhow::anyhow;
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::stream;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type Session = mpsc::UnboundedReceiver<anyhow::Result<Envelope>>;

/// A mock implementation of push::PushChannel. Each scripted session becomes
/// one subscription; dropping a session's sender ends that subscription's
/// stream, which is how tests simulate a disconnect.
#[derive(Clone, Default)]
pub struct MockChannel {
    sessions: Arc<Mutex<VecDeque<Session>>>,
    subscribes: Arc<Mutex<u32>>,
    fail_subscribe: Arc<Mutex<bool>>,
}

impl MockChannel {
    /// Queue one subscription's worth of deliveries and hand back its sender.
    pub fn script_session(&self) -> mpsc::UnboundedSender<anyhow::Result<Envelope>> {
        let (tx, rx) = mpsc::unbounded();
        self.sessions.lock().unwrap().push_back(rx);
        tx
    }

    pub fn subscribe_count(&self) -> u32 {
        *self.subscribes.lock().unwrap()
    }

    /// Make every subscribe attempt fail until cleared.
    pub fn set_fail_subscribe(&self, fail: bool) {
        *self.fail_subscribe.lock().unwrap() = fail;
    }
}

#[async_trait(?Send)]
impl PushChannel for MockChannel {
    async fn subscribe(&self, _ctx: &RequestContext) -> Fallible<EnvelopeStream> {
        *self.subscribes.lock().unwrap() += 1;
        if *self.fail_subscribe.lock().unwrap() {
            return Err(anyhow!("mock subscribe failure").explain(UserFacing {
                cause: Cause::ChannelDown,
                text: "Live updates are unavailable",
            }));
        }
        match self.sessions.lock().unwrap().pop_front() {
            Some(rx) => Ok(Box::pin(rx)),
            // No session scripted: a subscription that just never delivers.
            None => Ok(Box::pin(stream::pending::<anyhow::Result<Envelope>>())),
        }
    }
}

/// One delivery carrying a regular post with the given id.
pub fn envelope(cursor: u64, post_id: Uuid, content: &str) -> Envelope {
    Envelope {
        cursor,
        post: raw_fixture(Some(post_id), content),
    }
}
