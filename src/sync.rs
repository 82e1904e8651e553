//! The feed synchronization routine. Three triggers feed one deduplicating
//! head-insert: the initial fetch, push-channel deliveries, and composer
//! submissions. One task owns the loop; the HTTP surface talks to it through
//! a [`Composer`] handle.
use crate::fault::{Cause, Explain, Fallible, UserFacing};
use crate::feed::structs::{NewPost, Post};
use crate::feed::SharedFeed;
use crate::metrics;
use crate::push::{Envelope, EnvelopeStream, PushChannel};
use crate::source::{PostSource, RequestContext};
use anyhow::anyhow;
use futures::channel::{mpsc, oneshot};
use futures::future::ready;
use futures::stream::{self, StreamExt};
use futures::SinkExt;
use std::time::Duration;
use tracing::{error, info, warn};

const COMPOSER_DOWN: UserFacing = UserFacing {
    cause: Cause::ServerError,
    text: "Couldn't reach the feed",
};

/// A composer submission waiting for the sync loop to run it.
pub struct ComposeRequest {
    new_post: NewPost,
    reply: oneshot::Sender<Fallible<Post>>,
}

/// Cloneable handle for the composer path. Submissions are executed by the
/// sync loop so that the check-then-insert stays on a single task.
#[derive(Clone)]
pub struct Composer {
    tx: mpsc::Sender<ComposeRequest>,
}

impl Composer {
    pub fn channel() -> (Composer, mpsc::Receiver<ComposeRequest>) {
        let (tx, rx) = mpsc::channel(16);
        (Composer { tx }, rx)
    }

    /// Submit a new post and wait for the created record. On success the post
    /// is already in the feed, so the author sees it without waiting for the
    /// push channel to echo it back.
    pub async fn compose(&self, new_post: NewPost) -> Fallible<Post> {
        let (reply, response) = oneshot::channel();
        self.tx
            .clone()
            .send(ComposeRequest { new_post, reply })
            .await
            .map_err(|e| anyhow!("sync loop unreachable: {}", e).explain(COMPOSER_DOWN))?;
        response
            .await
            .map_err(|_| anyhow!("sync loop dropped the request").explain(COMPOSER_DOWN))?
    }
}

/// One mounted view's synchronizer.
pub struct FeedSync<S, C> {
    source: S,
    channel: C,
    ctx: RequestContext,
    feed: SharedFeed,
    reconnect_delay: Duration,
    /// Highest push cursor seen so far. Replay asks for everything after this.
    cursor: Option<u64>,
}

enum Input {
    Delivery(anyhow::Result<Envelope>),
    Disconnected,
    Compose(ComposeRequest),
}

impl<S: PostSource, C: PushChannel> FeedSync<S, C> {
    pub fn new(
        source: S,
        channel: C,
        ctx: RequestContext,
        feed: SharedFeed,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            source,
            channel,
            ctx,
            feed,
            reconnect_delay,
            cursor: None,
        }
    }

    /// Establish the feed's starting state. Runs exactly once per mount; a
    /// failure sets the error flag and that's that, no retry. Nothing escapes
    /// to the caller.
    pub async fn initial_load(&self) {
        match self.source.fetch_posts(&self.ctx).await {
            Ok(raws) => {
                let mut posts = Vec::with_capacity(raws.len());
                for raw in raws {
                    match raw.validate() {
                        Ok(post) => posts.push(post),
                        Err(_) => metrics::FEED_INSERTS.with_label_values(&["invalid"]).inc(),
                    }
                }
                info!(posts = posts.len(), "initial feed load complete");
                self.feed.replace_all(posts);
                metrics::INITIAL_LOADS.with_label_values(&["ok"]).inc();
            }
            Err(e) => {
                error!("initial feed load failed: {}", e.internal);
                self.feed.mark_failed();
                metrics::INITIAL_LOADS.with_label_values(&["err"]).inc();
            }
        }
    }

    /// Load once, then keep the feed live until the task is dropped. Each time
    /// the push channel drops, wait out the delay, subscribe again, then replay
    /// whatever the server logged past our cursor.
    pub async fn run(mut self, mut compose_rx: mpsc::Receiver<ComposeRequest>) {
        self.initial_load().await;
        let mut first = true;
        loop {
            if !first {
                self.idle(&mut compose_rx).await;
                metrics::CHANNEL_RECONNECTS.inc();
            }
            first = false;
            let deliveries = match self.channel.subscribe(&self.ctx).await {
                Ok(deliveries) => deliveries,
                Err(e) => {
                    warn!("couldn't open push channel: {}", e.internal);
                    continue;
                }
            };
            info!("push channel subscribed");
            // Replay only once the new subscription is open, so no event can
            // land between the two. Anything both the replay and the live
            // stream carry is absorbed by the duplicate check.
            self.replay_missed().await;
            self.pump(deliveries, &mut compose_rx).await;
        }
    }

    /// Wait out the reconnect delay. Composer submissions don't depend on the
    /// push channel, so they keep being served while it's down.
    async fn idle(&mut self, compose_rx: &mut mpsc::Receiver<ComposeRequest>) {
        let deadline =
            stream::once(actix_rt::time::delay_for(self.reconnect_delay)).map(|_| None);
        let mut inputs = stream::select(deadline, compose_rx.map(Some));
        while let Some(input) = inputs.next().await {
            match input {
                Some(request) => self.handle_compose(request).await,
                None => return,
            }
        }
    }

    /// Serve deliveries and composer requests until the channel drops.
    async fn pump(
        &mut self,
        deliveries: EnvelopeStream,
        compose_rx: &mut mpsc::Receiver<ComposeRequest>,
    ) {
        let deliveries = deliveries
            .map(Input::Delivery)
            .chain(stream::once(ready(Input::Disconnected)));
        let mut inputs = stream::select(deliveries, compose_rx.map(Input::Compose));
        while let Some(input) = inputs.next().await {
            match input {
                Input::Delivery(Ok(envelope)) => self.deliver(envelope),
                Input::Delivery(Err(e)) => {
                    warn!("push channel failed: {}", e);
                    return;
                }
                Input::Disconnected => {
                    warn!("push channel ended");
                    return;
                }
                Input::Compose(request) => self.handle_compose(request).await,
            }
        }
    }

    /// One push delivery: advance the cursor, validate, dedup-insert.
    fn deliver(&mut self, envelope: Envelope) {
        self.cursor = Some(match self.cursor {
            Some(cursor) => cursor.max(envelope.cursor),
            None => envelope.cursor,
        });
        match envelope.post.validate() {
            Ok(post) => {
                self.feed.insert_if_absent(post);
            }
            Err(_) => metrics::FEED_INSERTS.with_label_values(&["invalid"]).inc(),
        }
    }

    /// Ask the source for every event past our cursor and run each through the
    /// normal delivery path. Dedup absorbs any overlap with what we did see.
    async fn replay_missed(&mut self) {
        guard!(let Some(cursor) = self.cursor else {
            // Never received anything; the fresh subscription starts from live.
            return
        });
        match self.source.fetch_since(&self.ctx, cursor).await {
            Ok(missed) => {
                if !missed.is_empty() {
                    info!(
                        events = missed.len(),
                        "replaying events missed while disconnected"
                    );
                }
                for envelope in missed {
                    metrics::REPLAYED_EVENTS.inc();
                    self.deliver(envelope);
                }
            }
            Err(e) => warn!("couldn't replay missed events: {}", e.internal),
        }
    }

    async fn handle_compose(&mut self, request: ComposeRequest) {
        let result = self.submit(request.new_post).await;
        // The requester may have gone away by now; that's their business.
        let _ = request.reply.send(result);
    }

    async fn submit(&mut self, new_post: NewPost) -> Fallible<Post> {
        let raw = self.source.submit_post(&self.ctx, new_post).await?;
        let post = raw.validate().map_err(|e| {
            metrics::FEED_INSERTS.with_label_values(&["invalid"]).inc();
            e.explain(UserFacing {
                cause: Cause::InvalidRecord,
                text: "The server returned an unusable post record",
            })
        })?;
        // Insert before replying so the author's next snapshot has their post.
        // When the channel echoes it back, the duplicate check drops the copy.
        self.feed.insert_if_absent(post.clone());
        Ok(post)
    }
}
