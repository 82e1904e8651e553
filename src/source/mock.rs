use crate::fault::{Cause, Explain, Fallible, UserFacing};
use crate::feed::structs::{AuthorRef, Engagement, NewPost, RawPost};
use crate::push::Envelope;
use crate::source::{PostSource, RequestContext};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::offset::Utc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type Scripted<T> = Arc<Mutex<T>>;

/// A mock implementation of source::PostSource
#[derive(Clone, Default)]
pub struct MockSource {
    posts: Scripted<Vec<RawPost>>,
    events: Scripted<Vec<Envelope>>,
    fail_fetch: Scripted<bool>,
    next_post_id: Scripted<Option<Uuid>>,
    submitted: Scripted<Vec<NewPost>>,
}

impl MockSource {
    pub fn set_posts(&self, posts: Vec<RawPost>) {
        *self.posts.lock().unwrap() = posts;
    }

    /// Script what `fetch_since` will hand back on replay.
    pub fn set_events(&self, events: Vec<Envelope>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        *self.fail_fetch.lock().unwrap() = fail;
    }

    /// Pin the id the next `submit_post` response will carry, so a test can
    /// redeliver "the same" post over the push channel.
    pub fn set_next_post_id(&self, id: Uuid) {
        *self.next_post_id.lock().unwrap() = Some(id);
    }

    pub fn submissions(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

#[async_trait(?Send)]
impl PostSource for MockSource {
    async fn fetch_posts(&self, _ctx: &RequestContext) -> Fallible<Vec<RawPost>> {
        if *self.fail_fetch.lock().unwrap() {
            return Err(anyhow!("mock network error").explain(UserFacing {
                cause: Cause::SourceUnavailable,
                text: "Couldn't load the feed",
            }));
        }
        Ok(self.posts.lock().unwrap().clone())
    }

    async fn fetch_since(&self, _ctx: &RequestContext, cursor: u64) -> Fallible<Vec<Envelope>> {
        let events = self.events.lock().unwrap();
        Ok(events.iter().filter(|e| e.cursor > cursor).cloned().collect())
    }

    async fn submit_post(&self, _ctx: &RequestContext, new_post: NewPost) -> Fallible<RawPost> {
        let id = self
            .next_post_id
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(Uuid::new_v4);
        let created = RawPost {
            id: Some(id),
            author: AuthorRef {
                id: Uuid::new_v4(),
                name: "mock author".to_owned(),
                avatar_url: None,
            },
            content: new_post.content.clone(),
            kind: new_post.kind.clone(),
            created_at: Utc::now(),
            engagement: Engagement::default(),
        };
        self.submitted.lock().unwrap().push(new_post);
        Ok(created)
    }
}
