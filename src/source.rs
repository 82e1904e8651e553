pub mod http;
#[cfg(test)]
pub mod mock;

use crate::fault::Fallible;
use crate::feed::structs::{NewPost, RawPost};
use crate::push::Envelope;
use async_trait::async_trait;
use uuid::Uuid;

/// Everything needed to make a call on the viewing user's behalf. Passed
/// explicitly into every source and channel call, so no collaborator ever
/// reads a credential out of ambient state.
#[derive(Clone)]
pub struct RequestContext {
    pub user_id: Uuid,
    token: String,
}

impl RequestContext {
    pub fn new(user_id: Uuid, token: String) -> Self {
        Self { user_id, token }
    }

    /// The Authorization header value. The raw token never leaves this struct
    /// any other way.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

#[async_trait(?Send)]
/// The interface to the remote post source.
pub trait PostSource {
    /// The user's current visible feed, in server-chosen order.
    async fn fetch_posts(&self, ctx: &RequestContext) -> Fallible<Vec<RawPost>>;

    /// Post-creation events with a cursor strictly greater than `cursor`.
    /// Used to recover events missed while the push channel was down.
    async fn fetch_since(&self, ctx: &RequestContext, cursor: u64) -> Fallible<Vec<Envelope>>;

    /// Submit the composer's form. The response is the created record, with a
    /// server-assigned id.
    async fn submit_post(&self, ctx: &RequestContext, new_post: NewPost) -> Fallible<RawPost>;
}
