use crate::config::Config;
use crate::fault::{Cause, Explain, ExplainErr, Fallible, UserFacing};
use crate::feed::structs::{NewPost, RawPost};
use crate::push::Envelope;
use crate::source::{PostSource, RequestContext};
use anyhow::anyhow;
use async_trait::async_trait;
use awc::http::{header, StatusCode};
use std::time::Duration;
use url::Url;

/// Any failure talking to the source reads the same to the user: the feed
/// didn't load.
const LOAD_FAILED: UserFacing = UserFacing {
    cause: Cause::SourceUnavailable,
    text: "Couldn't load the feed",
};

/// How much JSON we're willing to buffer for one response.
const RESPONSE_LIMIT: usize = 4 * 1024 * 1024;

/// An implementation of source::PostSource backed by the AlumniConnect REST API.
pub struct HttpPostSource {
    client: awc::Client,
    base: Url,
}

impl HttpPostSource {
    pub fn new(config: &Config) -> Result<Self, anyhow::Error> {
        let mut base = Url::parse(&config.api_base_url)?;
        // Url::join drops the last path segment unless the base ends in '/'.
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let client = awc::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .finish();
        Ok(Self { client, base })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
    ) -> Fallible<T> {
        let url = self
            .base
            .join(path)
            .map_err(|e| anyhow!("building url for {}: {}", path, e))
            .explain_err(LOAD_FAILED)?;
        let mut response = self
            .client
            .get(url.as_str())
            .header(header::AUTHORIZATION, ctx.bearer())
            .send()
            .await
            .map_err(|e| anyhow!("requesting {}: {}", url, e))
            .explain_err(LOAD_FAILED)?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow!("{} answered {}", url, status).explain(rejection(status)));
        }
        response
            .json::<T>()
            .limit(RESPONSE_LIMIT)
            .await
            .map_err(|e| anyhow!("decoding body of {}: {}", url, e))
            .explain_err(LOAD_FAILED)
    }
}

#[async_trait(?Send)]
impl PostSource for HttpPostSource {
    async fn fetch_posts(&self, ctx: &RequestContext) -> Fallible<Vec<RawPost>> {
        self.get_json(ctx, &format!("users/{}/feed", ctx.user_id))
            .await
    }

    async fn fetch_since(&self, ctx: &RequestContext, cursor: u64) -> Fallible<Vec<Envelope>> {
        self.get_json(
            ctx,
            &format!("users/{}/feed/events?since={}", ctx.user_id, cursor),
        )
        .await
    }

    async fn submit_post(&self, ctx: &RequestContext, new_post: NewPost) -> Fallible<RawPost> {
        let url = self
            .base
            .join("posts")
            .map_err(|e| anyhow!("building posts url: {}", e))
            .explain_err(SUBMIT_FAILED)?;
        let mut response = self
            .client
            .post(url.as_str())
            .header(header::AUTHORIZATION, ctx.bearer())
            .send_json(&new_post)
            .await
            .map_err(|e| anyhow!("submitting post to {}: {}", url, e))
            .explain_err(SUBMIT_FAILED)?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(anyhow!("{} answered {}", url, status).explain(rejection(status)));
        }
        response
            .json::<RawPost>()
            .limit(RESPONSE_LIMIT)
            .await
            .map_err(|e| anyhow!("decoding created post from {}: {}", url, e))
            .explain_err(SUBMIT_FAILED)
    }
}

const SUBMIT_FAILED: UserFacing = UserFacing {
    cause: Cause::SourceUnavailable,
    text: "Couldn't submit your post",
};

fn rejection(status: StatusCode) -> UserFacing {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UserFacing {
            cause: Cause::BadCredential,
            text: "Your session is no longer valid",
        },
        _ => LOAD_FAILED,
    }
}
