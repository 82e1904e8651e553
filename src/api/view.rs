//! The one view this daemon renders for: a snapshot endpoint the renderer
//! polls, and the composer endpoint that creates posts through the sync loop.
use crate::api::{observe, State};
use crate::fault::Fallible;
use crate::feed::structs::{NewPost, Post};
use crate::feed::Snapshot;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .route("", web::get().to(get_feed))
            .route("/posts", web::post().to(compose_post)),
    );
}

// The renderer's whole input: lifecycle state, revision, posts head-first.
async fn get_feed(state: web::Data<State>) -> Fallible<web::Json<Snapshot>> {
    observe("get_feed", || async { Ok(web::Json(state.feed.snapshot())) }).await
}

// Run the composer path: submit upstream, then show the author their own post
// immediately. The created record comes back in the response.
async fn compose_post(
    state: web::Data<State>,
    body: web::Json<NewPost>,
) -> Fallible<web::Json<Post>> {
    observe("compose_post", || async {
        let post = state.composer.compose(body.into_inner()).await?;
        Ok(web::Json(post))
    })
    .await
}
