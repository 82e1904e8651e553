mod api;
mod config;
mod fault;
mod feed;
mod metrics;
mod push;
mod source;
mod sync;

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate guard;

use crate::config::Config;
use crate::feed::SharedFeed;
use crate::push::ws::WsPushChannel;
use crate::source::http::HttpPostSource;
use crate::source::RequestContext;
use crate::sync::{Composer, FeedSync};
use actix_service::Service;
use actix_web::{dev::ServiceResponse, middleware, web, App, HttpServer};
use futures::future::FutureExt;
use std::time::Duration;
use tracing::{info, Level};

fn main() {
    let args: Vec<_> = std::env::args().collect();
    guard!(let [_, config_file_path, ..] = &args[..] else {
        eprintln!("First argument should be path to config file");
        return
    });

    let config = Config::from_file(config_file_path);

    // Set up logger output
    let subscriber_builder = tracing_subscriber::fmt().with_max_level(Level::DEBUG);
    if config.human_logs {
        subscriber_builder.init();
    } else {
        subscriber_builder.json().init();
    }

    info!("starting feedsync");

    let sys = actix_rt::System::new("feedsync");

    // Mount the feed and hand the composer side to the HTTP surface
    let feed = SharedFeed::default();
    let (composer, compose_rx) = Composer::channel();

    // The sync loop owns the outgoing clients, so build them on the arbiter
    let sync_feed = feed.clone();
    let sync_config = config.clone();
    actix_rt::spawn(async move {
        let source = HttpPostSource::new(&sync_config).expect("invalid api_base_url");
        let channel = WsPushChannel::new(&sync_config).expect("invalid push_url");
        let ctx = RequestContext::new(sync_config.user_id, sync_config.auth_token.clone());
        info!(user_id = %sync_config.user_id, "mounting feed");
        FeedSync::new(
            source,
            channel,
            ctx,
            sync_feed,
            Duration::from_secs(sync_config.reconnect_delay_secs),
        )
        .run(compose_rx)
        .await;
    });

    let state = api::State { feed, composer };

    // Start the feed API server
    info!(
        addr = &config.feed_listen_address[..],
        "starting feed API server"
    );
    let max_body_size = config.max_body_size;
    HttpServer::new(move || {
        App::new()
            // Middleware for Prometheus
            .wrap_fn(|request, srv| srv.call(request).map(increment_response_metrics))
            .data(state.clone())
            // enable logger
            .wrap(middleware::Logger::default())
            // limit size of the payload (global configuration)
            .data(web::JsonConfig::default().limit(max_body_size))
            .service(web::scope("/feed").configure(api::view::configure))
    })
    .bind(config.feed_listen_address.clone())
    .expect("couldn't start feed HTTP server")
    .run();

    // Start the metrics server
    info!(
        addr = &config.metrics_address[..],
        "starting metrics server"
    );
    HttpServer::new(|| {
        App::new().service(
            web::scope("/metrics")
                .service(web::resource("/").route(web::get().to(metrics::endpoint::gather)))
                .service(web::resource("").route(web::get().to(metrics::endpoint::gather))),
        )
    })
    .bind(config.metrics_address)
    .expect("couldn't start metrics server")
    .run();

    sys.run().expect("actix runtime terminated");
}

/// If response is OK, increment the metrics for HTTP statuses.
fn increment_response_metrics<E, B>(
    response: Result<ServiceResponse<B>, E>,
) -> Result<ServiceResponse<B>, E> {
    match response {
        Ok(response) => {
            metrics::HTTP_RESPONSES
                .with_label_values(&[response.status().as_str()])
                .inc();
            Ok(response)
        }
        other => other,
    }
}
