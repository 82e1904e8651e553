lazy_static! {

    pub static ref FEED_INSERTS: prometheus::IntCounterVec = register_int_counter_vec!(
        "feedsync_feed_inserts",
        "Insertions attempted on the feed store, partitioned by outcome",
        &["outcome"] // "inserted", "duplicate" or "invalid"
    )
    .expect("couldn't make FEED_INSERTS");

    pub static ref INITIAL_LOADS: prometheus::IntCounterVec = register_int_counter_vec!(
        "feedsync_initial_loads",
        "How many initial feed loads succeeded/failed",
        &["result"]
    )
    .expect("couldn't make INITIAL_LOADS");

    pub static ref CHANNEL_RECONNECTS: prometheus::IntCounter = register_int_counter!(
        "feedsync_channel_reconnects",
        "How many times the push channel was re-opened after it dropped"
    )
    .expect("couldn't make CHANNEL_RECONNECTS");

    pub static ref REPLAYED_EVENTS: prometheus::IntCounter = register_int_counter!(
        "feedsync_replayed_events",
        "Events recovered via cursor replay after a reconnect"
    )
    .expect("couldn't make REPLAYED_EVENTS");

    pub static ref HANDLER_SECS: prometheus::HistogramVec = register_histogram_vec!(
        "feedsync_handler_secs",
        "Seconds taken for each response, partitioned by endpoint name",
        &["endpoint_name"],
        vec![1.0, 2.0, 4.0, 16.0] // Prometheus buckets
    )
    .expect("couldn't make HANDLER_SECS");

    pub static ref RESPONSES: prometheus::IntCounterVec = register_int_counter_vec!(
        "feedsync_responses",
        "How many responses of Ok/Err per endpoint",
        &["endpoint_name", "result"]
    )
    .expect("couldn't make RESPONSES");

    pub static ref HTTP_RESPONSES: prometheus::IntCounterVec = register_int_counter_vec!(
        "feedsync_http_responses",
        "Count of each HTTP status code served by feedsync responses",
        &["status"]
    )
    .expect("couldn't make HTTP_RESPONSES");
}

pub mod endpoint {
    use actix_web::{http, HttpRequest, HttpResponse};
    use prometheus::Encoder;

    pub fn gather(_req: HttpRequest) -> HttpResponse {
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = vec![];
        let metric_families = prometheus::gather();
        match encoder.encode(&metric_families, &mut buffer) {
            Ok(()) => HttpResponse::build(http::StatusCode::OK).body(buffer),
            Err(e) => {
                let message = format!("{:?}", e);
                HttpResponse::build(http::StatusCode::INTERNAL_SERVER_ERROR).body(message)
            }
        }
    }
}
