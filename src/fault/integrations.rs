//! Integrate Fault with Actix-web so handlers can just return `Fallible<T>`.

use crate::fault::Fault;
use actix_web::{
    http::{header, StatusCode},
    HttpResponse,
};
use serde::Serialize;
use tracing::error;

// Faults can be used as Actix-web errors.
// If a handler returns a Fault, the external portion will be shown to the user.
// The internal portion will only be logged.
impl actix_web::ResponseError for Fault {
    fn status_code(&self) -> StatusCode {
        self.external.cause.into()
    }

    fn error_response(&self) -> HttpResponse {
        error!("{}", self.internal);
        let resp = serde_json::to_string(&ErrBody {
            error: self.to_string(),
        })
        .unwrap_or_else(|e| {
            error!("Serde error: {}", e.to_string());
            "{\"error\": \"ServerError: internal server error\"}".to_owned()
        });
        HttpResponse::build(self.external.cause.into())
            .header(header::CONTENT_TYPE, "application/json")
            .body(resp)
    }
}

#[derive(Serialize)]
struct ErrBody {
    error: String,
}
