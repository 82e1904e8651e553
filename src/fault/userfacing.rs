use actix_web::http::StatusCode;
use std::fmt;

/// Used to create HTTP responses with the given text and status code.
#[derive(Debug)]
pub struct UserFacing {
    /// A user-facing explanation of what caused the error.
    pub cause: Cause,
    /// Error text that will describe the problem to the user.
    pub text: &'static str,
}

/// A user-facing explanation of what caused the error.
#[derive(Debug, Clone, Copy)]
pub enum Cause {
    /// The remote post source couldn't be reached or answered with an error.
    SourceUnavailable,
    /// The credential in the request context was rejected upstream.
    BadCredential,
    /// A record arrived without a stable id and was refused at the store boundary.
    InvalidRecord,
    /// The push channel is down and live updates have stopped.
    ChannelDown,
    ServerError,
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        // Make fmt::Display the same as fmt::Debug, i.e. each variant's name.
        write!(f, "{:?}", self)
    }
}

impl From<Cause> for StatusCode {
    /// Causes can be mapped to HTTP status codes. UserFacing doesn't use status
    /// codes directly, because some components (e.g. the sync loop) shouldn't
    /// need to know about HTTP codes.
    fn from(cause: Cause) -> StatusCode {
        match cause {
            Cause::SourceUnavailable => StatusCode::BAD_GATEWAY,
            Cause::BadCredential => StatusCode::UNAUTHORIZED,
            Cause::InvalidRecord => StatusCode::UNPROCESSABLE_ENTITY,
            Cause::ChannelDown => StatusCode::SERVICE_UNAVAILABLE,
            Cause::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for UserFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}: {}", self.cause, self.text)
    }
}

impl Default for UserFacing {
    // Default to ServerError and a very vague generic message.
    fn default() -> Self {
        Self {
            cause: Cause::ServerError,
            text: "Internal server error",
        }
    }
}
