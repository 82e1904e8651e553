//! `fault::Fault` pairs a Rust error with a description safe to show to feed users.
//! The internal half may mention hostnames, tokens or wire payloads, so only the
//! user-facing half ever leaves the process.

mod extensions;
mod integrations;
pub mod userfacing;

pub use extensions::*;
pub use userfacing::{Cause, UserFacing};
use std::fmt;
use std::fmt::{Display, Formatter};

/// An error with two faces: the real one for the log, a sanitized one for users.
#[derive(Debug)]
pub struct Fault {
    /// The underlying error from whichever call failed. May contain sensitive
    /// details and must never be shown to users.
    pub internal: anyhow::Error,
    /// A user-friendly description with nothing sensitive in it.
    pub external: UserFacing,
}

/// Displaying a Fault shows only the external half. The internal error stays private.
impl Display for Fault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::result::Result<(), fmt::Error> {
        write!(f, "{}", self.external)
    }
}

/// Return type of a function that could fail with a Fault.
pub type Fallible<T> = Result<T, Fault>;
