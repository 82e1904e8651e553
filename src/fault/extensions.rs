//! Convenience methods to turn any error (from any library) into a Fault.
use crate::fault::{Fault, UserFacing};

pub trait Explain {
    /// Convert an error into a Fault by explaining it to your users.
    fn explain(self, external: UserFacing) -> Fault;
}

impl<Internal: Into<anyhow::Error>> Explain for Internal {
    fn explain(self, external: UserFacing) -> Fault {
        Fault {
            internal: self.into(),
            external,
        }
    }
}

/// Any regular internal error can be turned into a Fault, using the default
/// user-facing text. To give it a custom one, use `internal.explain(UserFacing)`.
impl<Internal: Into<anyhow::Error>> From<Internal> for Fault {
    fn from(internal: Internal) -> Fault {
        internal.explain(Default::default())
    }
}

pub trait ExplainErr<T> {
    /// Convert a result's error into a Fault by explaining it to your users.
    fn explain_err(self, external: UserFacing) -> Result<T, Fault>;
}

impl<T, E> ExplainErr<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn explain_err(self, external: UserFacing) -> Result<T, Fault> {
        self.map_err(|e| e.explain(external))
    }
}
