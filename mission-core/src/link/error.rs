use derive_more::Display;
use thiserror::Error;

#[derive(Error, Debug, Display, PartialEq, Clone)]
#[display("{}", msg)]
/// An error produced by the link.
pub struct LinkError {
    msg: String,
}

impl LinkError {
    /// Creates a new [`LinkError`].
    #[must_use]
    pub fn new(msg: impl ToString) -> Self {
        Self {
            msg: msg.to_string(),
        }
    }

    /// The link is not open.
    #[must_use]
    pub fn closed() -> Self {
        Self::new("Link is closed")
    }
}
