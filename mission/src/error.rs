use mission_core::{
    codec::{DecodeError, ResponseStatus},
    link::{LinkError, LinkKind},
    ValidationError,
};
use thiserror::Error;

/// An error produced by the session.
#[derive(Error, Debug, PartialEq, Clone)]
#[non_exhaustive]
pub enum MissionError {
    /// A packet could not be parsed. The rest of the packet is dropped.
    #[error("{0}")]
    Decode(#[from] DecodeError),
    /// A mesh frame or a lookup addresses an index with no device.
    #[error("Device {0} is not found")]
    DeviceNotFound(usize),
    /// The device reported an error.
    #[error("Device responded with status: {0}")]
    Remote(ResponseStatus),
    /// The transport failed.
    #[error("{0}")]
    Link(#[from] LinkError),
    /// A command was rejected before it reached the wire.
    #[error("{0}")]
    Validation(#[from] ValidationError),
    /// The device disconnected before the request completed.
    #[error("Device is disconnected")]
    Disconnected,
    /// The device did not respond in time.
    #[error("Request timed out")]
    Timeout,
    /// The session has been closed.
    #[error("Session is closed")]
    SessionClosed,
    /// The link cannot be used by this kind of session.
    #[error("{0:?} link is not supported by this session")]
    UnsupportedLink(LinkKind),
    /// The device answered with a value of another property.
    #[error("Unexpected response")]
    UnexpectedResponse,
}
