use thiserror::Error;

use crate::common::NAME_MAX_LENGTH;

/// An error produced when a command is rejected before reaching the wire.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ValidationError {
    /// The name is longer than [`NAME_MAX_LENGTH`] bytes.
    #[error("Name must be at most {NAME_MAX_LENGTH} bytes, but {0} bytes are given")]
    NameTooLong(usize),
    /// The string does not fit in a length-prefixed field.
    #[error("String of {0} bytes cannot be length-prefixed by a single byte")]
    StringTooLong(usize),
    /// The device type value is unknown.
    #[error("Invalid device type: {0}")]
    InvalidDeviceType(u8),
    /// The vibration pattern is invalid.
    #[error("Invalid vibration: {0}")]
    InvalidVibration(String),
    /// The address cannot be used by the link.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}
