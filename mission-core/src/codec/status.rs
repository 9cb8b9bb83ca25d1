use derive_more::Display;

use super::DecodeError;

/// The status byte carried by responses relayed through a mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[repr(u8)]
pub enum ResponseStatus {
    /// The relay could not deliver the request.
    #[display("failed to send")]
    FailedToSend = 0,
    /// Success.
    #[display("no error")]
    NoError = 1,
    /// The addressed device or property does not exist.
    #[display("not found")]
    NotFound = 2,
    /// The device rejected the request.
    #[display("invalid")]
    Invalid = 3,
}

impl ResponseStatus {
    /// Returns `true` if the status reports success.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, ResponseStatus::NoError)
    }
}

impl TryFrom<u8> for ResponseStatus {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::FailedToSend),
            1 => Ok(Self::NoError),
            2 => Ok(Self::NotFound),
            3 => Ok(Self::Invalid),
            v => Err(DecodeError::InvalidValue {
                field: "status",
                value: v as _,
            }),
        }
    }
}
