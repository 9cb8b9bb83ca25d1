use thiserror::Error;

use super::MessageType;

/// A framing error. The remainder of the packet that produced it is abandoned.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum DecodeError {
    /// The tag is not part of the tag table.
    #[error("Unknown tag {tag:#04X} in {table} table")]
    UnknownTag {
        /// The received tag.
        tag: u8,
        /// The name of the table used for lookup.
        table: &'static str,
    },
    /// The packet ended in the middle of a message.
    #[error("Unexpected end of packet: {needed} bytes needed, but {remaining} bytes remain")]
    UnexpectedEnd {
        /// Bytes required.
        needed: usize,
        /// Bytes left in the packet.
        remaining: usize,
    },
    /// A field holds a value outside its domain.
    #[error("Invalid value {value} for {field}")]
    InvalidValue {
        /// The name of the field.
        field: &'static str,
        /// The received value.
        value: u32,
    },
    /// A string is not valid UTF-8.
    #[error("Invalid UTF-8 string")]
    InvalidString,
    /// The message type is not part of the tag table.
    #[error("{0:?} is not supported by the {1} table")]
    Unsupported(MessageType, &'static str),
}
