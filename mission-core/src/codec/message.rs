use derive_more::Display;
use derive_new::new;

/// A flattened message.
#[derive(new, Clone, Debug, PartialEq, Eq, Display)]
#[display("(TAG: {:#04X}, {} bytes)", tag, payload.len())]
pub struct Message {
    /// The wire tag.
    pub tag: u8,
    /// The flattened payload.
    pub payload: Vec<u8>,
}

impl Message {
    /// Appends the tag followed by the payload to `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(self.tag);
        buf.extend_from_slice(&self.payload);
    }

    /// The number of bytes written by [`Message::write_to`].
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.payload.len()
    }

    /// Returns `true` if the message has no payload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
