use derive_more::{Deref, DerefMut};
use derive_new::new;

use crate::codec::Message;

/// Messages to be sent in one write.
#[derive(new, Clone, Debug, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct TxFrame {
    messages: Vec<Message>,
}

impl TxFrame {
    /// Concatenates every message.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.messages.iter().map(Message::len).sum());
        self.messages.iter().for_each(|msg| msg.write_to(&mut buf));
        buf
    }

    /// Returns the messages.
    #[must_use]
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl From<Vec<Message>> for TxFrame {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

/// Bytes received in one read.
#[derive(new, Clone, Debug, Default, PartialEq, Eq, Deref)]
pub struct RxFrame {
    data: Vec<u8>,
}

impl From<Vec<u8>> for RxFrame {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_bytes() {
        let frame = TxFrame::new(vec![
            Message::new(4, vec![]),
            Message::new(5, vec![3, b'B', b'o', b'b']),
        ]);
        assert_eq!(vec![4, 5, 3, b'B', b'o', b'b'], frame.to_bytes());
        assert_eq!(2, frame.len());
    }
}
