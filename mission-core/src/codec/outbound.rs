use super::{Datum, Message};

/// Messages waiting to be flushed, keyed by tag in insertion order.
///
/// Enqueueing a tag that is already pending replaces its value in place.
#[derive(Debug, Default)]
pub struct Outbound {
    entries: Vec<(u8, Datum)>,
}

impl Outbound {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Enqueues `datum` under `tag`.
    pub fn enqueue(&mut self, tag: u8, datum: impl Into<Datum>) {
        let datum = datum.into();
        match self.entries.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, d)) => *d = datum,
            None => self.entries.push((tag, datum)),
        }
    }

    /// Returns `true` if `tag` is pending.
    #[must_use]
    pub fn contains(&self, tag: u8) -> bool {
        self.entries.iter().any(|(t, _)| *t == tag)
    }

    /// The number of pending messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattens every pending message in insertion order and clears the map.
    pub fn take_messages(&mut self) -> Vec<Message> {
        self.entries
            .drain(..)
            .map(|(tag, datum)| Message::new(tag, datum.into_bytes()))
            .collect()
    }

    /// Flattens the map into a single buffer and clears it.
    pub fn flatten(&mut self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.take_messages()
            .iter()
            .for_each(|msg| msg.write_to(&mut buf));
        buf
    }
}
