use std::{collections::HashMap, time::Duration};

use mission_core::codec::MessageType;
use tokio::time::Instant;

use super::request::{Responder, Response, Update};
use crate::error::MissionError;

struct Entry {
    sent_at: Instant,
    waiters: Vec<Responder>,
    deferred: Option<(Update, Vec<Responder>)>,
}

impl Entry {
    fn new(sent_at: Instant) -> Self {
        Self {
            sent_at,
            waiters: Vec::new(),
            deferred: None,
        }
    }
}

/// A request whose response did not arrive in time.
pub(crate) struct Expired {
    pub(crate) ty: MessageType,
    pub(crate) deferred: Option<(Update, Vec<Responder>)>,
}

/// Requests on the wire and the callers waiting for them, keyed by request type.
///
/// At most one request of each type is in flight. Gets issued while one is in flight join it.
/// Sets issued while one is in flight are deferred, and only the last deferred write is sent.
/// A request unanswered for longer than the response timeout expires, which frees its type.
#[derive(Default)]
pub(crate) struct Ledger {
    entries: HashMap<MessageType, Entry>,
}

impl Ledger {
    pub(crate) fn is_pending(&self, ty: MessageType) -> bool {
        self.entries.contains_key(&ty)
    }

    /// Records a request that was just enqueued.
    pub(crate) fn begin(
        &mut self,
        ty: MessageType,
        waiters: impl IntoIterator<Item = Responder>,
        now: Instant,
    ) {
        self.entries
            .entry(ty)
            .or_insert_with(|| Entry::new(now))
            .waiters
            .extend(waiters);
    }

    /// Adds a waiter to the request in flight.
    pub(crate) fn join(&mut self, ty: MessageType, responder: Responder) {
        if let Some(entry) = self.entries.get_mut(&ty) {
            entry.waiters.push(responder);
        }
    }

    /// Holds a write until the one in flight resolves.
    pub(crate) fn defer(&mut self, update: Update, responder: Responder, now: Instant) {
        let entry = self
            .entries
            .entry(update.message_type())
            .or_insert_with(|| Entry::new(now));
        entry.deferred = Some(match entry.deferred.take() {
            Some((earlier, mut waiters)) => {
                waiters.push(responder);
                (earlier.merge(update), waiters)
            }
            None => (update, vec![responder]),
        });
    }

    /// Resolves every waiter of `ty`.
    ///
    /// Returns the deferred write, if any, which the caller must send and [`Ledger::begin`] again.
    pub(crate) fn resolve(
        &mut self,
        ty: MessageType,
        result: Result<Response, MissionError>,
    ) -> Option<(Update, Vec<Responder>)> {
        let entry = self.entries.remove(&ty)?;
        entry.waiters.into_iter().for_each(|waiter| {
            let _ = waiter.send(result.clone());
        });
        entry.deferred
    }

    /// Removes the requests sent `timeout` or longer before `now` and rejects their waiters with
    /// [`MissionError::Timeout`]. Deferred writes are handed back to be sent.
    pub(crate) fn expire(&mut self, now: Instant, timeout: Duration) -> Vec<Expired> {
        let expired: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.sent_at) >= timeout)
            .map(|(&ty, _)| ty)
            .collect();
        expired
            .into_iter()
            .filter_map(|ty| {
                let entry = self.entries.remove(&ty)?;
                entry.waiters.into_iter().for_each(|waiter| {
                    let _ = waiter.send(Err(MissionError::Timeout));
                });
                Some(Expired {
                    ty,
                    deferred: entry.deferred,
                })
            })
            .collect()
    }

    /// Rejects every waiter, deferred writes included.
    pub(crate) fn reject_all(&mut self, err: MissionError) {
        self.entries.drain().for_each(|(_, entry)| {
            entry
                .waiters
                .into_iter()
                .chain(entry.deferred.into_iter().flat_map(|(_, waiters)| waiters))
                .for_each(|waiter| {
                    let _ = waiter.send(Err(err.clone()));
                });
        });
    }
}
