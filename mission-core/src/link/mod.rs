mod error;
mod frame;

use std::{future::Future, time::Duration};

use crate::codec::{TagTable, DEVICE, MESH, PRIMARY};

pub use error::LinkError;
pub use frame::{RxFrame, TxFrame};

/// How the devices behind a link are addressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// A single device.
    Direct,
    /// Devices multiplexed by a relay.
    Mesh,
    /// A device that also relays its peers.
    Primary,
}

impl LinkKind {
    /// The tag table of the top-level messages.
    #[must_use]
    pub fn table(&self) -> &'static TagTable {
        match self {
            LinkKind::Direct => &DEVICE,
            LinkKind::Mesh => &MESH,
            LinkKind::Primary => &PRIMARY,
        }
    }

    /// Returns `true` if device messages are multiplexed by index.
    #[must_use]
    pub const fn is_multiplexed(&self) -> bool {
        !matches!(self, LinkKind::Direct)
    }
}

/// What the session does after the link is lost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReconnectPolicy {
    /// Stay disconnected.
    #[default]
    Never,
    /// Reopen after a delay.
    Delayed(Duration),
    /// Reopen at once.
    Immediate,
}

/// A trait that provides the interface with the device.
pub trait Link: Send {
    /// Opens the link.
    fn open(&mut self) -> impl Future<Output = Result<(), LinkError>> + Send;

    /// Closes the link.
    fn close(&mut self) -> impl Future<Output = Result<(), LinkError>> + Send;

    /// Sends a frame to the device.
    fn send(&mut self, tx: &TxFrame) -> impl Future<Output = Result<(), LinkError>> + Send;

    /// Receives a frame from the device.
    ///
    /// The returned future must be cancel safe: dropping it before completion loses no data.
    fn receive(&mut self) -> impl Future<Output = Result<RxFrame, LinkError>> + Send;

    /// Checks if the link is open.
    #[must_use]
    fn is_open(&self) -> bool;

    /// How the devices behind the link are addressed.
    #[must_use]
    fn kind(&self) -> LinkKind;

    /// What the session does after the link is lost.
    #[must_use]
    fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::Never
    }
}
