use std::{net::SocketAddr, time::Duration};

use mission_core::{
    common::{DEFAULT_RECONNECT_DELAY, DEFAULT_TIMEOUT},
    link::ReconnectPolicy,
};

const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Options of [`WebSocket`](crate::WebSocket) and [`Gateway`](crate::Gateway).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WebSocketOption {
    /// Reopen the link after it is lost.
    pub reconnect: bool,
    /// Delay before the link is reopened.
    pub reconnect_delay: Duration,
    /// Timeout of the opening handshake.
    pub timeout: Duration,
}

impl Default for WebSocketOption {
    fn default() -> Self {
        Self {
            reconnect: true,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl WebSocketOption {
    pub(crate) fn reconnect_policy(&self) -> ReconnectPolicy {
        reconnect_policy(self.reconnect, self.reconnect_delay)
    }
}

/// Options of [`Udp`](crate::Udp).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UdpOption {
    /// Reopen the link after it is lost.
    pub reconnect: bool,
    /// Delay before the link is reopened.
    pub reconnect_delay: Duration,
    /// Local address to bind. An ephemeral port on the unspecified address if [`None`].
    pub local_addr: Option<SocketAddr>,
    /// Size of the receive buffer. Longer datagrams are truncated.
    pub buffer_size: usize,
}

impl Default for UdpOption {
    fn default() -> Self {
        Self {
            reconnect: true,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            local_addr: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl UdpOption {
    pub(crate) fn reconnect_policy(&self) -> ReconnectPolicy {
        reconnect_policy(self.reconnect, self.reconnect_delay)
    }
}

fn reconnect_policy(reconnect: bool, delay: Duration) -> ReconnectPolicy {
    if reconnect {
        ReconnectPolicy::Delayed(delay)
    } else {
        ReconnectPolicy::Never
    }
}
