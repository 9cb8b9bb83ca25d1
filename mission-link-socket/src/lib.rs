#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::unescaped_backticks)]

//! Socket links for mission devices.
//!
//! - [`WebSocket`] talks to a single device directly.
//! - [`Gateway`] talks to a relay that multiplexes devices over a WebSocket.
//! - [`Udp`] talks to such a relay with plain datagrams.

mod gateway;
mod option;
mod udp;
mod websocket;

pub use gateway::Gateway;
pub use option::{UdpOption, WebSocketOption};
pub use udp::Udp;
pub use websocket::WebSocket;
