#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::unescaped_backticks)]

//! A host-side session layer for mission motion and pressure sensors.
//!
//! A [`Controller`] owns a [`Link`](mission_core::link::Link) and runs a task that
//! decodes inbound packets, coalesces requests and publishes typed events for each device.

/// The session and its per-device handles.
pub mod controller;
/// Host-side device state.
pub mod device;
/// Error definitions.
pub mod error;
/// Links provided by this crate.
pub mod link;
/// Mesh events.
pub mod mesh;
/// Commonly used types.
pub mod prelude;

pub use mission_core as core;

pub use controller::Controller;
