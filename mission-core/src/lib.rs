#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::unescaped_backticks)]

//! Core wire codec, sensor decoding and link traits for mission devices.

/// Common constants and units.
pub mod common;
/// Message codec and tag tables.
pub mod codec;
/// Device type definitions.
pub mod device_type;
/// Rotation and vector types.
pub mod geometry;
/// An interface to the transport.
pub mod link;
/// Sensor data decoding and configuration.
pub mod sensor;
/// Vibration patterns.
pub mod vibration;

mod error;

pub use error::ValidationError;
