#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::unescaped_backticks)]

//! A Bluetooth link for mission devices.
//!
//! The host supplies a connection to the peripheral through [`GattPeripheral`]. Each group of messages is written to
//! and notified from its own [`Characteristic`].

mod characteristic;
mod link;
mod option;
mod peripheral;

pub use characteristic::{Characteristic, SERVICE_UUID};
pub use link::Bluetooth;
pub use option::BluetoothOption;
pub use peripheral::{GattPeripheral, Notification};
