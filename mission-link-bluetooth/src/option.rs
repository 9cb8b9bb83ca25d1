use std::time::Duration;

use mission_core::common::DEFAULT_TIMEOUT;

/// Options of [`Bluetooth`](crate::Bluetooth).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BluetoothOption {
    /// The peripheral also relays its peers.
    pub primary: bool,
    /// Timeout of connecting and subscribing to the characteristics.
    pub timeout: Duration,
}

impl Default for BluetoothOption {
    fn default() -> Self {
        Self {
            primary: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
