use std::future::Future;

use derive_new::new;
use mission_core::link::LinkError;
use uuid::Uuid;

/// A value notified by a characteristic.
#[derive(new, Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// The characteristic that notified the value.
    pub characteristic: Uuid,
    /// The notified value.
    pub value: Vec<u8>,
}

/// A connection to a GATT peripheral provided by the host's Bluetooth stack.
pub trait GattPeripheral: Send {
    /// Connects to the peripheral and discovers its services.
    fn connect(&mut self) -> impl Future<Output = Result<(), LinkError>> + Send;

    /// Disconnects from the peripheral.
    fn disconnect(&mut self) -> impl Future<Output = Result<(), LinkError>> + Send;

    /// Enables notifications of `characteristic`.
    fn subscribe(
        &mut self,
        characteristic: Uuid,
    ) -> impl Future<Output = Result<(), LinkError>> + Send;

    /// Writes `value` to `characteristic` and waits for the acknowledgment.
    fn write(
        &mut self,
        characteristic: Uuid,
        value: &[u8],
    ) -> impl Future<Output = Result<(), LinkError>> + Send;

    /// Waits for the next notification of any subscribed characteristic.
    ///
    /// The returned future must be cancel safe. An error means the peripheral is disconnected.
    fn notification(&mut self) -> impl Future<Output = Result<Notification, LinkError>> + Send;
}
