use derive_more::Display;
use mission_core::{
    device_type::DeviceType,
    sensor::{MotionCalibration, SensorDataConfiguration, SensorEvent},
};

/// The connection state of a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Default)]
pub enum ConnectionState {
    /// The device cannot be reached.
    #[default]
    #[display("disconnected")]
    Disconnected,
    /// The initial property requests are in flight.
    #[display("connecting")]
    Connecting,
    /// Every initial property request has resolved.
    #[display("connected")]
    Connected,
}

/// An event published by a device.
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceEvent {
    /// The initial property requests have resolved.
    Connected,
    /// The device can no longer be reached.
    Disconnected,
    /// The device name was received.
    Name(String),
    /// The device type was received.
    DeviceType(DeviceType),
    /// The battery level in percent was received.
    BatteryLevel(u8),
    /// Calibration scores were received.
    MotionCalibration(MotionCalibration),
    /// Every calibration score reached 3.
    MotionIsFullyCalibrated,
    /// The sensor data configuration was received.
    SensorDataConfiguration(SensorDataConfiguration),
    /// The debug flag was received.
    Debug(bool),
    /// The availability in a mesh changed.
    IsAvailable(bool),
    /// A sensor value was decoded.
    Sensor {
        /// Milliseconds since the device started streaming, unwrapped across the 16-bit wraparound.
        timestamp: u64,
        /// The value.
        event: SensorEvent,
    },
}

impl DeviceEvent {
    /// The name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            DeviceEvent::Connected => "connected",
            DeviceEvent::Disconnected => "disconnected",
            DeviceEvent::Name(_) => "name",
            DeviceEvent::DeviceType(_) => "type",
            DeviceEvent::BatteryLevel(_) => "batterylevel",
            DeviceEvent::MotionCalibration(_) => "motioncalibration",
            DeviceEvent::MotionIsFullyCalibrated => "motionisfullycalibrated",
            DeviceEvent::SensorDataConfiguration(_) => "sensorDataConfiguration",
            DeviceEvent::Debug(_) => "debug",
            DeviceEvent::IsAvailable(_) => "isAvailable",
            DeviceEvent::Sensor { event, .. } => event.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use mission_core::geometry::Vector3;

    use super::*;

    #[rstest::rstest]
    #[case("connected", DeviceEvent::Connected)]
    #[case("isAvailable", DeviceEvent::IsAvailable(true))]
    #[case("gravity", DeviceEvent::Sensor { timestamp: 0, event: SensorEvent::Gravity(Vector3::zeros()) })]
    #[case("heelToToe", DeviceEvent::Sensor { timestamp: 0, event: SensorEvent::HeelToToe(0.5) })]
    fn name(#[case] expected: &str, #[case] event: DeviceEvent) {
        assert_eq!(expected, event.name());
    }
}
