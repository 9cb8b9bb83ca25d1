use mission_core::{
    codec::{Datum, MessageType, Text},
    device_type::DeviceType,
    sensor::{MotionCalibration, SensorDataConfiguration, SensorDataConfigurationUpdate},
};
use tokio::sync::oneshot;

use crate::error::MissionError;

pub(crate) type Responder = oneshot::Sender<Result<Response, MissionError>>;

/// A property read from the device, answered from the cache when possible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Query {
    Name,
    DeviceType,
    SensorDataConfiguration,
    Debug,
    BatteryLevel,
    MotionCalibration,
}

impl Query {
    /// The request sent on a cache miss.
    pub(crate) const fn message_type(&self) -> MessageType {
        match self {
            Query::Name => MessageType::GetName,
            Query::DeviceType => MessageType::GetType,
            Query::SensorDataConfiguration => MessageType::GetSensorDataConfigurations,
            Query::Debug => MessageType::GetDebug,
            Query::BatteryLevel => MessageType::BatteryLevel,
            Query::MotionCalibration => MessageType::MotionCalibration,
        }
    }
}

/// A property written to the device.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Update {
    Name(Text),
    DeviceType(DeviceType),
    SensorDataConfiguration(SensorDataConfigurationUpdate),
    Debug(bool),
}

impl Update {
    pub(crate) const fn message_type(&self) -> MessageType {
        match self {
            Update::Name(_) => MessageType::SetName,
            Update::DeviceType(_) => MessageType::SetType,
            Update::SensorDataConfiguration(_) => MessageType::SetSensorDataConfigurations,
            Update::Debug(_) => MessageType::SetDebug,
        }
    }

    /// Folds a later write of the same property into this one.
    ///
    /// Configuration updates keep the blocks the later write leaves out.
    pub(crate) fn merge(self, later: Update) -> Update {
        match (self, later) {
            (Update::SensorDataConfiguration(earlier), Update::SensorDataConfiguration(later)) => {
                Update::SensorDataConfiguration(SensorDataConfigurationUpdate {
                    motion: later.motion.or(earlier.motion),
                    pressure: later.pressure.or(earlier.pressure),
                })
            }
            (_, later) => later,
        }
    }

    pub(crate) fn into_datum(self) -> Datum {
        match self {
            Update::Name(name) => name.into(),
            Update::DeviceType(ty) => u8::from(ty).into(),
            Update::SensorDataConfiguration(update) => update.to_bytes().into(),
            Update::Debug(debug) => debug.into(),
        }
    }
}

/// A command addressed to one device.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Request {
    Get(Query),
    Set(Update),
    Vibrate(Vec<u8>),
    IsAvailable,
    Index,
}

/// The value a request resolves with.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Response {
    Name(String),
    DeviceType(DeviceType),
    SensorDataConfiguration(SensorDataConfiguration),
    Debug(bool),
    BatteryLevel(u8),
    MotionCalibration(MotionCalibration),
    IsAvailable(bool),
    Index(usize),
    Sent,
}

#[cfg(test)]
mod tests {
    use mission_core::sensor::{
        MotionConfiguration, MotionDataType, PressureConfiguration, PressureDataType,
    };

    use super::*;

    #[test]
    fn merge_keeps_omitted_blocks() {
        let motion = MotionConfiguration::new().with(MotionDataType::Gravity, 40);
        let pressure = PressureConfiguration::new().with(PressureDataType::Mass, 20);
        let earlier = Update::SensorDataConfiguration(SensorDataConfigurationUpdate {
            motion: Some(motion),
            pressure: None,
        });
        let later = Update::SensorDataConfiguration(SensorDataConfigurationUpdate {
            motion: None,
            pressure: Some(pressure),
        });

        assert_eq!(
            Update::SensorDataConfiguration(SensorDataConfigurationUpdate {
                motion: Some(motion),
                pressure: Some(pressure),
            }),
            earlier.merge(later)
        );
    }

    #[test]
    fn merge_last_write_wins() {
        assert_eq!(
            Update::Debug(false),
            Update::Debug(true).merge(Update::Debug(false))
        );
    }
}
