use mission_core::{
    codec::{DecodeError, MessageType, Reader, TagTable},
    sensor::SensorDataConfigurationUpdate,
};

/// A message sent by the host, as seen by the firmware.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// Keep-alive.
    Ping,
    /// Read the battery level.
    BatteryLevel,
    /// Read the calibration scores.
    MotionCalibration,
    /// Read the device type.
    GetType,
    /// Write the device type.
    SetType(u8),
    /// Read the name.
    GetName,
    /// Write the name.
    SetName(String),
    /// Read the sensor data configuration.
    GetSensorDataConfigurations,
    /// Write some or all sensor blocks of the configuration.
    SetSensorDataConfigurations(SensorDataConfigurationUpdate),
    /// Play a vibration pattern.
    Vibration {
        /// Pattern type.
        ty: u8,
        /// Pattern data.
        data: Vec<u8>,
    },
    /// Read the debug flag.
    GetDebug,
    /// Write the debug flag.
    SetDebug(bool),
    /// Read the number of devices of a mesh.
    GetNumberOfDevices,
    /// Device sub-frames addressed by index.
    DeviceMessage(Vec<(u8, Vec<u8>)>),
}

impl Request {
    /// Parses the payload of a message of type `ty`.
    pub fn parse_payload(ty: MessageType, reader: &mut Reader) -> Result<Self, DecodeError> {
        Ok(match ty {
            MessageType::Ping => Request::Ping,
            MessageType::BatteryLevel => Request::BatteryLevel,
            MessageType::MotionCalibration => Request::MotionCalibration,
            MessageType::GetType => Request::GetType,
            MessageType::SetType => Request::SetType(reader.u8()?),
            MessageType::GetName => Request::GetName,
            MessageType::SetName => Request::SetName(reader.text()?),
            MessageType::GetSensorDataConfigurations => Request::GetSensorDataConfigurations,
            MessageType::SetSensorDataConfigurations => Request::SetSensorDataConfigurations(
                SensorDataConfigurationUpdate::decode(reader)?,
            ),
            MessageType::Vibration => {
                let ty = reader.u8()?;
                let len = reader.u8()? as usize;
                Request::Vibration {
                    ty,
                    data: reader.bytes(len)?.to_vec(),
                }
            }
            MessageType::GetDebug => Request::GetDebug,
            MessageType::SetDebug => Request::SetDebug(reader.bool()?),
            MessageType::GetNumberOfDevices => Request::GetNumberOfDevices,
            MessageType::DeviceMessage => {
                let mut frames = Vec::new();
                while !reader.is_empty() {
                    let index = reader.u8()?;
                    let len = reader.u8()? as usize;
                    frames.push((index, reader.bytes(len)?.to_vec()));
                }
                Request::DeviceMessage(frames)
            }
            MessageType::SensorData
            | MessageType::DeviceAdded
            | MessageType::DeviceRemoved
            | MessageType::DeviceIsAvailable => {
                return Err(DecodeError::Unsupported(ty, "request"));
            }
        })
    }

    /// Parses every message of a packet.
    pub fn parse_all(table: &TagTable, buf: &[u8]) -> Result<Vec<(MessageType, Self)>, DecodeError> {
        let mut reader = Reader::new(buf);
        let mut requests = Vec::new();
        while !reader.is_empty() {
            let ty = table.message_type(reader.u8()?)?;
            requests.push((ty, Self::parse_payload(ty, &mut reader)?));
        }
        Ok(requests)
    }
}
