use crate::{
    codec::{DecodeError, Reader},
    device_type::{DeviceType, InsoleSide},
};

use super::{
    motion::decode_motion, pressure::decode_pressure, DataType, MotionDataType,
    PressureDataType, SensorEvent, SensorType,
};

/// A decoded `SENSOR_DATA` message.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorDataFrame {
    /// Wrapping device timestamp in milliseconds.
    pub timestamp: u16,
    /// Decoded values in wire order.
    pub events: Vec<SensorEvent>,
}

impl SensorDataFrame {
    /// Decodes a `SENSOR_DATA` payload. Axis remapping and corrections depend on `device_type`.
    pub fn decode(reader: &mut Reader, device_type: DeviceType) -> Result<Self, DecodeError> {
        let timestamp = reader.u16_le()?;
        let len = reader.u8()? as usize;
        let mut blocks = reader.sub(len)?;
        let mut events = Vec::new();
        while !blocks.is_empty() {
            let sensor_type = SensorType::try_from(blocks.u8()?)?;
            let len = blocks.u8()? as usize;
            let mut block = blocks.sub(len)?;
            while !block.is_empty() {
                match sensor_type {
                    SensorType::Motion => {
                        let ty = MotionDataType::try_from(block.u8()?)?;
                        let mut sample = block.sub(ty.sample_size())?;
                        decode_motion(ty, &mut sample, device_type, &mut events)?;
                    }
                    SensorType::Pressure => {
                        let ty = PressureDataType::try_from(block.u8()?)?;
                        let mut sample = block.sub(ty.sample_size())?;
                        let side = device_type.insole_side().unwrap_or(InsoleSide::Left);
                        decode_pressure(ty, &mut sample, side, &mut events)?;
                    }
                }
            }
        }
        Ok(Self { timestamp, events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geometry::{Vector2, Vector3},
        sensor::pressure_position,
    };

    #[test]
    fn decode_blocks() -> anyhow::Result<()> {
        let mut bytes = vec![0x34, 0x12, 0];
        bytes.extend([0, 14]);
        bytes.push(MotionDataType::Acceleration as u8);
        bytes.extend([100i16, 0, 0].iter().flat_map(|v| v.to_le_bytes()));
        bytes.push(MotionDataType::Gravity as u8);
        bytes.extend([0i16, 0, -200].iter().flat_map(|v| v.to_le_bytes()));
        bytes.extend([1, 5]);
        bytes.push(PressureDataType::Mass as u8);
        bytes.extend(65536u32.to_le_bytes());
        bytes[2] = (bytes.len() - 3) as u8;
        bytes.push(0xFF);

        let mut reader = Reader::new(&bytes);
        let frame = SensorDataFrame::decode(&mut reader, DeviceType::MotionModule)?;
        assert_eq!(0x1234, frame.timestamp);
        assert_eq!(
            vec![
                SensorEvent::Acceleration(Vector3::new(1., 0., 0.)),
                SensorEvent::Gravity(Vector3::new(0., 2., 0.)),
                SensorEvent::Mass(1.),
            ],
            frame.events
        );
        assert_eq!(&[0xFF], reader.remaining());
        Ok(())
    }

    #[test]
    fn pressure_on_right_insole() -> anyhow::Result<()> {
        let mut bytes = vec![0, 0, 0, 1, 17, PressureDataType::PressureSingleByte as u8];
        bytes.extend([0u8; 15]);
        bytes.push(1);
        bytes[2] = (bytes.len() - 3) as u8;

        let frame = SensorDataFrame::decode(&mut Reader::new(&bytes), DeviceType::RightInsole)?;
        match &frame.events[2] {
            SensorEvent::CenterOfMass(com) => {
                let expected: Vector2 = pressure_position(15, InsoleSide::Right);
                approx::assert_abs_diff_eq!(expected, *com);
            }
            e => panic!("unexpected event {:?}", e),
        }
        Ok(())
    }

    #[test]
    fn truncated_block() {
        let bytes = [0, 0, 4, 0, 6, 0, 0];
        assert_eq!(
            Err(DecodeError::UnexpectedEnd {
                needed: 6,
                remaining: 2
            }),
            SensorDataFrame::decode(&mut Reader::new(&bytes), DeviceType::MotionModule)
        );
    }

    #[test]
    fn invalid_data_type() {
        let bytes = [0, 0, 3, 0, 1, 9];
        assert_eq!(
            Err(DecodeError::InvalidValue {
                field: "motion data type",
                value: 9
            }),
            SensorDataFrame::decode(&mut Reader::new(&bytes), DeviceType::MotionModule)
        );
    }
}
