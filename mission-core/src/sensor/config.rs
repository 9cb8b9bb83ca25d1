use std::marker::PhantomData;

use crate::{
    codec::{DecodeError, Reader},
    common::SENSOR_DATA_RATE_GRANULARITY,
};

use super::{DataType, MotionDataType, PressureDataType, SensorType};

const MAX_DATA_TYPES: usize = 8;

/// Sampling periods in milliseconds per data type of one sensor. A period of 0 disables the data type.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DataRates<T: DataType> {
    rates: [u16; MAX_DATA_TYPES],
    _phantom: PhantomData<T>,
}

/// Sampling periods of the motion sensor.
pub type MotionConfiguration = DataRates<MotionDataType>;
/// Sampling periods of the pressure sensors.
pub type PressureConfiguration = DataRates<PressureDataType>;

impl<T: DataType> DataRates<T> {
    /// Creates a configuration with every data type disabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rates: [0; MAX_DATA_TYPES],
            _phantom: PhantomData,
        }
    }

    /// Sets the period of `ty`.
    #[must_use]
    pub fn with(mut self, ty: T, rate: u16) -> Self {
        self.set(ty, rate);
        self
    }

    /// Sets the period of `ty`.
    pub fn set(&mut self, ty: T, rate: u16) {
        self.rates[Into::<u8>::into(ty) as usize] = rate;
    }

    /// The period of `ty`.
    #[must_use]
    pub fn get(&self, ty: T) -> u16 {
        self.rates[Into::<u8>::into(ty) as usize]
    }

    /// Iterates over every data type and its period.
    pub fn iter(&self) -> impl Iterator<Item = (T, u16)> + '_ {
        T::ALL.iter().map(|&ty| (ty, self.get(ty)))
    }

    /// Returns `true` if any data type is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.iter().any(|(_, rate)| rate > 0)
    }

    /// Returns the configuration as it is transmitted: every period is quantized down to the firmware granularity and mutually exclusive data types are disabled.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut rates = *self;
        rates
            .rates
            .iter_mut()
            .for_each(|r| *r -= *r % SENSOR_DATA_RATE_GRANULARITY);
        T::constrain(&mut rates);
        rates
    }

    fn write_block(&self, buf: &mut Vec<u8>) {
        buf.push(T::SENSOR_TYPE as u8);
        buf.push((T::ALL.len() * 3) as u8);
        self.iter().for_each(|(ty, rate)| {
            buf.push(ty.into());
            buf.extend_from_slice(&rate.to_le_bytes());
        });
    }

    fn read_block(mut reader: Reader) -> Result<Self, DecodeError> {
        let mut rates = Self::new();
        while !reader.is_empty() {
            let ty = T::try_from(reader.u8()?)?;
            rates.set(ty, reader.u16_le()?);
        }
        Ok(rates)
    }
}

impl<T: DataType> Default for DataRates<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DataType> std::fmt::Debug for DataRates<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Sampling periods of every sensor of a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SensorDataConfiguration {
    /// Motion sensor.
    pub motion: MotionConfiguration,
    /// Pressure sensors.
    pub pressure: PressureConfiguration,
}

impl SensorDataConfiguration {
    /// Returns `true` if any data type of any sensor is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.motion.is_enabled() || self.pressure.is_enabled()
    }

    /// See [`DataRates::normalized`].
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            motion: self.motion.normalized(),
            pressure: self.pressure.normalized(),
        }
    }

    /// Encodes the full configuration.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        SensorDataConfigurationUpdate::from(*self).to_bytes()
    }

    /// Decodes a configuration payload. Blocks absent from the payload are left disabled.
    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        let mut config = Self::default();
        SensorDataConfigurationUpdate::decode(reader)?.apply(&mut config);
        Ok(config)
    }
}

/// A configuration payload that may carry only some of the sensors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SensorDataConfigurationUpdate {
    /// Motion sensor block.
    pub motion: Option<MotionConfiguration>,
    /// Pressure sensors block.
    pub pressure: Option<PressureConfiguration>,
}

impl SensorDataConfigurationUpdate {
    /// Returns a copy with every block normalized.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            motion: self.motion.map(|m| m.normalized()),
            pressure: self.pressure.map(|p| p.normalized()),
        }
    }

    /// Overwrites the sensors carried by the update.
    pub fn apply(&self, config: &mut SensorDataConfiguration) {
        if let Some(motion) = self.motion {
            config.motion = motion;
        }
        if let Some(pressure) = self.pressure {
            config.pressure = pressure;
        }
    }

    /// Encodes the configuration payload. Each block is normalized before encoding.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0];
        if let Some(motion) = self.motion {
            motion.normalized().write_block(&mut buf);
        }
        if let Some(pressure) = self.pressure {
            pressure.normalized().write_block(&mut buf);
        }
        buf[0] = (buf.len() - 1) as u8;
        buf
    }

    /// Decodes a configuration payload.
    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        let len = reader.u8()? as usize;
        let mut blocks = reader.sub(len)?;
        let mut update = Self::default();
        while !blocks.is_empty() {
            let sensor_type = SensorType::try_from(blocks.u8()?)?;
            let len = blocks.u8()? as usize;
            let block = blocks.sub(len)?;
            match sensor_type {
                SensorType::Motion => update.motion = Some(DataRates::read_block(block)?),
                SensorType::Pressure => update.pressure = Some(DataRates::read_block(block)?),
            }
        }
        Ok(update)
    }
}

impl From<SensorDataConfiguration> for SensorDataConfigurationUpdate {
    fn from(config: SensorDataConfiguration) -> Self {
        Self {
            motion: Some(config.motion),
            pressure: Some(config.pressure),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn quantization() {
        let mut rng = rand::rng();
        (0..100).for_each(|_| {
            let r = rng.random::<u16>();
            let rates = MotionConfiguration::new().with(MotionDataType::Quaternion, r);
            assert_eq!(
                r - r % 20,
                rates.normalized().get(MotionDataType::Quaternion)
            );
        });
    }

    #[rstest::rstest]
    #[case(19, 0)]
    #[case(20, 20)]
    #[case(45, 40)]
    #[case(100, 100)]
    fn quantize(#[case] rate: u16, #[case] expected: u16) {
        let rates = MotionConfiguration::new().with(MotionDataType::Gravity, rate);
        assert_eq!(expected, rates.normalized().get(MotionDataType::Gravity));
    }

    #[rstest::rstest]
    #[case([20, 0, 0, 0, 0], [20, 0, 40, 40, 40])]
    #[case([0, 20, 0, 0, 0], [0, 20, 40, 40, 40])]
    #[case([0, 0, 40, 0, 0], [0, 0, 40, 0, 40])]
    #[case([0, 0, 40, 40, 0], [0, 0, 40, 40, 40])]
    #[case([0, 0, 0, 40, 40], [0, 0, 0, 40, 40])]
    fn pressure_exclusivity(#[case] expected: [u16; 5], #[case] rates: [u16; 5]) {
        let config = PressureDataType::VARIANTS
            .iter()
            .zip(rates)
            .fold(PressureConfiguration::new(), |acc, (&ty, r)| acc.with(ty, r))
            .normalized();
        assert_eq!(
            expected.to_vec(),
            config.iter().map(|(_, r)| r).collect::<Vec<_>>()
        );
    }

    #[test]
    fn encode_motion_only() {
        let motion = MotionConfiguration::new()
            .with(MotionDataType::Acceleration, 21)
            .with(MotionDataType::Quaternion, 0x0140);
        let bytes = SensorDataConfigurationUpdate {
            motion: Some(motion),
            pressure: None,
        }
        .to_bytes();
        assert_eq!(
            vec![
                20, 0, 18, 0, 20, 0, 1, 0, 0, 2, 0, 0, 3, 0, 0, 4, 0, 0, 5, 0x40, 0x01
            ],
            bytes
        );
    }

    #[test]
    fn decode_full() -> anyhow::Result<()> {
        let config = SensorDataConfiguration {
            motion: MotionConfiguration::new().with(MotionDataType::RotationRate, 40),
            pressure: PressureConfiguration::new().with(PressureDataType::Mass, 100),
        };
        let bytes = config.to_bytes();
        assert_eq!(1 + 2 + 6 * 3 + 2 + 5 * 3, bytes.len());

        let mut reader = Reader::new(&bytes);
        assert_eq!(config, SensorDataConfiguration::decode(&mut reader)?);
        assert!(reader.is_empty());
        assert!(config.is_enabled());
        assert!(!SensorDataConfiguration::default().is_enabled());
        Ok(())
    }

    #[test]
    fn decode_partial() -> anyhow::Result<()> {
        let bytes = [5, 1, 3, 3, 0x20, 0x00];
        let config = SensorDataConfiguration::decode(&mut Reader::new(&bytes))?;
        assert!(!config.motion.is_enabled());
        assert_eq!(0x20, config.pressure.get(PressureDataType::Mass));
        Ok(())
    }

    #[test]
    fn apply_partial_update() -> anyhow::Result<()> {
        let mut config = SensorDataConfiguration {
            motion: MotionConfiguration::new().with(MotionDataType::Quaternion, 20),
            pressure: PressureConfiguration::new().with(PressureDataType::Mass, 20),
        };
        let bytes = [5, 1, 3, 2, 0x28, 0x00];
        let update = SensorDataConfigurationUpdate::decode(&mut Reader::new(&bytes))?;
        assert_eq!(None, update.motion);
        update.apply(&mut config);
        assert_eq!(20, config.motion.get(MotionDataType::Quaternion));
        assert_eq!(0, config.pressure.get(PressureDataType::Mass));
        assert_eq!(40, config.pressure.get(PressureDataType::CenterOfMass));
        Ok(())
    }

    #[test]
    fn decode_invalid_sensor_type() {
        let bytes = [2, 7, 0];
        assert_eq!(
            Err(DecodeError::InvalidValue {
                field: "sensor type",
                value: 7
            }),
            SensorDataConfiguration::decode(&mut Reader::new(&bytes))
        );
    }
}
