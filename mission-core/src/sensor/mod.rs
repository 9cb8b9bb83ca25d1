mod calibration;
mod config;
mod event;
mod frame;
mod motion;
mod pressure;

pub use calibration::MotionCalibration;
pub use config::{
    DataRates, MotionConfiguration, PressureConfiguration, SensorDataConfiguration,
    SensorDataConfigurationUpdate,
};
pub use event::SensorEvent;
pub use frame::SensorDataFrame;
pub use motion::insole_correction;
pub use pressure::{pressure_position, PressureData, PressureValue};

use derive_more::Display;

use crate::codec::DecodeError;

/// The kind of sensor a block of samples comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[repr(u8)]
pub enum SensorType {
    /// Inertial measurement unit.
    #[display("motion")]
    Motion = 0,
    /// Pressure sensors of an insole.
    #[display("pressure")]
    Pressure = 1,
}

impl TryFrom<u8> for SensorType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Motion),
            1 => Ok(Self::Pressure),
            v => Err(DecodeError::InvalidValue {
                field: "sensor type",
                value: v as _,
            }),
        }
    }
}

/// Motion data types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MotionDataType {
    /// Acceleration including gravity.
    Acceleration = 0,
    /// Gravity.
    Gravity = 1,
    /// Acceleration without gravity.
    LinearAcceleration = 2,
    /// Angular velocity.
    RotationRate = 3,
    /// Magnetic field.
    Magnetometer = 4,
    /// Orientation.
    Quaternion = 5,
}

/// Pressure data types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PressureDataType {
    /// 16 single-byte samples.
    PressureSingleByte = 0,
    /// 16 two-byte samples.
    PressureDoubleByte = 1,
    /// Center of mass computed by the firmware.
    CenterOfMass = 2,
    /// Mass computed by the firmware.
    Mass = 3,
    /// Heel-to-toe ratio computed by the firmware.
    HeelToToe = 4,
}

/// A data type of a sensor.
pub trait DataType:
    Copy + Eq + std::fmt::Debug + Into<u8> + TryFrom<u8, Error = DecodeError> + 'static
{
    /// The sensor the data type belongs to.
    const SENSOR_TYPE: SensorType;
    /// Every data type of the sensor in wire order.
    const ALL: &'static [Self];

    /// The size of one sample on the wire.
    fn sample_size(&self) -> usize;

    #[doc(hidden)]
    fn constrain(_rates: &mut DataRates<Self>) {}
}

impl MotionDataType {
    const VARIANTS: [Self; 6] = [
        Self::Acceleration,
        Self::Gravity,
        Self::LinearAcceleration,
        Self::RotationRate,
        Self::Magnetometer,
        Self::Quaternion,
    ];

    /// The name of the data type.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Acceleration => "acceleration",
            Self::Gravity => "gravity",
            Self::LinearAcceleration => "linearAcceleration",
            Self::RotationRate => "rotationRate",
            Self::Magnetometer => "magnetometer",
            Self::Quaternion => "quaternion",
        }
    }
}

impl PressureDataType {
    const VARIANTS: [Self; 5] = [
        Self::PressureSingleByte,
        Self::PressureDoubleByte,
        Self::CenterOfMass,
        Self::Mass,
        Self::HeelToToe,
    ];

    /// The name of the data type.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PressureSingleByte => "pressureSingleByte",
            Self::PressureDoubleByte => "pressureDoubleByte",
            Self::CenterOfMass => "centerOfMass",
            Self::Mass => "mass",
            Self::HeelToToe => "heelToToe",
        }
    }

    /// Returns `true` for the raw encodings from which the derived quantities are computed.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        matches!(
            self,
            PressureDataType::PressureSingleByte | PressureDataType::PressureDoubleByte
        )
    }
}

impl DataType for MotionDataType {
    const SENSOR_TYPE: SensorType = SensorType::Motion;
    const ALL: &'static [Self] = &MotionDataType::VARIANTS;

    fn sample_size(&self) -> usize {
        match self {
            MotionDataType::Quaternion => 8,
            _ => 6,
        }
    }
}

impl DataType for PressureDataType {
    const SENSOR_TYPE: SensorType = SensorType::Pressure;
    const ALL: &'static [Self] = &PressureDataType::VARIANTS;

    fn sample_size(&self) -> usize {
        match self {
            PressureDataType::PressureSingleByte => 16,
            PressureDataType::PressureDoubleByte => 32,
            PressureDataType::CenterOfMass => 8,
            PressureDataType::Mass => 4,
            PressureDataType::HeelToToe => 8,
        }
    }

    fn constrain(rates: &mut DataRates<Self>) {
        if rates.get(PressureDataType::PressureSingleByte) > 0
            || rates.get(PressureDataType::PressureDoubleByte) > 0
        {
            rates.set(PressureDataType::Mass, 0);
            rates.set(PressureDataType::CenterOfMass, 0);
            rates.set(PressureDataType::HeelToToe, 0);
        }
        if rates.get(PressureDataType::CenterOfMass) > 0 {
            rates.set(PressureDataType::HeelToToe, 0);
        }
    }
}

macro_rules! impl_data_type_conversion {
    ($ty:ty, $field:literal) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl From<$ty> for u8 {
            fn from(value: $ty) -> Self {
                value as u8
            }
        }

        impl TryFrom<u8> for $ty {
            type Error = DecodeError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                <$ty>::VARIANTS
                    .get(value as usize)
                    .copied()
                    .ok_or(DecodeError::InvalidValue {
                        field: $field,
                        value: value as _,
                    })
            }
        }
    };
}

impl_data_type_conversion!(MotionDataType, "motion data type");
impl_data_type_conversion!(PressureDataType, "pressure data type");

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case(Ok(MotionDataType::Acceleration), 0)]
    #[case(Ok(MotionDataType::Quaternion), 5)]
    #[case(Err(DecodeError::InvalidValue { field: "motion data type", value: 6 }), 6)]
    fn motion_data_type(#[case] expected: Result<MotionDataType, DecodeError>, #[case] v: u8) {
        assert_eq!(expected, MotionDataType::try_from(v));
    }

    #[rstest::rstest]
    #[case(Ok(PressureDataType::PressureSingleByte), 0)]
    #[case(Ok(PressureDataType::HeelToToe), 4)]
    #[case(Err(DecodeError::InvalidValue { field: "pressure data type", value: 5 }), 5)]
    fn pressure_data_type(
        #[case] expected: Result<PressureDataType, DecodeError>,
        #[case] v: u8,
    ) {
        assert_eq!(expected, PressureDataType::try_from(v));
    }

    #[test]
    fn wire_order() {
        MotionDataType::VARIANTS
            .iter()
            .enumerate()
            .for_each(|(i, &ty)| assert_eq!(i as u8, u8::from(ty)));
        PressureDataType::VARIANTS
            .iter()
            .enumerate()
            .for_each(|(i, &ty)| assert_eq!(i as u8, u8::from(ty)));
    }

    #[rstest::rstest]
    #[case("linearAcceleration", MotionDataType::LinearAcceleration)]
    #[case("quaternion", MotionDataType::Quaternion)]
    fn motion_data_type_name(#[case] expected: &str, #[case] ty: MotionDataType) {
        assert_eq!(expected, ty.name());
        assert_eq!(expected, ty.to_string());
    }

    #[rstest::rstest]
    #[case("pressureSingleByte", PressureDataType::PressureSingleByte)]
    #[case("heelToToe", PressureDataType::HeelToToe)]
    fn pressure_data_type_name(#[case] expected: &str, #[case] ty: PressureDataType) {
        assert_eq!(expected, ty.name());
        assert_eq!(expected, ty.to_string());
    }
}
