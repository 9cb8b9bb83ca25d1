use derive_more::Display;

use crate::ValidationError;

/// The type of a mission device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Default)]
#[repr(u8)]
pub enum DeviceType {
    /// A standalone motion module.
    #[default]
    #[display("motionModule")]
    MotionModule = 0,
    /// An insole for the left foot.
    #[display("leftInsole")]
    LeftInsole = 1,
    /// An insole for the right foot.
    #[display("rightInsole")]
    RightInsole = 2,
}

/// The side of an insole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InsoleSide {
    /// Left foot.
    Left,
    /// Right foot.
    Right,
}

impl DeviceType {
    /// Returns `true` if the device is an insole.
    #[must_use]
    pub const fn is_insole(&self) -> bool {
        self.insole_side().is_some()
    }

    /// Returns the side of the insole, or [`None`] for a motion module.
    #[must_use]
    pub const fn insole_side(&self) -> Option<InsoleSide> {
        match self {
            DeviceType::MotionModule => None,
            DeviceType::LeftInsole => Some(InsoleSide::Left),
            DeviceType::RightInsole => Some(InsoleSide::Right),
        }
    }
}

impl TryFrom<u8> for DeviceType {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DeviceType::MotionModule),
            1 => Ok(DeviceType::LeftInsole),
            2 => Ok(DeviceType::RightInsole),
            v => Err(ValidationError::InvalidDeviceType(v)),
        }
    }
}

impl From<DeviceType> for u8 {
    fn from(value: DeviceType) -> Self {
        value as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case(Ok(DeviceType::MotionModule), 0)]
    #[case(Ok(DeviceType::LeftInsole), 1)]
    #[case(Ok(DeviceType::RightInsole), 2)]
    #[case(Err(ValidationError::InvalidDeviceType(3)), 3)]
    fn try_from(#[case] expected: Result<DeviceType, ValidationError>, #[case] value: u8) {
        assert_eq!(expected, DeviceType::try_from(value));
    }

    #[rstest::rstest]
    #[case(None, DeviceType::MotionModule)]
    #[case(Some(InsoleSide::Left), DeviceType::LeftInsole)]
    #[case(Some(InsoleSide::Right), DeviceType::RightInsole)]
    fn insole_side(#[case] expected: Option<InsoleSide>, #[case] ty: DeviceType) {
        assert_eq!(expected, ty.insole_side());
        assert_eq!(expected.is_some(), ty.is_insole());
    }
}
