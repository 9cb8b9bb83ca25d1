use crate::geometry::{EulerAngle, UnitQuaternion, Vector2, Vector3};

use super::{MotionDataType, PressureData, PressureDataType};

/// A decoded sensor value.
#[derive(Clone, Debug, PartialEq)]
pub enum SensorEvent {
    /// Acceleration in m/s².
    Acceleration(Vector3),
    /// Gravity in m/s².
    Gravity(Vector3),
    /// Acceleration without gravity in m/s².
    LinearAcceleration(Vector3),
    /// Angular velocity.
    RotationRate(EulerAngle),
    /// Magnetic field in µT.
    Magnetometer(Vector3),
    /// Orientation.
    Quaternion(UnitQuaternion),
    /// Orientation as y-x-z euler angles, emitted with every [`SensorEvent::Quaternion`].
    Euler(EulerAngle),
    /// Raw pressure samples with their derived quantities.
    Pressure(PressureDataType, PressureData),
    /// Normalized center of mass on the insole.
    CenterOfMass(Vector2),
    /// Fraction of the full scale.
    Mass(f32),
    /// 0 when the weight is on the heel, 1 when it is on the toes.
    HeelToToe(f32),
}

impl SensorEvent {
    /// The name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            SensorEvent::Acceleration(_) => MotionDataType::Acceleration.name(),
            SensorEvent::Gravity(_) => MotionDataType::Gravity.name(),
            SensorEvent::LinearAcceleration(_) => MotionDataType::LinearAcceleration.name(),
            SensorEvent::RotationRate(_) => MotionDataType::RotationRate.name(),
            SensorEvent::Magnetometer(_) => MotionDataType::Magnetometer.name(),
            SensorEvent::Quaternion(_) => MotionDataType::Quaternion.name(),
            SensorEvent::Euler(_) => "euler",
            SensorEvent::Pressure(ty, _) => ty.name(),
            SensorEvent::CenterOfMass(_) => PressureDataType::CenterOfMass.name(),
            SensorEvent::Mass(_) => PressureDataType::Mass.name(),
            SensorEvent::HeelToToe(_) => PressureDataType::HeelToToe.name(),
        }
    }
}
