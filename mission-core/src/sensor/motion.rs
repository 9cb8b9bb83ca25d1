use zerocopy::{byteorder::little_endian::I16, FromBytes, Immutable, KnownLayout};

use crate::{
    codec::{DecodeError, Reader},
    common::{
        deg, ACCELERATION_SCALAR, GRAVITY_SCALAR, LINEAR_ACCELERATION_SCALAR,
        MAGNETOMETER_SCALAR, QUATERNION_SCALAR, ROTATION_RATE_SCALAR,
    },
    device_type::{DeviceType, InsoleSide},
    geometry::{EulerAngle, Quaternion, UnitQuaternion, Vector3},
};

use super::{MotionDataType, SensorEvent};

#[repr(C)]
#[derive(FromBytes, KnownLayout, Immutable, Clone, Copy, Debug)]
struct RawVector {
    x: I16,
    y: I16,
    z: I16,
}

#[repr(C)]
#[derive(FromBytes, KnownLayout, Immutable, Clone, Copy, Debug)]
struct RawQuaternion {
    w: I16,
    x: I16,
    y: I16,
    z: I16,
}

impl RawVector {
    fn scaled(&self, scalar: f32) -> Vector3 {
        Vector3::new(
            self.x.get() as f32 * scalar,
            self.y.get() as f32 * scalar,
            self.z.get() as f32 * scalar,
        )
    }
}

fn remap_vector(v: Vector3, device_type: DeviceType) -> Vector3 {
    match device_type.insole_side() {
        Some(InsoleSide::Right) => Vector3::new(v.z, v.y, -v.x),
        Some(InsoleSide::Left) => Vector3::new(-v.z, v.y, v.x),
        None => Vector3::new(v.x, -v.z, -v.y),
    }
}

fn remap_rotation_rate(v: Vector3, device_type: DeviceType) -> Vector3 {
    match device_type.insole_side() {
        Some(InsoleSide::Right) => Vector3::new(-v.z, -v.y, v.x),
        Some(InsoleSide::Left) => Vector3::new(v.z, -v.y, -v.x),
        None => Vector3::new(-v.x, v.z, v.y),
    }
}

/// The rotation that normalizes the mounting of the motion sensor in an insole.
#[must_use]
pub fn insole_correction(side: InsoleSide) -> UnitQuaternion {
    match side {
        InsoleSide::Right => EulerAngle::XYZ(0. * deg, 90. * deg, -90. * deg),
        InsoleSide::Left => EulerAngle::XYZ(-90. * deg, -90. * deg, 0. * deg),
    }
    .into()
}

fn orientation(raw: &RawQuaternion, device_type: DeviceType) -> UnitQuaternion {
    let [w, x, y, z] = [raw.w, raw.x, raw.y, raw.z].map(|v| v.get() as f32 * QUATERNION_SCALAR);
    let q = UnitQuaternion::try_new(Quaternion::new(z, -y, -w, -x), f32::EPSILON)
        .unwrap_or_else(UnitQuaternion::identity);
    match device_type.insole_side() {
        Some(side) => q * insole_correction(side),
        None => q,
    }
}

pub(crate) fn decode_motion(
    ty: MotionDataType,
    reader: &mut Reader,
    device_type: DeviceType,
    events: &mut Vec<SensorEvent>,
) -> Result<(), DecodeError> {
    match ty {
        MotionDataType::Quaternion => {
            let q = orientation(&reader.read::<RawQuaternion>()?, device_type);
            events.push(SensorEvent::Quaternion(q));
            events.push(SensorEvent::Euler(EulerAngle::yxz_from(&q)));
        }
        MotionDataType::RotationRate => {
            let v = remap_rotation_rate(
                reader.read::<RawVector>()?.scaled(ROTATION_RATE_SCALAR),
                device_type,
            );
            let [x, y, z] = [v.x, v.y, v.z].map(|a| a * deg);
            events.push(SensorEvent::RotationRate(EulerAngle::XYZ(x, y, z)));
        }
        MotionDataType::Acceleration
        | MotionDataType::Gravity
        | MotionDataType::LinearAcceleration
        | MotionDataType::Magnetometer => {
            let (scalar, event): (f32, fn(Vector3) -> SensorEvent) = match ty {
                MotionDataType::Acceleration => (ACCELERATION_SCALAR, SensorEvent::Acceleration),
                MotionDataType::Gravity => (GRAVITY_SCALAR, SensorEvent::Gravity),
                MotionDataType::LinearAcceleration => (
                    LINEAR_ACCELERATION_SCALAR,
                    SensorEvent::LinearAcceleration,
                ),
                _ => (MAGNETOMETER_SCALAR, SensorEvent::Magnetometer),
            };
            let v = remap_vector(reader.read::<RawVector>()?.scaled(scalar), device_type);
            events.push(event(v));
        }
    }
    Ok(())
}
