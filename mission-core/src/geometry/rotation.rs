use crate::common::Angle;

use super::{UnitQuaternion, Vector3};

/// Intrinsic Euler angles, in the order the rotations are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EulerAngle {
    /// Rotation about x, then y, then z.
    XYZ(Angle, Angle, Angle),
    /// Rotation about y, then x, then z. The orientation events of the sensors use this order.
    YXZ(Angle, Angle, Angle),
}

impl EulerAngle {
    /// The rotation identity.
    #[must_use]
    pub const fn identity() -> Self {
        Self::XYZ(Angle::ZERO, Angle::ZERO, Angle::ZERO)
    }

    /// Decomposes a rotation into y-x-z euler angles.
    #[must_use]
    pub fn yxz_from(rotation: &UnitQuaternion) -> Self {
        let m = rotation.to_rotation_matrix();
        let m = m.matrix();
        let m13 = m[(0, 2)];
        let m21 = m[(1, 0)];
        let m22 = m[(1, 1)];
        let m23 = m[(1, 2)];
        let m31 = m[(2, 0)];
        let m11 = m[(0, 0)];
        let m33 = m[(2, 2)];

        let x = (-m23.clamp(-1., 1.)).asin();
        let (y, z) = if m23.abs() < 0.999_999_9 {
            (m13.atan2(m33), m21.atan2(m22))
        } else {
            ((-m31).atan2(m11), 0.)
        };
        Self::YXZ(
            Angle::from_radian(y),
            Angle::from_radian(x),
            Angle::from_radian(z),
        )
    }

    /// Returns the angles in the order they are applied.
    #[must_use]
    pub const fn angles(&self) -> [Angle; 3] {
        match *self {
            Self::XYZ(a, b, c) | Self::YXZ(a, b, c) => [a, b, c],
        }
    }
}

impl From<EulerAngle> for UnitQuaternion {
    fn from(angle: EulerAngle) -> Self {
        let axes = match angle {
            EulerAngle::XYZ(..) => [Vector3::x_axis(), Vector3::y_axis(), Vector3::z_axis()],
            EulerAngle::YXZ(..) => [Vector3::y_axis(), Vector3::x_axis(), Vector3::z_axis()],
        };
        axes.iter()
            .zip(angle.angles())
            .fold(UnitQuaternion::identity(), |q, (axis, a)| {
                q * UnitQuaternion::from_axis_angle(axis, a.radian())
            })
    }
}
