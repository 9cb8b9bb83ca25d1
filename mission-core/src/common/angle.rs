use derive_more::{Debug, Neg};

/// Degree unit. `90. * deg` is a right angle.
#[allow(non_camel_case_types)]
pub struct deg;

/// Radian unit.
#[allow(non_camel_case_types)]
pub struct rad;

/// A plane angle, stored in radians.
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug, Default, Neg)]
#[debug("{}rad", _0)]
pub struct Angle(f32);

impl Angle {
    /// Zero.
    pub const ZERO: Self = Self(0.);

    /// Creates an angle from radians.
    #[must_use]
    pub const fn from_radian(radian: f32) -> Self {
        Self(radian)
    }

    /// The angle in radians.
    #[must_use]
    pub const fn radian(self) -> f32 {
        self.0
    }

    /// The angle in degrees.
    #[must_use]
    pub fn degree(self) -> f32 {
        self.0.to_degrees()
    }
}

macro_rules! impl_unit {
    ($unit:ident, $to_radian:expr) => {
        impl std::ops::Mul<$unit> for f32 {
            type Output = Angle;

            fn mul(self, _: $unit) -> Angle {
                Angle($to_radian(self))
            }
        }
    };
}

impl_unit!(deg, f32::to_radians);
impl_unit!(rad, std::convert::identity);
