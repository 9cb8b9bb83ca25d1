mod rotation;

/// 2-dimensional column vector.
pub type Vector2 = nalgebra::Vector2<f32>;
/// 3-dimensional column vector.
pub type Vector3 = nalgebra::Vector3<f32>;
/// A quaternion.
pub type Quaternion = nalgebra::Quaternion<f32>;
/// A unit quaternion.
pub type UnitQuaternion = nalgebra::UnitQuaternion<f32>;

pub use rotation::*;
