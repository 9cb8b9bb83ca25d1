mod angle;

use std::time::Duration;

pub use angle::*;

/// The maximum length of a device name in bytes.
pub const NAME_MAX_LENGTH: usize = 30;

/// The scheduling granularity of the sensor firmware. Sampling periods are quantized down to a multiple of it.
pub const SENSOR_DATA_RATE_GRANULARITY: u16 = 20;

/// The number of pressure sensors in an insole.
pub const NUM_PRESSURE_SENSORS: usize = 16;

/// The default delay before a socket link tries to reconnect.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// The default interval of the liveness check.
pub const DEFAULT_LIVENESS_INTERVAL: Duration = Duration::from_millis(2500);

/// Sensor data older than this is considered stale by the liveness check.
pub const DEFAULT_SENSOR_DATA_TIMEOUT: Duration = Duration::from_secs(2);

/// The default timeout for connecting a link.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[doc(hidden)]
pub const ACCELERATION_SCALAR: f32 = 1. / 100.;
#[doc(hidden)]
pub const GRAVITY_SCALAR: f32 = 1. / 100.;
#[doc(hidden)]
pub const LINEAR_ACCELERATION_SCALAR: f32 = 1. / 100.;
#[doc(hidden)]
pub const MAGNETOMETER_SCALAR: f32 = 1. / 16.;
#[doc(hidden)]
pub const ROTATION_RATE_SCALAR: f32 = 1. / 16.;
#[doc(hidden)]
pub const QUATERNION_SCALAR: f32 = 1. / 16384.;
#[doc(hidden)]
pub const MASS_SCALAR: f32 = 1. / 65536.;
