use crate::codec::{DecodeError, Reader};

/// Calibration scores of the motion sensor, each from 0 (uncalibrated) to 3 (fully calibrated).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct MotionCalibration {
    /// Overall score.
    pub system: u8,
    /// Gyroscope score.
    pub gyroscope: u8,
    /// Accelerometer score.
    pub accelerometer: u8,
    /// Magnetometer score.
    pub magnetometer: u8,
}

impl MotionCalibration {
    const FULLY_CALIBRATED: u8 = 3;

    /// Returns `true` if every score is 3.
    #[must_use]
    pub const fn is_fully_calibrated(&self) -> bool {
        self.system == Self::FULLY_CALIBRATED
            && self.gyroscope == Self::FULLY_CALIBRATED
            && self.accelerometer == Self::FULLY_CALIBRATED
            && self.magnetometer == Self::FULLY_CALIBRATED
    }

    #[doc(hidden)]
    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        let mut score = |field: &'static str| {
            reader.u8().and_then(|v| {
                if v <= Self::FULLY_CALIBRATED {
                    Ok(v)
                } else {
                    Err(DecodeError::InvalidValue {
                        field,
                        value: v as _,
                    })
                }
            })
        };
        Ok(Self {
            system: score("system calibration")?,
            gyroscope: score("gyroscope calibration")?,
            accelerometer: score("accelerometer calibration")?,
            magnetometer: score("magnetometer calibration")?,
        })
    }

    #[doc(hidden)]
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 4] {
        [
            self.system,
            self.gyroscope,
            self.accelerometer,
            self.magnetometer,
        ]
    }
}
