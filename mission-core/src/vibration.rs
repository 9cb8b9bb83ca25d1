use std::time::Duration;

use crate::ValidationError;

const MAX_WAVEFORM_EFFECTS: usize = 8;
const MAX_WAVEFORM_EFFECT_ID: u8 = 123;
const MAX_WAVEFORM_SEGMENTS: usize = 20;
const MAX_SEGMENT_DURATION: Duration = Duration::from_millis(2550);

/// One step of a [`Vibration::Waveform`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveformSegment {
    /// Intensity from 0 to 1.
    pub intensity: f32,
    /// Duration with a resolution of 10 ms.
    pub duration: Duration,
}

impl WaveformSegment {
    /// Creates a new [`WaveformSegment`].
    #[must_use]
    pub const fn new(intensity: f32, duration: Duration) -> Self {
        Self {
            intensity,
            duration,
        }
    }
}

/// A vibration pattern.
#[derive(Clone, Debug, PartialEq)]
pub enum Vibration {
    /// A sequence of predefined effects of the haptic driver.
    WaveformEffect(Vec<u8>),
    /// A sequence of intensities held for a duration.
    Waveform(Vec<WaveformSegment>),
}

impl Vibration {
    const fn type_byte(&self) -> u8 {
        match self {
            Vibration::WaveformEffect(_) => 0,
            Vibration::Waveform(_) => 1,
        }
    }

    /// Validates the pattern and encodes the `VIBRATION` payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ValidationError> {
        let data = match self {
            Vibration::WaveformEffect(ids) => {
                if ids.is_empty() || ids.len() > MAX_WAVEFORM_EFFECTS {
                    return Err(ValidationError::InvalidVibration(format!(
                        "1 to {} waveform effects are required, but {} are given",
                        MAX_WAVEFORM_EFFECTS,
                        ids.len()
                    )));
                }
                if let Some(id) = ids.iter().find(|&&id| id > MAX_WAVEFORM_EFFECT_ID) {
                    return Err(ValidationError::InvalidVibration(format!(
                        "Waveform effect {} is out of range [0, {}]",
                        id, MAX_WAVEFORM_EFFECT_ID
                    )));
                }
                ids.clone()
            }
            Vibration::Waveform(segments) => {
                if segments.is_empty() || segments.len() > MAX_WAVEFORM_SEGMENTS {
                    return Err(ValidationError::InvalidVibration(format!(
                        "1 to {} waveform segments are required, but {} are given",
                        MAX_WAVEFORM_SEGMENTS,
                        segments.len()
                    )));
                }
                segments
                    .iter()
                    .map(|s| {
                        if !(0.0..=1.0).contains(&s.intensity) {
                            return Err(ValidationError::InvalidVibration(format!(
                                "Intensity {} is out of range [0, 1]",
                                s.intensity
                            )));
                        }
                        if s.duration > MAX_SEGMENT_DURATION {
                            return Err(ValidationError::InvalidVibration(format!(
                                "Duration {:?} exceeds {:?}",
                                s.duration, MAX_SEGMENT_DURATION
                            )));
                        }
                        Ok([
                            (s.intensity * 127.).round() as u8,
                            (s.duration.as_millis() / 10) as u8,
                        ])
                    })
                    .collect::<Result<Vec<_>, _>>()?
                    .concat()
            }
        };
        let mut buf = Vec::with_capacity(2 + data.len());
        buf.push(self.type_byte());
        buf.push(data.len() as u8);
        buf.extend(data);
        Ok(buf)
    }
}
