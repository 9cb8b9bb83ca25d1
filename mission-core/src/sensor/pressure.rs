use crate::{
    codec::{DecodeError, Reader},
    common::{MASS_SCALAR, NUM_PRESSURE_SENSORS},
    device_type::InsoleSide,
    geometry::Vector2,
};

use super::{PressureDataType, SensorEvent};

const INSOLE_WIDTH: f32 = 93.257;
const INSOLE_LENGTH: f32 = 265.069;

// left foot, millimeters from the toe-side corner
const SENSOR_POSITIONS: [[f32; 2]; NUM_PRESSURE_SENSORS] = [
    [59.55, 32.3],
    [33.1, 42.15],
    [69.5, 55.5],
    [44.11, 64.8],
    [20.3, 71.9],
    [63.8, 81.1],
    [41.44, 90.8],
    [19.2, 102.8],
    [48.3, 119.7],
    [17.8, 130.5],
    [43.3, 177.7],
    [18.0, 177.0],
    [43.3, 200.6],
    [18.0, 200.0],
    [43.5, 242.0],
    [18.55, 242.1],
];

const SINGLE_BYTE_FULL_SCALE: f32 = 256.;
const DOUBLE_BYTE_FULL_SCALE: f32 = 4096.;

/// Returns the normalized position of the `index`-th pressure sensor.
///
/// # Panics
///
/// Panics if `index` is not less than [`NUM_PRESSURE_SENSORS`].
#[must_use]
pub fn pressure_position(index: usize, side: InsoleSide) -> Vector2 {
    let [x, y] = SENSOR_POSITIONS[index];
    let x = x / INSOLE_WIDTH;
    let y = y / INSOLE_LENGTH;
    match side {
        InsoleSide::Left => Vector2::new(x, y),
        InsoleSide::Right => Vector2::new(1. - x, y),
    }
}

/// A single pressure sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PressureValue {
    /// The raw sample.
    pub raw: u16,
    /// The normalized position of the sensor.
    pub position: Vector2,
    /// The sample divided by the sum of every sample, or 0 if the sum is 0.
    pub weight: f32,
}

/// Pressure samples of every sensor and the quantities derived from them.
#[derive(Clone, Debug, PartialEq)]
pub struct PressureData {
    /// Samples ordered by sensor index.
    pub values: [PressureValue; NUM_PRESSURE_SENSORS],
    /// Sum of the raw samples.
    pub sum: u32,
    /// Weighted mean of the sensor positions.
    pub center_of_mass: Vector2,
    /// Sum of the raw samples relative to the full scale of every sensor.
    pub mass: f32,
    /// `1 - center_of_mass.y`.
    pub heel_to_toe: f32,
}

impl PressureData {
    /// Derives the pressure quantities from raw samples.
    #[must_use]
    pub fn new(raw: [u16; NUM_PRESSURE_SENSORS], full_scale: f32, side: InsoleSide) -> Self {
        let sum: u32 = raw.iter().map(|&v| v as u32).sum();
        let values: [PressureValue; NUM_PRESSURE_SENSORS] = std::array::from_fn(|i| {
            PressureValue {
                raw: raw[i],
                position: pressure_position(i, side),
                weight: if sum > 0 {
                    raw[i] as f32 / sum as f32
                } else {
                    0.
                },
            }
        });
        let center_of_mass = values
            .iter()
            .map(|v| v.position * v.weight)
            .sum::<Vector2>();
        Self {
            values,
            sum,
            center_of_mass,
            mass: sum as f32 / (full_scale * NUM_PRESSURE_SENSORS as f32),
            heel_to_toe: 1. - center_of_mass.y,
        }
    }
}

pub(crate) fn decode_pressure(
    ty: PressureDataType,
    reader: &mut Reader,
    side: InsoleSide,
    events: &mut Vec<SensorEvent>,
) -> Result<(), DecodeError> {
    match ty {
        PressureDataType::PressureSingleByte | PressureDataType::PressureDoubleByte => {
            let data = if ty == PressureDataType::PressureSingleByte {
                let bytes = reader.bytes(NUM_PRESSURE_SENSORS)?;
                PressureData::new(
                    std::array::from_fn(|i| bytes[i] as u16),
                    SINGLE_BYTE_FULL_SCALE,
                    side,
                )
            } else {
                let mut raw = [0; NUM_PRESSURE_SENSORS];
                raw.iter_mut().try_for_each(|v| {
                    *v = reader.u16_le()?;
                    Ok::<_, DecodeError>(())
                })?;
                PressureData::new(raw, DOUBLE_BYTE_FULL_SCALE, side)
            };
            let (center_of_mass, mass, heel_to_toe) =
                (data.center_of_mass, data.mass, data.heel_to_toe);
            events.push(SensorEvent::Pressure(ty, data));
            events.push(SensorEvent::Mass(mass));
            events.push(SensorEvent::CenterOfMass(center_of_mass));
            events.push(SensorEvent::HeelToToe(heel_to_toe));
        }
        PressureDataType::CenterOfMass => {
            let x = reader.f32_le()?;
            let y = reader.f32_le()?;
            events.push(SensorEvent::CenterOfMass(Vector2::new(x, y)));
        }
        PressureDataType::Mass => {
            events.push(SensorEvent::Mass(reader.u32_le()? as f32 * MASS_SCALAR));
        }
        PressureDataType::HeelToToe => {
            events.push(SensorEvent::HeelToToe((1. - reader.f64_le()?) as f32));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(ty: PressureDataType, bytes: &[u8], side: InsoleSide) -> Vec<SensorEvent> {
        let mut events = Vec::new();
        let mut reader = Reader::new(bytes);
        decode_pressure(ty, &mut reader, side, &mut events).unwrap();
        assert!(reader.is_empty());
        events
    }

    fn mean_position(side: InsoleSide) -> Vector2 {
        (0..NUM_PRESSURE_SENSORS)
            .map(|i| pressure_position(i, side))
            .sum::<Vector2>()
            / NUM_PRESSURE_SENSORS as f32
    }

    #[rstest::rstest]
    #[case(InsoleSide::Left)]
    #[case(InsoleSide::Right)]
    fn uniform_single_byte(#[case] side: InsoleSide) {
        let events = decode(PressureDataType::PressureSingleByte, &[16; 16], side);
        let com = mean_position(side);
        match &events[..] {
            [SensorEvent::Pressure(PressureDataType::PressureSingleByte, data), SensorEvent::Mass(mass), SensorEvent::CenterOfMass(center_of_mass), SensorEvent::HeelToToe(heel_to_toe)] =>
            {
                assert_eq!(256, data.sum);
                approx::assert_abs_diff_eq!(0.0625, *mass);
                approx::assert_abs_diff_eq!(com, *center_of_mass, epsilon = 1e-5);
                approx::assert_abs_diff_eq!(1. - com.y, *heel_to_toe, epsilon = 1e-5);
                data.values
                    .iter()
                    .for_each(|v| approx::assert_abs_diff_eq!(1. / 16., v.weight));
            }
            e => panic!("unexpected events {:?}", e),
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let raw: Vec<u8> = (0..16).map(|i| (i * 13 + 7) as u8).collect();
        let events = decode(PressureDataType::PressureSingleByte, &raw, InsoleSide::Left);
        match &events[0] {
            SensorEvent::Pressure(_, data) => {
                let sum: u32 = raw.iter().map(|&v| v as u32).sum();
                assert_eq!(sum, data.sum);
                approx::assert_abs_diff_eq!(
                    1.,
                    data.values.iter().map(|v| v.weight).sum::<f32>(),
                    epsilon = 1e-5
                );
                approx::assert_abs_diff_eq!(sum as f32 / (256. * 16.), data.mass);
            }
            e => panic!("unexpected event {:?}", e),
        }
    }

    #[test]
    fn double_byte() {
        let bytes: Vec<u8> = (0..16u16).flat_map(|_| 4096u16.to_le_bytes()).collect();
        let events = decode(PressureDataType::PressureDoubleByte, &bytes, InsoleSide::Right);
        assert_eq!(SensorEvent::Mass(1.), events[1]);
    }

    #[test]
    fn zero_sum() {
        let events = decode(PressureDataType::PressureSingleByte, &[0; 16], InsoleSide::Left);
        match &events[0] {
            SensorEvent::Pressure(_, data) => {
                assert!(data.values.iter().all(|v| v.weight == 0.));
                assert_eq!(Vector2::zeros(), data.center_of_mass);
                assert_eq!(0., data.mass);
                assert_eq!(1., data.heel_to_toe);
            }
            e => panic!("unexpected event {:?}", e),
        }
    }

    #[test]
    fn right_is_mirrored() {
        (0..NUM_PRESSURE_SENSORS).for_each(|i| {
            let l = pressure_position(i, InsoleSide::Left);
            let r = pressure_position(i, InsoleSide::Right);
            approx::assert_abs_diff_eq!(1. - l.x, r.x);
            assert_eq!(l.y, r.y);
            assert!((0. ..=1.).contains(&l.x));
            assert!((0. ..=1.).contains(&l.y));
        });
    }

    #[test]
    fn derived() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0.25f32.to_le_bytes());
        bytes.extend_from_slice(&0.75f32.to_le_bytes());
        assert_eq!(
            vec![SensorEvent::CenterOfMass(Vector2::new(0.25, 0.75))],
            decode(PressureDataType::CenterOfMass, &bytes, InsoleSide::Left)
        );
        assert_eq!(
            vec![SensorEvent::Mass(0.5)],
            decode(
                PressureDataType::Mass,
                &32768u32.to_le_bytes(),
                InsoleSide::Left
            )
        );
        assert_eq!(
            vec![SensorEvent::HeelToToe(0.75)],
            decode(
                PressureDataType::HeelToToe,
                &0.25f64.to_le_bytes(),
                InsoleSide::Left
            )
        );
    }
}
