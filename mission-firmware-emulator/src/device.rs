use getset::{CopyGetters, Getters, MutGetters};

use mission_core::{
    codec::{DecodeError, MessageType, Reader, ResponseStatus, TagTable, DEVICE},
    common::{NAME_MAX_LENGTH, NUM_PRESSURE_SENSORS},
    device_type::DeviceType,
    sensor::{
        DataType, MotionCalibration, MotionDataType, PressureDataType, SensorDataConfiguration,
        SensorType,
    },
};

use crate::Request;

/// Values streamed by [`MissionEmulator::sensor_data`], in wire units.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSamples {
    /// Acceleration, gravity, linear acceleration, rotation rate and magnetometer.
    pub vectors: [[i16; 3]; 5],
    /// Quaternion as `(w, x, y, z)`.
    pub quaternion: [i16; 4],
    /// Raw pressure of every sensor.
    pub pressure: [u16; NUM_PRESSURE_SENSORS],
    /// Center of mass.
    pub center_of_mass: [f32; 2],
    /// Mass scaled by 65536.
    pub mass: u32,
    /// `1 - heel_to_toe`.
    pub heel_to_toe: f64,
}

impl Default for RawSamples {
    fn default() -> Self {
        Self {
            vectors: [[0, 0, 981], [0, 0, 981], [0; 3], [0; 3], [0, 0, 400]],
            quaternion: [16384, 0, 0, 0],
            pressure: [0; NUM_PRESSURE_SENSORS],
            center_of_mass: [0.5, 0.5],
            mass: 0,
            heel_to_toe: 0.5,
        }
    }
}

/// The firmware of one device.
#[derive(Getters, CopyGetters, MutGetters)]
pub struct MissionEmulator {
    /// The device name.
    #[getset(get = "pub")]
    name: String,
    /// The device type.
    #[getset(get_copy = "pub")]
    device_type: DeviceType,
    /// The debug flag.
    #[getset(get_copy = "pub")]
    debug: bool,
    /// The active sensor data configuration.
    #[getset(get_copy = "pub")]
    sensor_data_configuration: SensorDataConfiguration,
    /// Battery level in percent.
    #[getset(get_copy = "pub")]
    battery_level: u8,
    /// Calibration scores.
    #[getset(get_copy = "pub")]
    motion_calibration: MotionCalibration,
    /// Timestamp of the last `SENSOR_DATA` message.
    #[getset(get_copy = "pub")]
    timestamp: u16,
    /// Every played vibration as `(type, data)`.
    #[getset(get = "pub")]
    vibrations: Vec<(u8, Vec<u8>)>,
    /// Types of every received request.
    #[getset(get = "pub")]
    received: Vec<MessageType>,
    /// Values streamed as sensor data.
    #[getset(get = "pub", get_mut = "pub")]
    raw: RawSamples,
    table: &'static TagTable,
    response_status: ResponseStatus,
    broken: bool,
}

impl MissionEmulator {
    /// Creates a device answering with the [`DEVICE`] table.
    #[must_use]
    pub fn new(name: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            name: name.into(),
            device_type,
            debug: false,
            sensor_data_configuration: SensorDataConfiguration::default(),
            battery_level: 100,
            motion_calibration: MotionCalibration::default(),
            timestamp: 0,
            vibrations: Vec::new(),
            received: Vec::new(),
            raw: RawSamples::default(),
            table: &DEVICE,
            response_status: ResponseStatus::NoError,
            broken: false,
        }
    }

    /// Answers with `table`.
    #[must_use]
    pub fn with_table(mut self, table: &'static TagTable) -> Self {
        self.table = table;
        self
    }

    /// The tag table used for responses.
    #[must_use]
    pub const fn table(&self) -> &'static TagTable {
        self.table
    }

    /// Stops answering.
    pub fn break_down(&mut self) {
        self.broken = true;
    }

    /// Starts answering again.
    pub fn repair(&mut self) {
        self.broken = false;
    }

    /// Sets the status carried by get/set responses of a status-prefixed table. Any status other than `NoError` makes the firmware ignore the request.
    pub fn set_response_status(&mut self, status: ResponseStatus) {
        self.response_status = status;
    }

    #[doc(hidden)]
    pub fn set_battery_level(&mut self, level: u8) -> Vec<u8> {
        self.battery_level = level;
        self.message(MessageType::BatteryLevel, &[level])
    }

    #[doc(hidden)]
    pub fn set_motion_calibration(&mut self, calibration: MotionCalibration) -> Vec<u8> {
        self.motion_calibration = calibration;
        self.message(MessageType::MotionCalibration, &calibration.to_bytes())
    }

    /// Number of received requests of type `ty`.
    #[must_use]
    pub fn count(&self, ty: MessageType) -> usize {
        self.received.iter().filter(|&&t| t == ty).count()
    }

    /// Handles a packet and returns the response, which may be empty.
    pub fn handle(&mut self, buf: &[u8]) -> Result<Vec<u8>, DecodeError> {
        if self.broken {
            return Ok(Vec::new());
        }
        let mut reader = Reader::new(buf);
        let mut response = Vec::new();
        while !reader.is_empty() {
            let ty = self.table.message_type(reader.u8()?)?;
            let request = Request::parse_payload(ty, &mut reader)?;
            response.extend(self.respond(ty, request));
        }
        Ok(response)
    }

    /// Executes a request and returns the response message, which may be empty.
    pub fn respond(&mut self, ty: MessageType, request: Request) -> Vec<u8> {
        self.received.push(ty);
        if self.broken {
            return Vec::new();
        }
        if (ty.is_get() || ty.is_set()) && !self.response_status.is_ok() {
            return self.status_only(ty, self.response_status);
        }
        match request {
            Request::Ping
            | Request::GetNumberOfDevices
            | Request::DeviceMessage(_) => Vec::new(),
            Request::BatteryLevel => self.message(ty, &[self.battery_level]),
            Request::MotionCalibration => {
                self.message(ty, &self.motion_calibration.to_bytes())
            }
            Request::GetType => self.value(ty, &[self.device_type.into()]),
            Request::SetType(v) => match DeviceType::try_from(v) {
                Ok(device_type) => {
                    self.device_type = device_type;
                    self.value(ty, &[v])
                }
                Err(_) => self.invalid(ty, &[self.device_type.into()]),
            },
            Request::GetName => self.value(ty, &self.name_bytes()),
            Request::SetName(name) => {
                if name.len() > NAME_MAX_LENGTH {
                    self.invalid(ty, &self.name_bytes())
                } else {
                    self.name = name;
                    self.value(ty, &self.name_bytes())
                }
            }
            Request::GetSensorDataConfigurations => {
                self.value(ty, &self.sensor_data_configuration.to_bytes())
            }
            Request::SetSensorDataConfigurations(update) => {
                update
                    .normalized()
                    .apply(&mut self.sensor_data_configuration);
                if !self.device_type.is_insole() {
                    self.sensor_data_configuration.pressure = Default::default();
                }
                self.value(ty, &self.sensor_data_configuration.to_bytes())
            }
            Request::Vibration { ty: vt, data } => {
                self.vibrations.push((vt, data));
                Vec::new()
            }
            Request::GetDebug => self.value(ty, &[self.debug as u8]),
            Request::SetDebug(debug) => {
                self.debug = debug;
                self.value(ty, &[debug as u8])
            }
        }
    }

    /// Returns a `SENSOR_DATA` message carrying every enabled data type, or an empty buffer if nothing is enabled. The timestamp advances by `elapsed_ms`.
    pub fn sensor_data(&mut self, elapsed_ms: u16) -> Vec<u8> {
        if self.broken || !self.sensor_data_configuration.is_enabled() {
            return Vec::new();
        }
        self.timestamp = self.timestamp.wrapping_add(elapsed_ms);

        let mut blocks = Vec::new();
        let motion = self.motion_block();
        if !motion.is_empty() {
            blocks.push(SensorType::Motion as u8);
            blocks.push(motion.len() as u8);
            blocks.extend(motion);
        }
        let pressure = self.pressure_block();
        if !pressure.is_empty() {
            blocks.push(SensorType::Pressure as u8);
            blocks.push(pressure.len() as u8);
            blocks.extend(pressure);
        }

        let mut payload = self.timestamp.to_le_bytes().to_vec();
        payload.push(blocks.len() as u8);
        payload.extend(blocks);
        self.message(MessageType::SensorData, &payload)
    }

    fn motion_block(&self) -> Vec<u8> {
        self.sensor_data_configuration
            .motion
            .iter()
            .filter(|&(_, rate)| rate > 0)
            .flat_map(|(ty, _)| {
                let mut sample = vec![ty as u8];
                match ty {
                    MotionDataType::Quaternion => {
                        sample.extend(self.raw.quaternion.iter().flat_map(|v| v.to_le_bytes()))
                    }
                    _ => sample.extend(
                        self.raw.vectors[ty as usize]
                            .iter()
                            .flat_map(|v| v.to_le_bytes()),
                    ),
                }
                debug_assert_eq!(1 + ty.sample_size(), sample.len());
                sample
            })
            .collect()
    }

    fn pressure_block(&self) -> Vec<u8> {
        self.sensor_data_configuration
            .pressure
            .iter()
            .filter(|&(_, rate)| rate > 0)
            .flat_map(|(ty, _)| {
                let mut sample = vec![ty as u8];
                match ty {
                    PressureDataType::PressureSingleByte => sample.extend(
                        self.raw
                            .pressure
                            .iter()
                            .map(|&v| (v >> 4).min(u8::MAX as u16) as u8),
                    ),
                    PressureDataType::PressureDoubleByte => {
                        sample.extend(self.raw.pressure.iter().flat_map(|v| v.to_le_bytes()))
                    }
                    PressureDataType::CenterOfMass => sample.extend(
                        self.raw
                            .center_of_mass
                            .iter()
                            .flat_map(|v| v.to_le_bytes()),
                    ),
                    PressureDataType::Mass => sample.extend(self.raw.mass.to_le_bytes()),
                    PressureDataType::HeelToToe => {
                        sample.extend(self.raw.heel_to_toe.to_le_bytes())
                    }
                }
                debug_assert_eq!(1 + ty.sample_size(), sample.len());
                sample
            })
            .collect()
    }

    fn name_bytes(&self) -> Vec<u8> {
        let mut buf = vec![self.name.len() as u8];
        buf.extend_from_slice(self.name.as_bytes());
        buf
    }

    fn tag(&self, ty: MessageType) -> u8 {
        self.table.tag(ty).unwrap_or(u8::MAX)
    }

    fn message(&self, ty: MessageType, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![self.tag(ty)];
        buf.extend_from_slice(payload);
        buf
    }

    fn value(&self, ty: MessageType, payload: &[u8]) -> Vec<u8> {
        if self.table.status_prefixed() {
            let mut buf = vec![self.tag(ty), ResponseStatus::NoError as u8];
            buf.extend_from_slice(payload);
            buf
        } else {
            self.message(ty, payload)
        }
    }

    fn invalid(&self, ty: MessageType, current: &[u8]) -> Vec<u8> {
        if self.table.status_prefixed() {
            self.status_only(ty, ResponseStatus::Invalid)
        } else {
            self.message(ty, current)
        }
    }

    fn status_only(&self, ty: MessageType, status: ResponseStatus) -> Vec<u8> {
        if self.table.status_prefixed() {
            vec![self.tag(ty), status as u8]
        } else {
            Vec::new()
        }
    }
}
