use mission_core::codec::{DecodeError, MessageType, Reader, TagTable, MESH, MESH_DEVICE, PRIMARY};

use crate::{MissionEmulator, Request};

/// The firmware of a relay that multiplexes devices by index.
pub struct MeshEmulator {
    devices: Vec<(MissionEmulator, bool)>,
    primary: Option<MissionEmulator>,
    battery_level: u8,
    received: Vec<MessageType>,
    broken: bool,
}

impl MeshEmulator {
    /// Creates a gateway relaying `devices`, all of them available.
    #[must_use]
    pub fn new(devices: impl IntoIterator<Item = MissionEmulator>) -> Self {
        Self {
            devices: devices
                .into_iter()
                .map(|d| (d.with_table(&MESH_DEVICE), true))
                .collect(),
            primary: None,
            battery_level: 100,
            received: Vec::new(),
            broken: false,
        }
    }

    /// Creates a primary device that relays its `peers`.
    #[must_use]
    pub fn with_primary(
        primary: MissionEmulator,
        peers: impl IntoIterator<Item = MissionEmulator>,
    ) -> Self {
        Self {
            primary: Some(primary.with_table(&PRIMARY)),
            ..Self::new(peers)
        }
    }

    /// The tag table of the top-level messages.
    #[must_use]
    pub fn table(&self) -> &'static TagTable {
        if self.primary.is_some() {
            &PRIMARY
        } else {
            &MESH
        }
    }

    /// The number of relayed devices.
    #[must_use]
    pub fn num_devices(&self) -> usize {
        self.devices.len()
    }

    /// The `index`-th relayed device.
    #[must_use]
    pub fn device(&self, index: usize) -> &MissionEmulator {
        &self.devices[index].0
    }

    /// The `index`-th relayed device.
    #[must_use]
    pub fn device_mut(&mut self, index: usize) -> &mut MissionEmulator {
        &mut self.devices[index].0
    }

    /// The primary device.
    #[must_use]
    pub fn primary(&self) -> Option<&MissionEmulator> {
        self.primary.as_ref()
    }

    /// The primary device.
    #[must_use]
    pub fn primary_mut(&mut self) -> Option<&mut MissionEmulator> {
        self.primary.as_mut()
    }

    /// Returns `true` if the `index`-th device is available.
    #[must_use]
    pub fn is_available(&self, index: usize) -> bool {
        self.devices.get(index).is_some_and(|(_, a)| *a)
    }

    /// Number of received requests of type `ty`, excluding relayed device messages.
    #[must_use]
    pub fn count(&self, ty: MessageType) -> usize {
        self.received.iter().filter(|&&t| t == ty).count()
    }

    /// Stops answering.
    pub fn break_down(&mut self) {
        self.broken = true;
    }

    /// Starts answering again.
    pub fn repair(&mut self) {
        self.broken = false;
    }

    /// Adds a device and returns the `DEVICE_ADDED` announcement.
    pub fn add_device(&mut self, device: MissionEmulator) -> Vec<u8> {
        self.devices.push((device.with_table(&MESH_DEVICE), true));
        self.message(MessageType::DeviceAdded, &[(self.devices.len() - 1) as u8])
    }

    /// Removes a device and returns the `DEVICE_REMOVED` announcement.
    pub fn remove_device(&mut self, index: usize) -> Vec<u8> {
        self.devices.remove(index);
        self.message(MessageType::DeviceRemoved, &[index as u8])
    }

    /// Changes the availability of a device and returns the `DEVICE_IS_AVAILABLE` announcement.
    pub fn set_available(&mut self, index: usize, available: bool) -> Vec<u8> {
        if let Some((_, a)) = self.devices.get_mut(index) {
            *a = available;
        }
        self.message(
            MessageType::DeviceIsAvailable,
            &[index as u8, available as u8],
        )
    }

    /// Returns the `GET_NUMBER_OF_DEVICES` response.
    #[must_use]
    pub fn number_of_devices(&self) -> Vec<u8> {
        let mut payload = vec![self.devices.len() as u8];
        payload.extend(self.devices.iter().map(|(_, a)| *a as u8));
        self.message(MessageType::GetNumberOfDevices, &payload)
    }

    /// Wraps device payloads in one `DEVICE_MESSAGE`.
    #[must_use]
    pub fn device_message(&self, frames: &[(u8, Vec<u8>)]) -> Vec<u8> {
        if frames.is_empty() {
            return Vec::new();
        }
        let payload: Vec<u8> = frames
            .iter()
            .flat_map(|(index, data)| {
                let mut triple = vec![*index, data.len() as u8];
                triple.extend_from_slice(data);
                triple
            })
            .collect();
        self.message(MessageType::DeviceMessage, &payload)
    }

    /// Returns the sensor data of the primary device followed by that of every available relayed device.
    pub fn sensor_data(&mut self, elapsed_ms: u16) -> Vec<u8> {
        if self.broken {
            return Vec::new();
        }
        let mut buf = self
            .primary
            .as_mut()
            .map(|p| p.sensor_data(elapsed_ms))
            .unwrap_or_default();
        let frames: Vec<_> = self
            .devices
            .iter_mut()
            .enumerate()
            .filter(|(_, (_, available))| *available)
            .map(|(i, (d, _))| (i as u8, d.sensor_data(elapsed_ms)))
            .filter(|(_, data)| !data.is_empty())
            .collect();
        buf.extend(self.device_message(&frames));
        buf
    }

    /// Handles a packet and returns the response, which may be empty.
    pub fn handle(&mut self, buf: &[u8]) -> Result<Vec<u8>, DecodeError> {
        if self.broken {
            return Ok(Vec::new());
        }
        let table = self.table();
        let mut reader = Reader::new(buf);
        let mut response = Vec::new();
        while !reader.is_empty() {
            let ty = table.message_type(reader.u8()?)?;
            let request = Request::parse_payload(ty, &mut reader)?;
            self.received.push(ty);
            match request {
                Request::GetNumberOfDevices => response.extend(self.number_of_devices()),
                Request::DeviceMessage(frames) => {
                    let responses: Vec<_> = frames
                        .into_iter()
                        .flat_map(|(index, payload)| self.relay(index, &payload))
                        .collect();
                    response.extend(self.device_message(&responses));
                }
                request => match self.primary.as_mut() {
                    Some(primary) => response.extend(primary.respond(ty, request)),
                    None => {
                        if ty == MessageType::BatteryLevel {
                            response.extend(self.message(ty, &[self.battery_level]));
                        }
                    }
                },
            }
        }
        Ok(response)
    }

    fn relay(&mut self, index: u8, payload: &[u8]) -> Vec<(u8, Vec<u8>)> {
        let Some((device, true)) = self.devices.get_mut(index as usize) else {
            return Vec::new();
        };
        let Ok(requests) = Request::parse_all(&MESH_DEVICE, payload) else {
            return Vec::new();
        };
        requests
            .into_iter()
            .map(|(ty, request)| device.respond(ty, request))
            .filter(|r| !r.is_empty())
            .map(|r| (index, r))
            .collect()
    }

    fn message(&self, ty: MessageType, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![self.table().tag(ty).unwrap_or(u8::MAX)];
        buf.extend_from_slice(payload);
        buf
    }
}
