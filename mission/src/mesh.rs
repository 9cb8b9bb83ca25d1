use mission_core::{
    codec::{
        Datum, DecodeError, Message, MessageType, Outbound, Reader, TagTable, DEVICE, MESH_DEVICE,
    },
    link::LinkKind,
};
use tokio::{sync::broadcast, time::Instant};

use crate::{
    device::{Device, DeviceId},
    error::MissionError,
};

const MAX_SUB_FRAME_LEN: usize = u8::MAX as usize;

/// An event published by a mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshEvent {
    /// A device joined at the index.
    DeviceAdded(usize),
    /// The device at the index left. Devices after it moved down by one.
    DeviceRemoved(usize),
    /// The battery level of the relay in percent.
    BatteryLevel(u8),
}

/// A directory of devices multiplexed by index over one link.
pub(crate) struct Mesh {
    table: &'static TagTable,
    devices: Vec<Device>,
    primary: Option<Device>,
    outbound: Outbound,
    next_id: u64,
    event_capacity: usize,
    events: broadcast::Sender<MeshEvent>,
}

impl Mesh {
    pub(crate) fn new(kind: LinkKind, event_capacity: usize) -> Self {
        let primary = (kind == LinkKind::Primary)
            .then(|| Device::new(DeviceId(0), 0, &DEVICE, event_capacity));
        Self {
            table: kind.table(),
            devices: Vec::new(),
            primary,
            outbound: Outbound::new(),
            next_id: 1,
            event_capacity,
            events: broadcast::channel(event_capacity).0,
        }
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<MeshEvent> {
        self.events.clone()
    }

    pub(crate) fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub(crate) fn primary(&self) -> Option<&Device> {
        self.primary.as_ref()
    }

    pub(crate) fn device_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        self.primary
            .iter_mut()
            .chain(self.devices.iter_mut())
            .find(|d| d.id() == id)
    }

    pub(crate) fn connect(&mut self, now: Instant) {
        self.enqueue(MessageType::GetNumberOfDevices);
        if let Some(primary) = self.primary.as_mut() {
            primary.connect(now);
        }
    }

    pub(crate) fn disconnect(&mut self) {
        self.outbound = Outbound::new();
        self.primary
            .iter_mut()
            .chain(self.devices.iter_mut())
            .for_each(Device::disconnect);
    }

    pub(crate) fn ping(&mut self) {
        self.enqueue(MessageType::Ping);
    }

    pub(crate) fn expire_requests(&mut self, now: Instant, timeout: std::time::Duration) {
        self.primary
            .iter_mut()
            .chain(self.devices.iter_mut())
            .for_each(|d| d.expire_requests(now, timeout));
    }

    pub(crate) fn check_liveness(&mut self, now: Instant, timeout: std::time::Duration) {
        self.primary
            .iter_mut()
            .chain(self.devices.iter_mut())
            .for_each(|d| d.check_liveness(now, timeout));
    }

    fn enqueue(&mut self, ty: MessageType) {
        match self.table.tag(ty) {
            Ok(tag) => self.outbound.enqueue(tag, Datum::Empty),
            Err(e) => tracing::warn!("{}", e),
        }
    }

    pub(crate) fn has_outbound(&self) -> bool {
        !self.outbound.is_empty()
            || self
                .primary
                .iter()
                .chain(self.devices.iter())
                .any(Device::has_outbound)
    }

    /// Flattens the messages of the mesh itself, then those of the primary device,
    /// then one `DEVICE_MESSAGE` carrying a sub-frame for every device with pending data.
    pub(crate) fn take_messages(&mut self) -> Vec<Message> {
        let mut messages = self.outbound.take_messages();
        if let Some(primary) = self.primary.as_mut() {
            messages.extend(primary.take_messages());
        }
        let payload: Vec<u8> = self
            .devices
            .iter_mut()
            .filter(|d| d.has_outbound())
            .flat_map(|d| {
                let index = d.index() as u8;
                split(d.take_messages())
                    .into_iter()
                    .flat_map(move |chunk| {
                        let mut triple = vec![index, chunk.len() as u8];
                        triple.extend(chunk);
                        triple
                    })
            })
            .collect();
        if !payload.is_empty() {
            match self.table.tag(MessageType::DeviceMessage) {
                Ok(tag) => messages.push(Message::new(tag, payload)),
                Err(e) => tracing::warn!("{}", e),
            }
        }
        messages
    }

    /// Handles every message of a packet.
    ///
    /// A framing error abandons the rest of the packet. Errors of one device sub-frame
    /// and unknown indices are collected and the remaining sub-frames are still handled.
    pub(crate) fn handle(&mut self, buf: &[u8], now: Instant) -> Vec<MissionError> {
        let mut errors = Vec::new();
        if let Err(e) = self.handle_messages(&mut Reader::new(buf), now, &mut errors) {
            errors.push(e.into());
        }
        errors
    }

    fn handle_messages(
        &mut self,
        reader: &mut Reader,
        now: Instant,
        errors: &mut Vec<MissionError>,
    ) -> Result<(), DecodeError> {
        while !reader.is_empty() {
            let ty = self.table.message_type(reader.u8()?)?;
            match ty {
                MessageType::Ping => {}
                MessageType::GetNumberOfDevices => {
                    let count = reader.u8()? as usize;
                    let availability = reader.bytes(count)?;
                    self.resize(count, now);
                    self.devices
                        .iter_mut()
                        .zip(availability)
                        .for_each(|(d, &a)| d.set_available(a != 0, now));
                }
                MessageType::DeviceAdded => {
                    let index = reader.u8()? as usize;
                    if index >= self.devices.len() {
                        self.resize(index + 1, now);
                    }
                    self.devices[index].set_available(true, now);
                }
                MessageType::DeviceRemoved => {
                    let index = reader.u8()? as usize;
                    if let Err(e) = self.remove(index) {
                        errors.push(e);
                    }
                }
                MessageType::DeviceIsAvailable => {
                    let index = reader.u8()? as usize;
                    let available = reader.bool()?;
                    match self.devices.get_mut(index) {
                        Some(device) => device.set_available(available, now),
                        None => errors.push(MissionError::DeviceNotFound(index)),
                    }
                }
                MessageType::DeviceMessage => {
                    while !reader.is_empty() {
                        let index = reader.u8()? as usize;
                        let len = reader.u8()? as usize;
                        let payload = reader.bytes(len)?;
                        match self.devices.get_mut(index) {
                            Some(device) => {
                                if let Err(e) = device.handle(payload, now) {
                                    tracing::warn!("{}: {}", device, e);
                                    errors.push(e.into());
                                }
                            }
                            None => errors.push(MissionError::DeviceNotFound(index)),
                        }
                    }
                }
                MessageType::BatteryLevel if self.primary.is_none() => {
                    let level = reader.u8()?;
                    let _ = self.events.send(MeshEvent::BatteryLevel(level));
                }
                _ => match self.primary.as_mut() {
                    Some(primary) => primary.handle_message(ty, reader, now)?,
                    None => return Err(DecodeError::Unsupported(ty, self.table.name())),
                },
            }
        }
        Ok(())
    }

    fn resize(&mut self, count: usize, now: Instant) {
        while self.devices.len() > count {
            let index = self.devices.len() - 1;
            if let Some(mut device) = self.devices.pop() {
                device.disconnect();
            }
            tracing::info!("Device {} removed", index);
            let _ = self.events.send(MeshEvent::DeviceRemoved(index));
        }
        while self.devices.len() < count {
            let index = self.devices.len();
            let mut device = Device::new(
                DeviceId(self.next_id),
                index,
                &MESH_DEVICE,
                self.event_capacity,
            );
            self.next_id += 1;
            device.set_available(false, now);
            self.devices.push(device);
            tracing::info!("Device {} added", index);
            let _ = self.events.send(MeshEvent::DeviceAdded(index));
        }
    }

    fn remove(&mut self, index: usize) -> Result<(), MissionError> {
        if index >= self.devices.len() {
            return Err(MissionError::DeviceNotFound(index));
        }
        let mut device = self.devices.remove(index);
        device.disconnect();
        self.devices
            .iter_mut()
            .enumerate()
            .skip(index)
            .for_each(|(i, d)| d.set_index(i));
        tracing::info!("Device {} removed", index);
        let _ = self.events.send(MeshEvent::DeviceRemoved(index));
        Ok(())
    }
}

/// Groups flattened messages into sub-frames that fit a single-byte length.
fn split(messages: Vec<Message>) -> Vec<Vec<u8>> {
    let mut chunks: Vec<Vec<u8>> = Vec::new();
    for message in messages {
        match chunks.last_mut() {
            Some(chunk) if chunk.len() + message.len() <= MAX_SUB_FRAME_LEN => {
                message.write_to(chunk)
            }
            _ => {
                let mut chunk = Vec::with_capacity(message.len());
                message.write_to(&mut chunk);
                chunks.push(chunk);
            }
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use mission_core::device_type::DeviceType;

    use super::*;
    use crate::device::ConnectionState;

    fn flatten(messages: Vec<Message>) -> Vec<u8> {
        let mut buf = Vec::new();
        messages.iter().for_each(|msg| msg.write_to(&mut buf));
        buf
    }

    #[test]
    fn number_of_devices() {
        let mut mesh = Mesh::new(LinkKind::Mesh, 16);
        mesh.connect(Instant::now());
        assert_eq!(vec![2], flatten(mesh.take_messages()));

        assert!(mesh.handle(&[2, 3, 1, 0, 1], Instant::now()).is_empty());
        assert_eq!(3, mesh.devices().len());
        assert_eq!(
            vec![true, false, true],
            mesh.devices()
                .iter()
                .map(Device::is_available)
                .collect::<Vec<_>>()
        );
        assert_eq!(
            vec![6, 0, 4, 10, 2, 0, 4, 2, 4, 10, 2, 0, 4],
            flatten(mesh.take_messages())
        );
    }

    #[test]
    fn device_added_beyond_length() {
        let mut mesh = Mesh::new(LinkKind::Mesh, 16);
        let mut events = mesh.event_sender().subscribe();
        mesh.handle(&[2, 3, 1, 1, 1], Instant::now());
        assert_eq!(3, mesh.devices().len());

        assert!(mesh.handle(&[3, 5], Instant::now()).is_empty());
        assert_eq!(6, mesh.devices().len());
        assert!(!mesh.devices()[3].is_available());
        assert!(!mesh.devices()[4].is_available());
        assert!(mesh.devices()[5].is_available());
        assert_eq!(
            ConnectionState::Connecting,
            mesh.devices()[5].state()
        );
        assert_eq!(
            vec![0, 1, 2, 3, 4, 5],
            std::iter::from_fn(|| events.try_recv().ok())
                .map(|e| match e {
                    MeshEvent::DeviceAdded(i) => i,
                    _ => usize::MAX,
                })
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn number_of_devices_shrinks() {
        let mut mesh = Mesh::new(LinkKind::Mesh, 16);
        mesh.handle(&[2, 3, 1, 1, 1], Instant::now());
        let mut events = mesh.event_sender().subscribe();

        mesh.handle(&[2, 1, 1], Instant::now());
        assert_eq!(1, mesh.devices().len());
        assert_eq!(Ok(MeshEvent::DeviceRemoved(2)), events.try_recv());
        assert_eq!(Ok(MeshEvent::DeviceRemoved(1)), events.try_recv());
    }

    #[test]
    fn remove_compacts() {
        let mut mesh = Mesh::new(LinkKind::Mesh, 16);
        mesh.handle(&[2, 3, 1, 1, 1], Instant::now());
        let last = mesh.devices()[2].id();
        let mut removed = mesh.devices()[1].subscribe();

        assert!(mesh.handle(&[4, 1], Instant::now()).is_empty());
        assert_eq!(2, mesh.devices().len());
        assert_eq!(last, mesh.devices()[1].id());
        assert_eq!(1, mesh.devices()[1].index());
        assert_eq!(
            Ok(crate::device::DeviceEvent::Disconnected),
            removed.try_recv()
        );

        assert_eq!(
            vec![MissionError::DeviceNotFound(7)],
            mesh.handle(&[4, 7], Instant::now())
        );
    }

    #[test]
    fn device_message_routes_by_index() {
        let mut mesh = Mesh::new(LinkKind::Mesh, 16);
        mesh.handle(&[2, 2, 1, 1], Instant::now());
        mesh.take_messages();

        let errors = mesh.handle(
            &[6, 9, 1, 8, 1, 8, 0x00, 0x01, 0x05, b'A', b'l', b'i', b'c', b'e'],
            Instant::now(),
        );
        assert_eq!(vec![MissionError::DeviceNotFound(9)], errors);
        assert_eq!(&Some("Alice".to_string()), mesh.devices()[1].name());
    }

    #[test]
    fn device_sub_frame_error_is_scoped() {
        let mut mesh = Mesh::new(LinkKind::Mesh, 16);
        mesh.handle(&[2, 2, 1, 1], Instant::now());

        let errors = mesh.handle(&[6, 0, 1, 0x20, 1, 2, 0x08, 50], Instant::now());
        assert_eq!(
            vec![MissionError::Decode(DecodeError::UnknownTag {
                tag: 0x20,
                table: "mesh device"
            })],
            errors
        );
        assert_eq!(Some(50), mesh.devices()[1].battery_level());
    }

    #[test]
    fn battery_level() {
        let mut mesh = Mesh::new(LinkKind::Mesh, 16);
        let mut events = mesh.event_sender().subscribe();
        assert!(mesh.handle(&[1, 77], Instant::now()).is_empty());
        assert_eq!(Ok(MeshEvent::BatteryLevel(77)), events.try_recv());
    }

    #[test]
    fn primary() {
        let mut mesh = Mesh::new(LinkKind::Primary, 16);
        mesh.connect(Instant::now());
        assert_eq!(vec![13, 11, 2, 4, 7], flatten(mesh.take_messages()));

        assert!(mesh.handle(&[2, 2, 13, 0], Instant::now()).is_empty());
        let primary = mesh.primary().expect("primary");
        assert_eq!(Some(DeviceType::RightInsole), primary.device_type());
        assert!(mesh.devices().is_empty());
    }

    #[test]
    fn unsupported_without_primary() {
        let mut mesh = Mesh::new(LinkKind::Mesh, 16);
        assert_eq!(
            vec![MissionError::Decode(DecodeError::UnknownTag {
                tag: 9,
                table: "mesh"
            })],
            mesh.handle(&[9], Instant::now())
        );
    }

    #[test]
    fn split_on_message_boundaries() {
        let messages = vec![
            Message::new(0, vec![0; 199]),
            Message::new(1, vec![1; 54]),
            Message::new(2, vec![2; 10]),
        ];
        let chunks = split(messages);
        assert_eq!(2, chunks.len());
        assert_eq!(255, chunks[0].len());
        assert_eq!(11, chunks[1].len());
        assert_eq!(2, chunks[1][0]);
    }
}
