mod event;
mod ledger;
mod request;

use std::time::Duration;

use derive_more::Display;
use getset::{CopyGetters, Getters};
use mission_core::{
    codec::{
        Datum, DecodeError, Message, MessageType, Outbound, Reader, ResponseStatus, TagTable,
    },
    device_type::DeviceType,
    sensor::{MotionCalibration, SensorDataConfiguration, SensorDataFrame},
};
use tokio::{sync::broadcast, time::Instant};

use crate::error::MissionError;
use ledger::{Expired, Ledger};

pub use event::{ConnectionState, DeviceEvent};
pub(crate) use request::{Query, Request, Responder, Response, Update};

/// Requests issued when a device becomes reachable. The device is connected once all of them resolve.
const INITIAL_REQUESTS: [MessageType; 4] = [
    MessageType::GetDebug,
    MessageType::GetType,
    MessageType::GetName,
    MessageType::GetSensorDataConfigurations,
];

/// An identifier that stays the same while the mesh index of a device changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("#{_0}")]
pub struct DeviceId(pub(crate) u64);

#[derive(Default)]
struct SessionClock {
    last: Option<u16>,
    wraps: u64,
}

impl SessionClock {
    fn unwrap(&mut self, timestamp: u16) -> u64 {
        if self.last.is_some_and(|last| timestamp < last) {
            self.wraps += 1;
        }
        self.last = Some(timestamp);
        (self.wraps << 16) + timestamp as u64
    }
}

/// The host-side state of one device.
///
/// A device caches the properties it has received, records requests in flight and
/// accumulates outbound messages until the session flushes them.
#[derive(Getters, CopyGetters, Display)]
#[display("Device {index} ({id})")]
pub struct Device {
    /// The identifier.
    #[getset(get_copy = "pub")]
    id: DeviceId,
    /// The position in the mesh directory, or 0 for a direct link.
    #[getset(get_copy = "pub")]
    index: usize,
    /// The connection state.
    #[getset(get_copy = "pub")]
    state: ConnectionState,
    /// Whether the device is reachable through the mesh.
    #[getset(get_copy = "pub")]
    is_available: bool,
    /// The cached name.
    #[getset(get = "pub")]
    name: Option<String>,
    /// The cached device type.
    #[getset(get_copy = "pub")]
    device_type: Option<DeviceType>,
    /// The cached battery level.
    #[getset(get_copy = "pub")]
    battery_level: Option<u8>,
    /// The cached calibration scores.
    #[getset(get_copy = "pub")]
    motion_calibration: Option<MotionCalibration>,
    /// The cached sensor data configuration.
    #[getset(get_copy = "pub")]
    sensor_data_configuration: Option<SensorDataConfiguration>,
    /// The cached debug flag.
    #[getset(get_copy = "pub")]
    debug: Option<bool>,
    table: &'static TagTable,
    decoding_type: DeviceType,
    clock: SessionClock,
    last_activity: Option<Instant>,
    outbound: Outbound,
    ledger: Ledger,
    events: broadcast::Sender<DeviceEvent>,
}

impl Device {
    pub(crate) fn new(
        id: DeviceId,
        index: usize,
        table: &'static TagTable,
        event_capacity: usize,
    ) -> Self {
        Self {
            id,
            index,
            state: ConnectionState::Disconnected,
            is_available: true,
            name: None,
            device_type: None,
            battery_level: None,
            motion_calibration: None,
            sensor_data_configuration: None,
            debug: None,
            table,
            decoding_type: DeviceType::default(),
            clock: SessionClock::default(),
            last_activity: None,
            outbound: Outbound::new(),
            ledger: Ledger::default(),
            events: broadcast::channel(event_capacity).0,
        }
    }

    /// Subscribes to the events of the device.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<DeviceEvent> {
        self.events.clone()
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn has_outbound(&self) -> bool {
        !self.outbound.is_empty()
    }

    pub(crate) fn take_messages(&mut self) -> Vec<Message> {
        self.outbound.take_messages()
    }

    /// Starts the connection by enqueueing the initial requests.
    pub(crate) fn connect(&mut self, now: Instant) {
        if self.state != ConnectionState::Disconnected {
            return;
        }
        tracing::info!("{}: connecting", self);
        self.state = ConnectionState::Connecting;
        self.last_activity = Some(now);
        for ty in INITIAL_REQUESTS {
            if self.ledger.is_pending(ty) {
                continue;
            }
            match self.enqueue(ty, Datum::Empty) {
                Ok(()) => self.ledger.begin(ty, None, now),
                Err(e) => tracing::warn!("{}: {}", self, e),
            }
        }
        self.check_connected();
    }

    /// Clears the caches and rejects every waiter.
    pub(crate) fn disconnect(&mut self) {
        let state = std::mem::take(&mut self.state);
        self.name = None;
        self.device_type = None;
        self.battery_level = None;
        self.motion_calibration = None;
        self.sensor_data_configuration = None;
        self.debug = None;
        self.clock = SessionClock::default();
        self.last_activity = None;
        self.outbound = Outbound::new();
        self.ledger.reject_all(MissionError::Disconnected);
        if state != ConnectionState::Disconnected {
            tracing::info!("{}: disconnected", self);
            self.emit(DeviceEvent::Disconnected);
        }
    }

    pub(crate) fn set_available(&mut self, available: bool, now: Instant) {
        let changed = self.is_available != available;
        self.is_available = available;
        if available {
            self.connect(now);
        } else {
            self.disconnect();
        }
        if changed {
            self.emit(DeviceEvent::IsAvailable(available));
        }
    }

    /// Executes a command. Anything that needs the wire is left in the outbound map.
    pub(crate) fn request(&mut self, request: Request, responder: Responder, now: Instant) {
        match request {
            Request::IsAvailable => {
                let _ = responder.send(Ok(Response::IsAvailable(self.is_available)));
            }
            Request::Index => {
                let _ = responder.send(Ok(Response::Index(self.index)));
            }
            _ if self.state == ConnectionState::Disconnected => {
                let _ = responder.send(Err(MissionError::Disconnected));
            }
            Request::Get(query) => self.get(query, responder, now),
            Request::Set(update) => self.set(update, responder, now),
            Request::Vibrate(data) => {
                let result = self
                    .enqueue(MessageType::Vibration, data)
                    .map(|()| Response::Sent)
                    .map_err(MissionError::from);
                let _ = responder.send(result);
            }
        }
    }

    fn get(&mut self, query: Query, responder: Responder, now: Instant) {
        if let Some(value) = self.cached(query) {
            let _ = responder.send(Ok(value));
            return;
        }
        let ty = query.message_type();
        if self.ledger.is_pending(ty) {
            tracing::trace!("{}: joining {:?} in flight", self, ty);
            self.ledger.join(ty, responder);
            return;
        }
        match self.enqueue(ty, Datum::Empty) {
            Ok(()) => self.ledger.begin(ty, Some(responder), now),
            Err(e) => {
                let _ = responder.send(Err(e.into()));
            }
        }
    }

    fn set(&mut self, update: Update, responder: Responder, now: Instant) {
        let ty = update.message_type();
        match ty {
            MessageType::SetName => self.name = None,
            MessageType::SetType => self.device_type = None,
            MessageType::SetSensorDataConfigurations => self.sensor_data_configuration = None,
            MessageType::SetDebug => self.debug = None,
            _ => {}
        }
        if self.ledger.is_pending(ty) {
            tracing::trace!("{}: deferring {:?}", self, ty);
            self.ledger.defer(update, responder, now);
            return;
        }
        self.send_update(update, vec![responder], now);
    }

    fn send_update(&mut self, update: Update, waiters: Vec<Responder>, now: Instant) {
        let ty = update.message_type();
        match self.enqueue(ty, update.into_datum()) {
            Ok(()) => self.ledger.begin(ty, waiters, now),
            Err(e) => waiters.into_iter().for_each(|waiter| {
                let _ = waiter.send(Err(e.clone().into()));
            }),
        }
    }

    fn cached(&self, query: Query) -> Option<Response> {
        match query {
            Query::Name => self.name.clone().map(Response::Name),
            Query::DeviceType => self.device_type.map(Response::DeviceType),
            Query::SensorDataConfiguration => self
                .sensor_data_configuration
                .map(Response::SensorDataConfiguration),
            Query::Debug => self.debug.map(Response::Debug),
            Query::BatteryLevel => self.battery_level.map(Response::BatteryLevel),
            Query::MotionCalibration => self.motion_calibration.map(Response::MotionCalibration),
        }
    }

    fn enqueue(&mut self, ty: MessageType, datum: impl Into<Datum>) -> Result<(), DecodeError> {
        let tag = self.table.tag(ty)?;
        self.outbound.enqueue(tag, datum);
        Ok(())
    }

    /// Handles every message of a packet.
    pub(crate) fn handle(&mut self, buf: &[u8], now: Instant) -> Result<(), DecodeError> {
        let mut reader = Reader::new(buf);
        while !reader.is_empty() {
            let ty = self.table.message_type(reader.u8()?)?;
            self.handle_message(ty, &mut reader, now)?;
        }
        Ok(())
    }

    /// Handles one message whose tag has already been read.
    pub(crate) fn handle_message(
        &mut self,
        ty: MessageType,
        reader: &mut Reader,
        now: Instant,
    ) -> Result<(), DecodeError> {
        tracing::trace!("{}: received {:?}", self, ty);
        if self.table.status_prefixed() && (ty.is_get() || ty.is_set()) {
            let status = ResponseStatus::try_from(reader.u8()?)?;
            if !status.is_ok() {
                tracing::warn!("{}: {:?} failed with {}", self, ty, status);
                self.settle(ty, Err(MissionError::Remote(status)), now);
                return Ok(());
            }
        }
        match ty {
            MessageType::Ping | MessageType::Vibration => {}
            MessageType::BatteryLevel => {
                let level = reader.u8()?;
                self.battery_level = Some(level);
                self.emit(DeviceEvent::BatteryLevel(level));
                self.settle(ty, Ok(Response::BatteryLevel(level)), now);
            }
            MessageType::MotionCalibration => {
                let calibration = MotionCalibration::decode(reader)?;
                let was_calibrated = self
                    .motion_calibration
                    .is_some_and(|c| c.is_fully_calibrated());
                self.motion_calibration = Some(calibration);
                self.emit(DeviceEvent::MotionCalibration(calibration));
                if !was_calibrated && calibration.is_fully_calibrated() {
                    self.emit(DeviceEvent::MotionIsFullyCalibrated);
                }
                self.settle(ty, Ok(Response::MotionCalibration(calibration)), now);
            }
            MessageType::GetType | MessageType::SetType => {
                let value = reader.u8()?;
                let device_type =
                    DeviceType::try_from(value).map_err(|_| DecodeError::InvalidValue {
                        field: "device type",
                        value: value.into(),
                    })?;
                self.device_type = Some(device_type);
                self.decoding_type = device_type;
                self.emit(DeviceEvent::DeviceType(device_type));
                self.settle(ty, Ok(Response::DeviceType(device_type)), now);
            }
            MessageType::GetName | MessageType::SetName => {
                let name = reader.text()?;
                self.name = Some(name.clone());
                self.emit(DeviceEvent::Name(name.clone()));
                self.settle(ty, Ok(Response::Name(name)), now);
            }
            MessageType::GetSensorDataConfigurations
            | MessageType::SetSensorDataConfigurations => {
                let config = SensorDataConfiguration::decode(reader)?;
                self.sensor_data_configuration = Some(config);
                self.last_activity = Some(now);
                self.emit(DeviceEvent::SensorDataConfiguration(config));
                self.settle(ty, Ok(Response::SensorDataConfiguration(config)), now);
            }
            MessageType::GetDebug | MessageType::SetDebug => {
                let debug = reader.bool()?;
                self.debug = Some(debug);
                self.emit(DeviceEvent::Debug(debug));
                self.settle(ty, Ok(Response::Debug(debug)), now);
            }
            MessageType::SensorData => {
                let frame = SensorDataFrame::decode(reader, self.decoding_type)?;
                let timestamp = self.clock.unwrap(frame.timestamp);
                self.last_activity = Some(now);
                frame.events.into_iter().for_each(|event| {
                    self.emit(DeviceEvent::Sensor { timestamp, event });
                });
            }
            MessageType::GetNumberOfDevices
            | MessageType::DeviceAdded
            | MessageType::DeviceRemoved
            | MessageType::DeviceIsAvailable
            | MessageType::DeviceMessage => {
                return Err(DecodeError::Unsupported(ty, self.table.name()));
            }
        }
        Ok(())
    }

    /// Re-sends the sensor data configuration if data has stopped arriving.
    pub(crate) fn check_liveness(&mut self, now: Instant, timeout: Duration) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        let Some(config) = self.sensor_data_configuration.filter(|c| c.is_enabled()) else {
            return;
        };
        if self.ledger.is_pending(MessageType::SetSensorDataConfigurations)
            || self
                .last_activity
                .is_some_and(|t| now.duration_since(t) <= timeout)
        {
            return;
        }
        tracing::debug!("{}: no sensor data for {:?}, resending configuration", self, timeout);
        self.last_activity = Some(now);
        self.send_update(
            Update::SensorDataConfiguration(config.into()),
            Vec::new(),
            now,
        );
    }

    /// Gives up on requests unanswered for `timeout`, so that later requests of the same type reach the wire.
    ///
    /// A deferred write is sent at once. Otherwise an expired write is followed by a read of the property
    /// it cleared, and an expired initial request is sent again.
    pub(crate) fn expire_requests(&mut self, now: Instant, timeout: Duration) {
        for Expired { ty, deferred } in self.ledger.expire(now, timeout) {
            tracing::warn!("{}: no response to {:?} within {:?}", self, ty, timeout);
            if let Some((update, waiters)) = deferred {
                self.send_update(update, waiters, now);
                continue;
            }
            let retry = ty.getter().or_else(|| {
                (self.state == ConnectionState::Connecting && INITIAL_REQUESTS.contains(&ty))
                    .then_some(ty)
            });
            if let Some(retry) = retry.filter(|&t| !self.ledger.is_pending(t)) {
                match self.enqueue(retry, Datum::Empty) {
                    Ok(()) => self.ledger.begin(retry, None, now),
                    Err(e) => tracing::warn!("{}: {}", self, e),
                }
            }
        }
    }

    fn settle(&mut self, ty: MessageType, result: Result<Response, MissionError>, now: Instant) {
        if let Some((update, waiters)) = self.ledger.resolve(ty, result) {
            self.send_update(update, waiters, now);
        }
        self.check_connected();
    }

    fn check_connected(&mut self) {
        if self.state == ConnectionState::Connecting
            && !INITIAL_REQUESTS.iter().any(|&ty| self.ledger.is_pending(ty))
        {
            self.state = ConnectionState::Connected;
            tracing::info!("{}: connected", self);
            self.emit(DeviceEvent::Connected);
        }
    }

    fn emit(&self, event: DeviceEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use mission_core::{
        codec::{DEVICE, MESH_DEVICE},
        sensor::{MotionConfiguration, MotionDataType, SensorDataConfigurationUpdate},
    };
    use tokio::sync::oneshot;

    use super::*;

    fn device(table: &'static TagTable) -> Device {
        Device::new(DeviceId(0), 0, table, 64)
    }

    fn connected(table: &'static TagTable) -> Device {
        let mut device = device(table);
        device.connect(Instant::now());
        device.take_messages();
        INITIAL_REQUESTS.into_iter().for_each(|ty| {
            device.ledger.resolve(ty, Err(MissionError::Remote(ResponseStatus::NotFound)));
        });
        device.check_connected();
        device
    }

    fn flatten(device: &mut Device) -> Vec<u8> {
        let mut buf = Vec::new();
        device
            .take_messages()
            .iter()
            .for_each(|msg| msg.write_to(&mut buf));
        buf
    }

    #[test]
    fn initial_batch() -> anyhow::Result<()> {
        let mut device = device(&DEVICE);
        let mut events = device.subscribe();
        device.connect(Instant::now());
        assert_eq!(ConnectionState::Connecting, device.state());
        assert_eq!(vec![11, 2, 4, 7], flatten(&mut device));

        let now = Instant::now();
        device.handle(&[11, 0, 2, 1, 4, 5, b'A', b'l', b'i', b'c', b'e'], now)?;
        assert_eq!(ConnectionState::Connecting, device.state());
        device.handle(&[7, 0], now)?;
        assert_eq!(ConnectionState::Connected, device.state());

        assert_eq!(Ok(DeviceEvent::Debug(false)), events.try_recv());
        assert_eq!(
            Ok(DeviceEvent::DeviceType(DeviceType::LeftInsole)),
            events.try_recv()
        );
        assert_eq!(Ok(DeviceEvent::Name("Alice".into())), events.try_recv());
        assert_eq!(
            Ok(DeviceEvent::SensorDataConfiguration(Default::default())),
            events.try_recv()
        );
        assert_eq!(Ok(DeviceEvent::Connected), events.try_recv());
        Ok(())
    }

    #[test]
    fn mesh_device_name() -> anyhow::Result<()> {
        let mut device = connected(&MESH_DEVICE);
        let (tx, mut rx) = oneshot::channel();
        device.request(Request::Get(Query::Name), tx, Instant::now());
        assert_eq!(vec![0x00], flatten(&mut device));

        device.handle(&[0x00, 0x01, 0x05, b'A', b'l', b'i', b'c', b'e'], Instant::now())?;
        assert_eq!(Ok(Ok(Response::Name("Alice".into()))), rx.try_recv());
        assert_eq!(&Some("Alice".to_string()), device.name());
        Ok(())
    }

    #[test]
    fn coalesce_and_cache() -> anyhow::Result<()> {
        let mut device = connected(&DEVICE);
        let receivers: Vec<_> = (0..4)
            .map(|_| {
                let (tx, rx) = oneshot::channel();
                device.request(Request::Get(Query::Name), tx, Instant::now());
                rx
            })
            .collect();
        assert_eq!(vec![4], flatten(&mut device));

        device.handle(&[4, 3, b'B', b'o', b'b'], Instant::now())?;
        for mut rx in receivers {
            assert_eq!(Ok(Ok(Response::Name("Bob".into()))), rx.try_recv());
        }

        let (tx, mut rx) = oneshot::channel();
        device.request(Request::Get(Query::Name), tx, Instant::now());
        assert_eq!(Ok(Ok(Response::Name("Bob".into()))), rx.try_recv());
        assert!(!device.has_outbound());
        Ok(())
    }

    #[test]
    fn remote_error() -> anyhow::Result<()> {
        let mut device = connected(&MESH_DEVICE);
        let (tx, mut rx) = oneshot::channel();
        device.request(Request::Get(Query::DeviceType), tx, Instant::now());
        device.take_messages();

        device.handle(&[0x02, 0x03], Instant::now())?;
        assert_eq!(
            Ok(Err(MissionError::Remote(ResponseStatus::Invalid))),
            rx.try_recv()
        );
        assert_eq!(None, device.device_type());
        Ok(())
    }

    #[test]
    fn deferred_set() -> anyhow::Result<()> {
        let mut device = connected(&DEVICE);
        let (tx1, mut rx1) = oneshot::channel();
        let (tx2, mut rx2) = oneshot::channel();
        let (tx3, mut rx3) = oneshot::channel();
        device.request(Request::Set(Update::Debug(true)), tx1, Instant::now());
        device.request(Request::Set(Update::Debug(false)), tx2, Instant::now());
        device.request(Request::Set(Update::Debug(true)), tx3, Instant::now());
        assert_eq!(vec![12, 1], flatten(&mut device));

        device.handle(&[12, 1], Instant::now())?;
        assert_eq!(Ok(Ok(Response::Debug(true))), rx1.try_recv());
        assert_eq!(vec![12, 1], flatten(&mut device));

        device.handle(&[12, 1], Instant::now())?;
        assert_eq!(Ok(Ok(Response::Debug(true))), rx2.try_recv());
        assert_eq!(Ok(Ok(Response::Debug(true))), rx3.try_recv());
        assert_eq!(Some(true), device.debug());
        Ok(())
    }

    #[test]
    fn set_invalidates_cache() -> anyhow::Result<()> {
        let mut device = connected(&DEVICE);
        device.handle(&[4, 3, b'B', b'o', b'b'], Instant::now())?;
        let (tx, _rx) = oneshot::channel();
        device.request(
            Request::Set(Update::Name(mission_core::codec::Text::new("Carol")?)),
            tx,
            Instant::now(),
        );
        assert_eq!(&None, device.name());
        assert_eq!(vec![5, 5, b'C', b'a', b'r', b'o', b'l'], flatten(&mut device));
        Ok(())
    }

    #[test]
    fn disconnect_rejects_waiters() {
        let mut device = connected(&DEVICE);
        let mut events = device.subscribe();
        let (tx, mut rx) = oneshot::channel();
        device.request(Request::Get(Query::Name), tx, Instant::now());

        device.disconnect();
        assert_eq!(Ok(Err(MissionError::Disconnected)), rx.try_recv());
        assert_eq!(Ok(DeviceEvent::Disconnected), events.try_recv());
        assert!(!device.has_outbound());

        let (tx, mut rx) = oneshot::channel();
        device.request(Request::Get(Query::Name), tx, Instant::now());
        assert_eq!(Ok(Err(MissionError::Disconnected)), rx.try_recv());
    }

    #[test]
    fn unavailable() {
        let mut device = connected(&MESH_DEVICE);
        let mut events = device.subscribe();
        device.set_available(false, Instant::now());
        assert_eq!(ConnectionState::Disconnected, device.state());
        assert_eq!(Ok(DeviceEvent::Disconnected), events.try_recv());
        assert_eq!(Ok(DeviceEvent::IsAvailable(false)), events.try_recv());

        device.set_available(true, Instant::now());
        assert_eq!(ConnectionState::Connecting, device.state());
        assert_eq!(Ok(DeviceEvent::IsAvailable(true)), events.try_recv());
    }

    #[test]
    fn timestamp_wraps() -> anyhow::Result<()> {
        let mut device = connected(&DEVICE);
        let mut events = device.subscribe();
        let now = Instant::now();
        device.handle(&[9, 0xF0, 0xFF, 0], now)?;
        device.handle(&[9, 0x10, 0x00, 9, 0, 7, 0, 0, 0, 0, 0, 0, 0], now)?;

        match events.try_recv()? {
            DeviceEvent::Sensor { timestamp, .. } => assert_eq!(0x10010, timestamp),
            event => panic!("unexpected {:?}", event),
        }
        Ok(())
    }

    #[test]
    fn battery_level_request() -> anyhow::Result<()> {
        let mut device = connected(&MESH_DEVICE);
        let (tx, mut rx) = oneshot::channel();
        device.request(Request::Get(Query::BatteryLevel), tx, Instant::now());
        assert!(rx.try_recv().is_err());
        assert_eq!(vec![0x08], flatten(&mut device));

        device.handle(&[0x08, 42], Instant::now())?;
        assert_eq!(Ok(Ok(Response::BatteryLevel(42))), rx.try_recv());
        Ok(())
    }

    #[test]
    fn lost_set_response() {
        let mut device = connected(&DEVICE);
        let now = Instant::now();
        let timeout = Duration::from_secs(5);
        let (tx, mut rx) = oneshot::channel();
        device.request(Request::Set(Update::Debug(true)), tx, now);
        assert_eq!(vec![12, 1], flatten(&mut device));

        device.expire_requests(now + Duration::from_secs(4), timeout);
        assert!(rx.try_recv().is_err());
        assert!(!device.has_outbound());

        device.expire_requests(now + timeout, timeout);
        assert_eq!(Ok(Err(MissionError::Timeout)), rx.try_recv());
        assert_eq!(vec![11], flatten(&mut device));

        let (tx, _rx) = oneshot::channel();
        device.request(Request::Set(Update::Debug(false)), tx, now + timeout);
        assert_eq!(vec![12, 0], flatten(&mut device));
    }

    #[test]
    fn deferred_set_after_lost_response() -> anyhow::Result<()> {
        let mut device = connected(&DEVICE);
        let now = Instant::now();
        let timeout = Duration::from_secs(5);
        let (tx1, mut rx1) = oneshot::channel();
        let (tx2, mut rx2) = oneshot::channel();
        device.request(Request::Set(Update::Debug(true)), tx1, now);
        device.request(Request::Set(Update::Debug(false)), tx2, now);
        assert_eq!(vec![12, 1], flatten(&mut device));

        device.expire_requests(now + timeout, timeout);
        assert_eq!(Ok(Err(MissionError::Timeout)), rx1.try_recv());
        assert_eq!(vec![12, 0], flatten(&mut device));

        device.handle(&[12, 0], now + timeout)?;
        assert_eq!(Ok(Ok(Response::Debug(false))), rx2.try_recv());
        Ok(())
    }

    #[test]
    fn initial_request_is_resent() -> anyhow::Result<()> {
        let mut device = device(&DEVICE);
        let now = Instant::now();
        let timeout = Duration::from_secs(5);
        device.connect(now);
        device.take_messages();
        device.handle(&[11, 0, 2, 1, 7, 0], now)?;

        device.expire_requests(now + timeout, timeout);
        assert_eq!(ConnectionState::Connecting, device.state());
        assert_eq!(vec![4], flatten(&mut device));

        device.handle(&[4, 3, b'B', b'o', b'b'], now + timeout)?;
        assert_eq!(ConnectionState::Connected, device.state());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn liveness_after_lost_set() -> anyhow::Result<()> {
        let mut device = connected(&DEVICE);
        let config = SensorDataConfiguration {
            motion: MotionConfiguration::new().with(MotionDataType::Gravity, 20),
            pressure: Default::default(),
        };
        let update = SensorDataConfigurationUpdate::from(config);
        let mut set = vec![8];
        set.extend(update.to_bytes());

        let (tx, _rx) = oneshot::channel();
        device.request(
            Request::Set(Update::SensorDataConfiguration(config.into())),
            tx,
            Instant::now(),
        );
        assert_eq!(set, flatten(&mut device));

        tokio::time::advance(Duration::from_secs(5)).await;
        device.expire_requests(Instant::now(), Duration::from_secs(5));
        assert_eq!(vec![7], flatten(&mut device));

        let mut response = vec![7];
        response.extend(update.to_bytes());
        device.handle(&response, Instant::now())?;
        assert_eq!(Some(config), device.sensor_data_configuration());

        tokio::time::advance(Duration::from_millis(2500)).await;
        device.check_liveness(Instant::now(), Duration::from_secs(2));
        assert_eq!(set, flatten(&mut device));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn liveness() -> anyhow::Result<()> {
        let mut device = connected(&DEVICE);
        let update = SensorDataConfigurationUpdate::from(SensorDataConfiguration {
            motion: MotionConfiguration::new().with(MotionDataType::Gravity, 20),
            pressure: Default::default(),
        });
        let mut response = vec![7];
        response.extend(update.to_bytes());
        device.handle(&response, Instant::now())?;

        device.check_liveness(Instant::now(), Duration::from_secs(2));
        assert!(!device.has_outbound());

        tokio::time::advance(Duration::from_millis(2500)).await;
        device.check_liveness(Instant::now(), Duration::from_secs(2));
        let mut expected = vec![8];
        expected.extend(update.to_bytes());
        assert_eq!(expected, flatten(&mut device));
        Ok(())
    }
}
