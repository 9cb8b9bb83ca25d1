use std::time::Duration;

use itertools::Itertools;
use mission_core::{
    codec::Message,
    link::{Link, LinkError, ReconnectPolicy, RxFrame, TxFrame},
};
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time::{Instant, MissedTickBehavior},
};

use crate::{
    device::{Device, DeviceEvent, DeviceId, Request, Responder},
    error::MissionError,
    mesh::Mesh,
};

use super::ControllerOption;

/// What a [`DeviceHandle`](super::DeviceHandle) needs to address a device.
#[derive(Clone, Debug)]
pub(crate) struct DeviceEntry {
    pub(crate) id: DeviceId,
    pub(crate) events: broadcast::Sender<DeviceEvent>,
}

impl From<&Device> for DeviceEntry {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id(),
            events: device.event_sender(),
        }
    }
}

pub(crate) enum Command {
    Device {
        id: DeviceId,
        request: Request,
        responder: Responder,
    },
    Devices(oneshot::Sender<Vec<DeviceEntry>>),
    Primary(oneshot::Sender<Option<DeviceEntry>>),
    Close(oneshot::Sender<Result<(), MissionError>>),
}

/// The devices behind a link.
pub(crate) enum Topology {
    Direct(Device),
    Mesh(Mesh),
}

impl Topology {
    fn connect(&mut self, now: Instant) {
        match self {
            Topology::Direct(device) => device.connect(now),
            Topology::Mesh(mesh) => mesh.connect(now),
        }
    }

    fn disconnect(&mut self) {
        match self {
            Topology::Direct(device) => device.disconnect(),
            Topology::Mesh(mesh) => mesh.disconnect(),
        }
    }

    fn handle(&mut self, buf: &[u8], now: Instant) -> Vec<MissionError> {
        match self {
            Topology::Direct(device) => device
                .handle(buf, now)
                .err()
                .map(MissionError::from)
                .into_iter()
                .collect(),
            Topology::Mesh(mesh) => mesh.handle(buf, now),
        }
    }

    fn has_outbound(&self) -> bool {
        match self {
            Topology::Direct(device) => device.has_outbound(),
            Topology::Mesh(mesh) => mesh.has_outbound(),
        }
    }

    fn take_messages(&mut self) -> Vec<Message> {
        match self {
            Topology::Direct(device) => device.take_messages(),
            Topology::Mesh(mesh) => mesh.take_messages(),
        }
    }

    fn check_liveness(&mut self, now: Instant, timeout: Duration) {
        match self {
            Topology::Direct(device) => device.check_liveness(now, timeout),
            Topology::Mesh(mesh) => mesh.check_liveness(now, timeout),
        }
    }

    fn expire_requests(&mut self, now: Instant, timeout: Duration) {
        match self {
            Topology::Direct(device) => device.expire_requests(now, timeout),
            Topology::Mesh(mesh) => mesh.expire_requests(now, timeout),
        }
    }

    fn ping(&mut self) {
        if let Topology::Mesh(mesh) = self {
            mesh.ping();
        }
    }

    fn device_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        match self {
            Topology::Direct(device) => (device.id() == id).then_some(device),
            Topology::Mesh(mesh) => mesh.device_mut(id),
        }
    }

    fn entries(&self) -> Vec<DeviceEntry> {
        match self {
            Topology::Direct(device) => vec![device.into()],
            Topology::Mesh(mesh) => mesh.devices().iter().map(DeviceEntry::from).collect(),
        }
    }

    fn primary(&self) -> Option<DeviceEntry> {
        match self {
            Topology::Direct(_) => None,
            Topology::Mesh(mesh) => mesh.primary().map(DeviceEntry::from),
        }
    }
}

/// The task that owns a link and every device behind it.
pub(crate) struct Session<L: Link> {
    link: L,
    topology: Topology,
    option: ControllerOption,
    commands: mpsc::Receiver<Command>,
    last_received: Instant,
    reconnect_at: Option<Instant>,
}

impl<L: Link> Session<L> {
    pub(crate) fn new(
        link: L,
        topology: Topology,
        option: ControllerOption,
        commands: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            link,
            topology,
            option,
            commands,
            last_received: Instant::now(),
            reconnect_at: None,
        }
    }

    pub(crate) async fn run(mut self) {
        self.topology.connect(Instant::now());
        self.flush().await;

        let mut liveness = tokio::time::interval_at(
            Instant::now() + self.option.liveness_interval,
            self.option.liveness_interval,
        );
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if !self.execute(command).await {
                            return;
                        }
                    }
                    None => {
                        if let Err(e) = self.close().await {
                            tracing::warn!("Failed to close link: {}", e);
                        }
                        return;
                    }
                },
                rx = self.link.receive(), if self.link.is_open() => match rx {
                    Ok(frame) => self.receive(frame),
                    Err(e) => self.lost(e).await,
                },
                _ = liveness.tick() => self.check_liveness(),
                _ = tokio::time::sleep_until(self.reconnect_at.unwrap_or_else(Instant::now)), if self.reconnect_at.is_some() => {
                    self.reconnect().await
                }
            }
            self.flush().await;
        }
    }

    async fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::Device {
                id,
                request,
                responder,
            } => match self.topology.device_mut(id) {
                Some(device) => {
                    let now = Instant::now();
                    device.expire_requests(now, self.option.response_timeout);
                    device.request(request, responder, now);
                }
                None => {
                    let _ = responder.send(Err(MissionError::Disconnected));
                }
            },
            Command::Devices(tx) => {
                let _ = tx.send(self.topology.entries());
            }
            Command::Primary(tx) => {
                let _ = tx.send(self.topology.primary());
            }
            Command::Close(tx) => {
                let _ = tx.send(self.close().await);
                return false;
            }
        }
        true
    }

    fn receive(&mut self, frame: RxFrame) {
        let now = Instant::now();
        self.last_received = now;
        tracing::trace!("receive: {} bytes", frame.len());
        self.topology
            .handle(frame.as_slice(), now)
            .into_iter()
            .for_each(|e| tracing::warn!("{}", e));
    }

    async fn flush(&mut self) {
        if !self.link.is_open() || !self.topology.has_outbound() {
            return;
        }
        let tx = TxFrame::new(self.topology.take_messages());
        tracing::debug!("send: {}", tx.iter().join(", "));
        if let Err(e) = self.link.send(&tx).await {
            self.lost(e).await;
        }
    }

    fn check_liveness(&mut self) {
        if !self.link.is_open() {
            return;
        }
        let now = Instant::now();
        self.topology
            .expire_requests(now, self.option.response_timeout);
        self.topology
            .check_liveness(now, self.option.sensor_data_timeout);
        if self.link.kind().is_multiplexed()
            && now.duration_since(self.last_received) >= self.option.ping_interval
        {
            self.topology.ping();
        }
    }

    async fn lost(&mut self, e: LinkError) {
        tracing::error!("Link is lost: {}", e);
        self.topology.disconnect();
        if let Err(e) = self.link.close().await {
            tracing::warn!("Failed to close link: {}", e);
        }
        self.reconnect_at = match self.link.reconnect_policy() {
            ReconnectPolicy::Never => None,
            ReconnectPolicy::Delayed(delay) => Some(Instant::now() + delay),
            ReconnectPolicy::Immediate => Some(Instant::now()),
        };
    }

    async fn reconnect(&mut self) {
        self.reconnect_at = None;
        tracing::info!("Reconnecting");
        let result = tokio::time::timeout(self.option.open_timeout, self.link.open())
            .await
            .unwrap_or_else(|_| Err(LinkError::new("Timeout")));
        match result {
            Ok(()) => {
                tracing::info!("Reconnected");
                let now = Instant::now();
                self.last_received = now;
                self.topology.connect(now);
            }
            Err(e) => {
                let delay = match self.link.reconnect_policy() {
                    ReconnectPolicy::Never => return,
                    ReconnectPolicy::Delayed(delay) => delay,
                    ReconnectPolicy::Immediate => self.option.retry_interval,
                };
                tracing::warn!("Failed to reconnect: {}. Retrying in {:?}", e, delay);
                self.reconnect_at = Some(Instant::now() + delay);
            }
        }
    }

    async fn close(&mut self) -> Result<(), MissionError> {
        self.reconnect_at = None;
        self.topology.disconnect();
        if self.link.is_open() {
            self.link.close().await?;
        }
        tracing::info!("Session is closed");
        Ok(())
    }
}
