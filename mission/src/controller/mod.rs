mod handle;
mod option;
mod session;

use mission_core::link::{Link, LinkKind};
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    device::{Device, DeviceId},
    error::MissionError,
    mesh::{Mesh, MeshEvent},
};
use session::{Command, Session, Topology};

pub use handle::DeviceHandle;
pub use option::ControllerOption;

const COMMAND_CAPACITY: usize = 64;

/// A session with the devices behind one link.
///
/// The session runs on its own task, which owns the link and every device.
/// Commands are sent to it through [`DeviceHandle`]s. Dropping the controller stops the task.
pub struct Controller {
    kind: LinkKind,
    option: ControllerOption,
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<MeshEvent>,
    task: JoinHandle<()>,
}

impl Controller {
    /// Opens a session with a device connected directly.
    #[tracing::instrument(level = "debug", skip(link))]
    pub async fn open<L: Link + 'static>(
        link: L,
        option: ControllerOption,
    ) -> Result<Self, MissionError> {
        if link.kind().is_multiplexed() {
            return Err(MissionError::UnsupportedLink(link.kind()));
        }
        let device = Device::new(DeviceId(0), 0, link.kind().table(), option.event_capacity);
        Self::open_with(link, Topology::Direct(device), option).await
    }

    /// Opens a session with the devices multiplexed by a mesh or a primary device.
    #[tracing::instrument(level = "debug", skip(link))]
    pub async fn open_mesh<L: Link + 'static>(
        link: L,
        option: ControllerOption,
    ) -> Result<Self, MissionError> {
        if !link.kind().is_multiplexed() {
            return Err(MissionError::UnsupportedLink(link.kind()));
        }
        let mesh = Mesh::new(link.kind(), option.event_capacity);
        Self::open_with(link, Topology::Mesh(mesh), option).await
    }

    async fn open_with<L: Link + 'static>(
        mut link: L,
        topology: Topology,
        option: ControllerOption,
    ) -> Result<Self, MissionError> {
        let kind = link.kind();
        let events = match &topology {
            Topology::Mesh(mesh) => mesh.event_sender(),
            Topology::Direct(_) => broadcast::channel(1).0,
        };

        tracing::info!("Opening {:?} link", kind);
        tokio::time::timeout(option.open_timeout, link.open())
            .await
            .map_err(|_| MissionError::Timeout)??;

        let (commands, rx) = mpsc::channel(COMMAND_CAPACITY);
        let task = tokio::spawn(Session::new(link, topology, option, rx).run());

        Ok(Self {
            kind,
            option,
            commands,
            events,
            task,
        })
    }

    /// How the devices are addressed.
    #[must_use]
    pub const fn kind(&self) -> LinkKind {
        self.kind
    }

    /// Subscribes to mesh events. A session with a single device publishes none.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MeshEvent> {
        self.events.subscribe()
    }

    async fn query<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, MissionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| MissionError::SessionClosed)?;
        rx.await.map_err(|_| MissionError::SessionClosed)
    }

    fn handle(&self, entry: session::DeviceEntry) -> DeviceHandle {
        DeviceHandle::new(entry, self.commands.clone(), self.option.request_timeout)
    }

    /// Returns the handles of every device, in index order.
    pub async fn devices(&self) -> Result<Vec<DeviceHandle>, MissionError> {
        Ok(self
            .query(Command::Devices)
            .await?
            .into_iter()
            .map(|entry| self.handle(entry))
            .collect())
    }

    /// Returns the handle of the device at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`MissionError::DeviceNotFound`] if no device is at `index`.
    pub async fn device(&self, index: usize) -> Result<DeviceHandle, MissionError> {
        self.query(Command::Devices)
            .await?
            .into_iter()
            .nth(index)
            .map(|entry| self.handle(entry))
            .ok_or(MissionError::DeviceNotFound(index))
    }

    /// Returns the handle of the primary device of a radio mesh.
    pub async fn primary(&self) -> Result<Option<DeviceHandle>, MissionError> {
        Ok(self
            .query(Command::Primary)
            .await?
            .map(|entry| self.handle(entry)))
    }

    /// Closes the link and stops the session. Outstanding requests are rejected.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn close(mut self) -> Result<(), MissionError> {
        let result = self.query(Command::Close).await?;
        if let Err(e) = (&mut self.task).await {
            tracing::error!("Session task failed: {}", e);
        }
        result
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.task.abort();
    }
}
