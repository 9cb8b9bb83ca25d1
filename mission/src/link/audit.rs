use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mission_core::{
    codec::DecodeError,
    link::{Link, LinkError, LinkKind, ReconnectPolicy, RxFrame, TxFrame},
};
use mission_firmware_emulator::{MeshEmulator, MissionEmulator};
use tokio::sync::mpsc;

enum Firmware {
    Device(MissionEmulator),
    Mesh(MeshEmulator),
}

impl Firmware {
    fn handle(&mut self, buf: &[u8]) -> Result<Vec<u8>, DecodeError> {
        match self {
            Firmware::Device(device) => device.handle(buf),
            Firmware::Mesh(mesh) => mesh.handle(buf),
        }
    }

    fn sensor_data(&mut self, elapsed_ms: u16) -> Vec<u8> {
        match self {
            Firmware::Device(device) => device.sensor_data(elapsed_ms),
            Firmware::Mesh(mesh) => mesh.sensor_data(elapsed_ms),
        }
    }
}

struct State {
    firmware: Firmware,
    is_open: bool,
    broken: bool,
    sent: Vec<Vec<u8>>,
    open_count: usize,
}

type Inbound = Result<Vec<u8>, LinkError>;

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A link to firmware emulators, answering every frame synchronously.
pub struct Audit {
    kind: LinkKind,
    reconnect_policy: ReconnectPolicy,
    state: Arc<Mutex<State>>,
    tx: mpsc::UnboundedSender<Inbound>,
    rx: mpsc::UnboundedReceiver<Inbound>,
}

/// Controls an [`Audit`] link after it has been moved into a session.
#[derive(Clone)]
pub struct AuditHandle {
    state: Arc<Mutex<State>>,
    tx: mpsc::UnboundedSender<Inbound>,
}

impl Audit {
    fn new(kind: LinkKind, firmware: Firmware) -> (Self, AuditHandle) {
        let state = Arc::new(Mutex::new(State {
            firmware,
            is_open: false,
            broken: false,
            sent: Vec::new(),
            open_count: 0,
        }));
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = AuditHandle {
            state: state.clone(),
            tx: tx.clone(),
        };
        (
            Self {
                kind,
                reconnect_policy: ReconnectPolicy::Never,
                state,
                tx,
                rx,
            },
            handle,
        )
    }

    /// A link to a single device.
    pub fn device(emulator: MissionEmulator) -> (Self, AuditHandle) {
        Self::new(LinkKind::Direct, Firmware::Device(emulator))
    }

    /// A link to a mesh, or to a primary device if the emulator has one.
    pub fn mesh(emulator: MeshEmulator) -> (Self, AuditHandle) {
        let kind = if emulator.primary().is_some() {
            LinkKind::Primary
        } else {
            LinkKind::Mesh
        };
        Self::new(kind, Firmware::Mesh(emulator))
    }

    /// Sets the reconnect policy.
    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect_policy = policy;
        self
    }
}

impl Link for Audit {
    async fn open(&mut self) -> Result<(), LinkError> {
        let mut state = lock(&self.state);
        if state.broken {
            return Err(LinkError::new("broken"));
        }
        state.is_open = true;
        state.open_count += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), LinkError> {
        lock(&self.state).is_open = false;
        Ok(())
    }

    async fn send(&mut self, tx: &TxFrame) -> Result<(), LinkError> {
        let response = {
            let mut state = lock(&self.state);
            if !state.is_open {
                return Err(LinkError::closed());
            }
            if state.broken {
                return Err(LinkError::new("broken"));
            }
            let bytes = tx.to_bytes();
            state.sent.push(bytes.clone());
            state.firmware.handle(&bytes).map_err(LinkError::new)?
        };
        if !response.is_empty() {
            let _ = self.tx.send(Ok(response));
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<RxFrame, LinkError> {
        if !self.is_open() {
            return Err(LinkError::closed());
        }
        match self.rx.recv().await {
            Some(Ok(data)) => Ok(RxFrame::new(data)),
            Some(Err(e)) => {
                lock(&self.state).is_open = false;
                Err(e)
            }
            None => Err(LinkError::closed()),
        }
    }

    fn is_open(&self) -> bool {
        lock(&self.state).is_open
    }

    fn kind(&self) -> LinkKind {
        self.kind
    }

    fn reconnect_policy(&self) -> ReconnectPolicy {
        self.reconnect_policy
    }
}

impl AuditHandle {
    /// Runs `f` on the device emulator. Returns `None` for a mesh link.
    pub fn device<R>(&self, f: impl FnOnce(&mut MissionEmulator) -> R) -> Option<R> {
        match &mut lock(&self.state).firmware {
            Firmware::Device(device) => Some(f(device)),
            Firmware::Mesh(_) => None,
        }
    }

    /// Runs `f` on the mesh emulator. Returns `None` for a direct link.
    pub fn mesh<R>(&self, f: impl FnOnce(&mut MeshEmulator) -> R) -> Option<R> {
        match &mut lock(&self.state).firmware {
            Firmware::Mesh(mesh) => Some(f(mesh)),
            Firmware::Device(_) => None,
        }
    }

    /// Delivers a packet as if the firmware had sent it.
    pub fn push(&self, data: Vec<u8>) {
        if !data.is_empty() {
            let _ = self.tx.send(Ok(data));
        }
    }

    /// Advances the firmware clock and delivers the sensor data it streams.
    pub fn stream(&self, elapsed_ms: u16) {
        let data = lock(&self.state).firmware.sensor_data(elapsed_ms);
        self.push(data);
    }

    /// Drops the connection. The link cannot be reopened until [`AuditHandle::repair`].
    pub fn break_down(&self) {
        lock(&self.state).broken = true;
        let _ = self.tx.send(Err(LinkError::new("broken")));
    }

    /// Allows the link to be reopened.
    pub fn repair(&self) {
        lock(&self.state).broken = false;
    }

    /// Every frame sent, flattened.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        lock(&self.state).sent.clone()
    }

    /// Clears the record of sent frames.
    pub fn clear_sent(&self) {
        lock(&self.state).sent.clear();
    }

    /// The number of times the link has been opened.
    pub fn open_count(&self) -> usize {
        lock(&self.state).open_count
    }

    /// Checks if the link is open.
    pub fn is_open(&self) -> bool {
        lock(&self.state).is_open
    }
}
