use tokio_tungstenite::tungstenite::http::Uri;

use mission_core::{
    link::{Link, LinkError, LinkKind, ReconnectPolicy, RxFrame, TxFrame},
    ValidationError,
};

use crate::{WebSocket, WebSocketOption};

const GATEWAY_PATH: &str = "/ws";

/// A [`Link`] to a gateway that relays a mesh of devices over a WebSocket.
///
/// The address must be `ws://host[:port]/ws` or `wss://host[:port]/ws`.
pub struct Gateway {
    inner: WebSocket,
}

impl Gateway {
    /// Creates a new [`Gateway`].
    pub fn new(addr: &str) -> Result<Self, ValidationError> {
        Self::with_option(addr, WebSocketOption::default())
    }

    /// Creates a new [`Gateway`] with options.
    pub fn with_option(addr: &str, option: WebSocketOption) -> Result<Self, ValidationError> {
        validate(addr)?;
        Ok(Self {
            inner: WebSocket::with_option(addr, option),
        })
    }

    /// The address of the gateway.
    #[must_use]
    pub fn addr(&self) -> &str {
        self.inner.url()
    }
}

fn validate(addr: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidAddress(addr.to_string());
    let uri: Uri = addr.parse().map_err(|_| invalid())?;
    match (uri.scheme_str(), uri.host()) {
        (Some("ws" | "wss"), Some(host))
            if !host.is_empty() && uri.path() == GATEWAY_PATH && uri.query().is_none() =>
        {
            Ok(())
        }
        _ => Err(invalid()),
    }
}

impl Link for Gateway {
    async fn open(&mut self) -> Result<(), LinkError> {
        self.inner.open().await
    }

    async fn close(&mut self) -> Result<(), LinkError> {
        self.inner.close().await
    }

    async fn send(&mut self, tx: &TxFrame) -> Result<(), LinkError> {
        self.inner.send(tx).await
    }

    async fn receive(&mut self) -> Result<RxFrame, LinkError> {
        self.inner.receive().await
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Mesh
    }

    fn reconnect_policy(&self) -> ReconnectPolicy {
        self.inner.reconnect_policy()
    }
}
