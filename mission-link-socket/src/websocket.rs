use futures_util::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use mission_core::link::{Link, LinkError, LinkKind, ReconnectPolicy, RxFrame, TxFrame};

use crate::WebSocketOption;

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub(crate) struct Connection {
    sink: SplitSink<Stream, Message>,
    rx: mpsc::UnboundedReceiver<Result<Vec<u8>, LinkError>>,
    reader: JoinHandle<()>,
}

impl Connection {
    pub(crate) async fn open(url: &str, option: &WebSocketOption) -> Result<Self, LinkError> {
        let (stream, _) = tokio::time::timeout(option.timeout, connect_async(url))
            .await
            .map_err(|_| LinkError::new(format!("Timed out connecting to {}", url)))?
            .map_err(LinkError::new)?;
        tracing::info!("Connected to {}", url);

        let (sink, mut stream) = stream.split();
        let (tx, rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                let data = match msg {
                    Ok(Message::Binary(data)) => Ok(data),
                    Ok(Message::Close(_)) => break,
                    Ok(msg) => {
                        tracing::trace!("Ignore {:?}", msg);
                        continue;
                    }
                    Err(e) => Err(LinkError::new(e)),
                };
                let failed = data.is_err();
                if tx.send(data).is_err() || failed {
                    return;
                }
            }
            let _ = tx.send(Err(LinkError::new("Connection is closed by the peer")));
        });

        Ok(Self { sink, rx, reader })
    }

    pub(crate) async fn close(&mut self) -> Result<(), LinkError> {
        self.reader.abort();
        self.sink.close().await.map_err(LinkError::new)
    }

    pub(crate) async fn send(&mut self, tx: &TxFrame) -> Result<(), LinkError> {
        self.sink
            .send(Message::Binary(tx.to_bytes()))
            .await
            .map_err(LinkError::new)
    }

    pub(crate) async fn receive(&mut self) -> Result<RxFrame, LinkError> {
        match self.rx.recv().await {
            Some(data) => data.map(RxFrame::new),
            None => Err(LinkError::closed()),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// A [`Link`] to a single device over a WebSocket.
pub struct WebSocket {
    url: String,
    option: WebSocketOption,
    conn: Option<Connection>,
}

impl WebSocket {
    /// Creates a new [`WebSocket`] connecting to `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_option(url, WebSocketOption::default())
    }

    /// Creates a new [`WebSocket`] with options.
    #[must_use]
    pub fn with_option(url: impl Into<String>, option: WebSocketOption) -> Self {
        Self {
            url: url.into(),
            option,
            conn: None,
        }
    }

    /// The URL of the peer.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Link for WebSocket {
    async fn open(&mut self) -> Result<(), LinkError> {
        self.conn = Some(Connection::open(&self.url, &self.option).await?);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), LinkError> {
        if let Some(mut conn) = self.conn.take() {
            conn.close().await?;
        }
        Ok(())
    }

    async fn send(&mut self, tx: &TxFrame) -> Result<(), LinkError> {
        if let Some(conn) = self.conn.as_mut() {
            conn.send(tx).await
        } else {
            Err(LinkError::closed())
        }
    }

    async fn receive(&mut self) -> Result<RxFrame, LinkError> {
        let Some(conn) = self.conn.as_mut() else {
            return Err(LinkError::closed());
        };
        let res = conn.receive().await;
        if res.is_err() {
            self.conn = None;
        }
        res
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Direct
    }

    fn reconnect_policy(&self) -> ReconnectPolicy {
        self.option.reconnect_policy()
    }
}
