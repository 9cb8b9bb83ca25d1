use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;

use mission_core::link::{Link, LinkError, LinkKind, ReconnectPolicy, RxFrame, TxFrame};

use crate::UdpOption;

/// A [`Link`] to a relay that multiplexes devices over UDP datagrams.
pub struct Udp {
    addr: SocketAddr,
    option: UdpOption,
    socket: Option<UdpSocket>,
    buf: Vec<u8>,
}

impl Udp {
    /// Creates a new [`Udp`] sending to `addr`.
    #[must_use]
    pub fn new(addr: SocketAddr) -> Self {
        Self::with_option(addr, UdpOption::default())
    }

    /// Creates a new [`Udp`] with options.
    #[must_use]
    pub fn with_option(addr: SocketAddr, option: UdpOption) -> Self {
        Self {
            addr,
            option,
            socket: None,
            buf: vec![0; option.buffer_size],
        }
    }

    /// The address of the relay.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn local_addr(&self) -> SocketAddr {
        self.option.local_addr.unwrap_or_else(|| {
            if self.addr.is_ipv4() {
                (Ipv4Addr::UNSPECIFIED, 0).into()
            } else {
                (Ipv6Addr::UNSPECIFIED, 0).into()
            }
        })
    }
}

impl Link for Udp {
    async fn open(&mut self) -> Result<(), LinkError> {
        let socket = UdpSocket::bind(self.local_addr())
            .await
            .map_err(LinkError::new)?;
        socket.connect(self.addr).await.map_err(LinkError::new)?;
        tracing::info!(
            "Connected to {} from {}",
            self.addr,
            socket.local_addr().map_err(LinkError::new)?
        );
        self.socket = Some(socket);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), LinkError> {
        self.socket = None;
        Ok(())
    }

    async fn send(&mut self, tx: &TxFrame) -> Result<(), LinkError> {
        let Some(socket) = self.socket.as_ref() else {
            return Err(LinkError::closed());
        };
        socket
            .send(&tx.to_bytes())
            .await
            .map_err(LinkError::new)?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<RxFrame, LinkError> {
        let Some(socket) = self.socket.as_ref() else {
            return Err(LinkError::closed());
        };
        loop {
            match socket.recv(&mut self.buf).await {
                Ok(0) => tracing::trace!("Received an empty datagram"),
                Ok(n) => return Ok(RxFrame::new(self.buf[..n].to_vec())),
                Err(e) => {
                    self.socket = None;
                    return Err(LinkError::new(e));
                }
            }
        }
    }

    fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    fn kind(&self) -> LinkKind {
        LinkKind::Mesh
    }

    fn reconnect_policy(&self) -> ReconnectPolicy {
        self.option.reconnect_policy()
    }
}
