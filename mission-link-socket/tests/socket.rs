use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt};
use mission::prelude::*;
use mission_firmware_emulator::{MeshEmulator, MissionEmulator};
use mission_link_socket::{Gateway, Udp, WebSocket, WebSocketOption};
use tokio::net::{TcpListener, UdpSocket};
use tokio_tungstenite::tungstenite::Message;

async fn serve_websocket(
    mut firmware: impl FnMut(&[u8]) -> Vec<u8> + Send + 'static,
) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                continue;
            };
            while let Some(Ok(msg)) = ws.next().await {
                if let Message::Binary(data) = msg {
                    let response = firmware(&data);
                    if !response.is_empty() && ws.send(Message::Binary(response)).await.is_err() {
                        break;
                    }
                }
            }
        }
    });
    Ok(addr)
}

async fn wait_for_devices(
    controller: &Controller,
    n: usize,
) -> anyhow::Result<Vec<DeviceHandle>> {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let devices = controller.devices().await?;
            if devices.len() == n {
                return Ok(devices);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?
}

fn mesh() -> MeshEmulator {
    MeshEmulator::new([
        MissionEmulator::new("Alice", DeviceType::LeftInsole),
        MissionEmulator::new("Bob", DeviceType::RightInsole),
    ])
}

#[tokio::test]
async fn websocket_device() -> anyhow::Result<()> {
    let mut emulator = MissionEmulator::new("Alice", DeviceType::LeftInsole);
    let addr = serve_websocket(move |buf| emulator.handle(buf).unwrap_or_default()).await?;

    let controller =
        Controller::open(WebSocket::new(format!("ws://{}", addr)), ControllerOption::default())
            .await?;
    let device = controller.device(0).await?;

    assert_eq!("Alice", device.name().await?);
    assert_eq!(DeviceType::LeftInsole, device.device_type().await?);
    assert_eq!("Bob", device.set_name("Bob").await?);

    controller.close().await?;
    Ok(())
}

#[tokio::test]
async fn websocket_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let link = WebSocket::with_option(
        format!("ws://{}", addr),
        WebSocketOption {
            reconnect: false,
            ..Default::default()
        },
    );
    assert!(matches!(
        Controller::open(link, ControllerOption::default()).await,
        Err(MissionError::Link(_))
    ));
}

#[tokio::test]
async fn websocket_closed_by_peer() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
                let _ = ws.close(None).await;
            }
        }
    });

    let mut link = WebSocket::new(format!("ws://{}", addr));
    link.open().await?;
    assert!(link.is_open());
    assert!(link.receive().await.is_err());
    assert!(!link.is_open());
    Ok(())
}

#[tokio::test]
async fn gateway_mesh() -> anyhow::Result<()> {
    let mut emulator = mesh();
    let addr = serve_websocket(move |buf| emulator.handle(buf).unwrap_or_default()).await?;

    let link = Gateway::new(&format!("ws://{}/ws", addr))?;
    let controller = Controller::open_mesh(link, ControllerOption::default()).await?;
    assert_eq!(LinkKind::Mesh, controller.kind());

    let devices = wait_for_devices(&controller, 2).await?;
    assert_eq!("Alice", devices[0].name().await?);
    assert_eq!("Bob", devices[1].name().await?);

    controller.close().await?;
    Ok(())
}

#[tokio::test]
async fn udp_mesh() -> anyhow::Result<()> {
    let socket = UdpSocket::bind("127.0.0.1:0").await?;
    let addr = socket.local_addr()?;
    let mut emulator = mesh();
    tokio::spawn(async move {
        let mut buf = [0; 4096];
        while let Ok((n, from)) = socket.recv_from(&mut buf).await {
            let response = emulator.handle(&buf[..n]).unwrap_or_default();
            if !response.is_empty() && socket.send_to(&response, from).await.is_err() {
                break;
            }
        }
    });

    let controller = Controller::open_mesh(Udp::new(addr), ControllerOption::default()).await?;
    let devices = wait_for_devices(&controller, 2).await?;
    assert_eq!(DeviceType::RightInsole, devices[1].device_type().await?);
    assert_eq!("Alice", devices[0].name().await?);

    controller.close().await?;
    Ok(())
}
