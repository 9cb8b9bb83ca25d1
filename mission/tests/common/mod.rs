#![allow(dead_code)]

use std::time::Duration;

use mission::prelude::*;
use tokio::sync::broadcast::{error::RecvError, Receiver};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn wait_for<T: Clone>(
    rx: &mut Receiver<T>,
    pred: impl Fn(&T) -> bool,
) -> anyhow::Result<T> {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return Ok(event),
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => anyhow::bail!("event channel is closed"),
            }
        }
    })
    .await?
}

pub async fn wait_for_devices(
    controller: &Controller,
    n: usize,
) -> anyhow::Result<Vec<DeviceHandle>> {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let devices = controller.devices().await?;
            if devices.len() == n {
                return Ok(devices);
            }
            tokio::task::yield_now().await;
        }
    })
    .await?
}
