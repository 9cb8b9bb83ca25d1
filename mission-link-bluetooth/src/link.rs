use mission_core::{
    codec::TagTable,
    link::{Link, LinkError, LinkKind, ReconnectPolicy, RxFrame, TxFrame},
};

use crate::{BluetoothOption, Characteristic, GattPeripheral};

/// A [`Link`] to a mission device over Bluetooth.
///
/// The link reconnects at once after an unexpected disconnection.
pub struct Bluetooth<P: GattPeripheral> {
    peripheral: P,
    option: BluetoothOption,
    is_open: bool,
}

impl<P: GattPeripheral> Bluetooth<P> {
    /// Creates a new [`Bluetooth`].
    #[must_use]
    pub fn new(peripheral: P) -> Self {
        Self::with_option(peripheral, BluetoothOption::default())
    }

    /// Creates a new [`Bluetooth`] with options.
    #[must_use]
    pub const fn with_option(peripheral: P, option: BluetoothOption) -> Self {
        Self {
            peripheral,
            option,
            is_open: false,
        }
    }

    /// The peripheral.
    #[must_use]
    pub const fn peripheral(&self) -> &P {
        &self.peripheral
    }

    fn table(&self) -> &'static TagTable {
        self.kind().table()
    }

    async fn connect(&mut self) -> Result<(), LinkError> {
        self.peripheral.connect().await?;
        for characteristic in Characteristic::ALL.into_iter().filter(Characteristic::is_notified) {
            self.peripheral.subscribe(characteristic.uuid()).await?;
        }
        Ok(())
    }
}

impl<P: GattPeripheral> Link for Bluetooth<P> {
    async fn open(&mut self) -> Result<(), LinkError> {
        tokio::time::timeout(self.option.timeout, self.connect())
            .await
            .map_err(|_| LinkError::new("Timed out connecting to the peripheral"))??;
        tracing::info!("Connected to the peripheral");
        self.is_open = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), LinkError> {
        if !self.is_open {
            return Ok(());
        }
        self.is_open = false;
        self.peripheral.disconnect().await
    }

    async fn send(&mut self, tx: &TxFrame) -> Result<(), LinkError> {
        if !self.is_open {
            return Err(LinkError::closed());
        }
        let table = self.table();
        let mut buf = Vec::new();
        for msg in tx.iter() {
            let ty = table.message_type(msg.tag).map_err(LinkError::new)?;
            buf.clear();
            msg.write_to(&mut buf);
            self.peripheral
                .write(Characteristic::for_message(ty).uuid(), &buf)
                .await?;
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<RxFrame, LinkError> {
        if !self.is_open {
            return Err(LinkError::closed());
        }
        loop {
            match self.peripheral.notification().await {
                Ok(n) if Characteristic::from_uuid(n.characteristic).is_some() => {
                    return Ok(RxFrame::new(n.value))
                }
                Ok(n) => tracing::trace!("Ignore notification of {}", n.characteristic),
                Err(e) => {
                    self.is_open = false;
                    return Err(e);
                }
            }
        }
    }

    fn is_open(&self) -> bool {
        self.is_open
    }

    fn kind(&self) -> LinkKind {
        if self.option.primary {
            LinkKind::Primary
        } else {
            LinkKind::Direct
        }
    }

    fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::Immediate
    }
}
