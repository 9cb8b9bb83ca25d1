use std::time::Duration;

use mission_core::{
    codec::Text,
    common::NAME_MAX_LENGTH,
    device_type::DeviceType,
    sensor::{
        MotionCalibration, MotionConfiguration, PressureConfiguration, SensorDataConfiguration,
        SensorDataConfigurationUpdate,
    },
    vibration::Vibration,
    ValidationError,
};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::session::{Command, DeviceEntry};
use crate::{
    device::{DeviceEvent, DeviceId, Query, Request, Response, Update},
    error::MissionError,
};

macro_rules! expect_response {
    ($response:expr, $variant:ident) => {
        match $response {
            Response::$variant(v) => Ok(v),
            _ => Err(MissionError::UnexpectedResponse),
        }
    };
}

/// A handle to one device of a [`Controller`](super::Controller).
///
/// Getters answer from the cache when the value is known, otherwise they request it.
/// Concurrent getters of the same property share a single request.
#[derive(Clone, Debug)]
pub struct DeviceHandle {
    id: DeviceId,
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<DeviceEvent>,
    request_timeout: Option<Duration>,
}

impl DeviceHandle {
    pub(crate) fn new(
        entry: DeviceEntry,
        commands: mpsc::Sender<Command>,
        request_timeout: Option<Duration>,
    ) -> Self {
        Self {
            id: entry.id,
            commands,
            events: entry.events,
            request_timeout,
        }
    }

    /// The identifier of the device.
    #[must_use]
    pub const fn id(&self) -> DeviceId {
        self.id
    }

    /// Subscribes to the events of the device.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    async fn request(&self, request: Request) -> Result<Response, MissionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Device {
                id: self.id,
                request,
                responder: tx,
            })
            .await
            .map_err(|_| MissionError::SessionClosed)?;
        let response = match self.request_timeout {
            Some(timeout) => tokio::time::timeout(timeout, rx)
                .await
                .map_err(|_| MissionError::Timeout)?,
            None => rx.await,
        };
        response.map_err(|_| MissionError::SessionClosed)?
    }

    /// The current index in the mesh directory.
    pub async fn index(&self) -> Result<usize, MissionError> {
        expect_response!(self.request(Request::Index).await?, Index)
    }

    /// Whether the device is reachable through the mesh.
    pub async fn is_available(&self) -> Result<bool, MissionError> {
        expect_response!(self.request(Request::IsAvailable).await?, IsAvailable)
    }

    /// The device name.
    pub async fn name(&self) -> Result<String, MissionError> {
        expect_response!(self.request(Request::Get(Query::Name)).await?, Name)
    }

    /// Renames the device and returns the name it reports.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NameTooLong`] without sending anything if `name` is longer than [`NAME_MAX_LENGTH`] bytes.
    pub async fn set_name(&self, name: impl Into<String>) -> Result<String, MissionError> {
        let name = name.into();
        if name.len() > NAME_MAX_LENGTH {
            return Err(ValidationError::NameTooLong(name.len()).into());
        }
        let update = Update::Name(Text::new(name)?);
        expect_response!(self.request(Request::Set(update)).await?, Name)
    }

    /// The device type.
    pub async fn device_type(&self) -> Result<DeviceType, MissionError> {
        expect_response!(self.request(Request::Get(Query::DeviceType)).await?, DeviceType)
    }

    /// Changes the device type and returns the type it reports.
    pub async fn set_device_type(&self, device_type: DeviceType) -> Result<DeviceType, MissionError> {
        let update = Update::DeviceType(device_type);
        expect_response!(self.request(Request::Set(update)).await?, DeviceType)
    }

    /// The sampling periods of every sensor.
    pub async fn sensor_data_configuration(&self) -> Result<SensorDataConfiguration, MissionError> {
        expect_response!(
            self.request(Request::Get(Query::SensorDataConfiguration))
                .await?,
            SensorDataConfiguration
        )
    }

    /// The sampling periods of the motion sensor.
    pub async fn motion_configuration(&self) -> Result<MotionConfiguration, MissionError> {
        Ok(self.sensor_data_configuration().await?.motion)
    }

    /// The sampling periods of the pressure sensors.
    pub async fn pressure_configuration(&self) -> Result<PressureConfiguration, MissionError> {
        Ok(self.sensor_data_configuration().await?.pressure)
    }

    /// Changes the sampling periods and returns the configuration the device reports.
    ///
    /// Periods are quantized down to a multiple of 20 ms, and only one pressure path is kept enabled.
    pub async fn set_sensor_data_configurations(
        &self,
        update: impl Into<SensorDataConfigurationUpdate>,
    ) -> Result<SensorDataConfiguration, MissionError> {
        let update = Update::SensorDataConfiguration(update.into().normalized());
        expect_response!(
            self.request(Request::Set(update)).await?,
            SensorDataConfiguration
        )
    }

    /// Changes the sampling periods of the motion sensor only.
    pub async fn set_motion_configuration(
        &self,
        motion: MotionConfiguration,
    ) -> Result<SensorDataConfiguration, MissionError> {
        self.set_sensor_data_configurations(SensorDataConfigurationUpdate {
            motion: Some(motion),
            pressure: None,
        })
        .await
    }

    /// Changes the sampling periods of the pressure sensors only.
    pub async fn set_pressure_configuration(
        &self,
        pressure: PressureConfiguration,
    ) -> Result<SensorDataConfiguration, MissionError> {
        self.set_sensor_data_configurations(SensorDataConfigurationUpdate {
            motion: None,
            pressure: Some(pressure),
        })
        .await
    }

    /// Plays a vibration pattern.
    ///
    /// Resolves once the pattern is queued. It is written to the link with the next flush and is not acknowledged.
    pub async fn vibrate(&self, vibration: &Vibration) -> Result<(), MissionError> {
        let data = vibration.to_bytes()?;
        match self.request(Request::Vibrate(data)).await? {
            Response::Sent => Ok(()),
            _ => Err(MissionError::UnexpectedResponse),
        }
    }

    /// The debug flag.
    pub async fn debug(&self) -> Result<bool, MissionError> {
        expect_response!(self.request(Request::Get(Query::Debug)).await?, Debug)
    }

    /// Changes the debug flag and returns the value the device reports.
    pub async fn set_debug(&self, debug: bool) -> Result<bool, MissionError> {
        expect_response!(
            self.request(Request::Set(Update::Debug(debug))).await?,
            Debug
        )
    }

    /// The battery level in percent.
    pub async fn battery_level(&self) -> Result<u8, MissionError> {
        expect_response!(
            self.request(Request::Get(Query::BatteryLevel)).await?,
            BatteryLevel
        )
    }

    /// The calibration scores of the motion sensor.
    pub async fn motion_calibration(&self) -> Result<MotionCalibration, MissionError> {
        expect_response!(
            self.request(Request::Get(Query::MotionCalibration)).await?,
            MotionCalibration
        )
    }
}
