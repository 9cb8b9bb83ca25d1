pub use crate::{
    controller::{Controller, ControllerOption, DeviceHandle},
    device::{ConnectionState, DeviceEvent, DeviceId},
    error::MissionError,
    mesh::MeshEvent,
};

pub use mission_core::{
    common::{deg, rad, Angle},
    device_type::{DeviceType, InsoleSide},
    geometry::*,
    link::{Link, LinkError, LinkKind, ReconnectPolicy},
    sensor::{
        MotionCalibration, MotionConfiguration, MotionDataType, PressureConfiguration,
        PressureData, PressureDataType, SensorDataConfiguration, SensorDataConfigurationUpdate,
        SensorEvent,
    },
    vibration::{Vibration, WaveformSegment},
    ValidationError,
};

#[cfg(feature = "link-audit")]
pub use crate::link::{Audit, AuditHandle};
