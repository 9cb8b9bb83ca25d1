use mission_core::codec::MessageType;
use uuid::Uuid;

const BASE_UUID: u128 = 0x0000_0000_6d69_7373_696f_6e2d_626c_6500;

const fn vendor_uuid(id: u16) -> Uuid {
    Uuid::from_u128(BASE_UUID | ((id as u128) << 96))
}

/// The primary service of a mission device.
pub const SERVICE_UUID: Uuid = vendor_uuid(0x0001);

/// A characteristic of the mission service.
///
/// Values are whole messages, tag first, encoded with the device tag table (or the primary table for a
/// primary device).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Characteristic {
    /// Name requests.
    Name,
    /// Device type requests.
    DeviceType,
    /// Sensor data configuration requests.
    SensorDataConfiguration,
    /// Sensor samples.
    SensorData,
    /// Motion calibration scores.
    MotionCalibration,
    /// Battery level, the standard battery level characteristic.
    BatteryLevel,
    /// Vibration patterns.
    Vibration,
    /// Debug flag requests.
    Debug,
    /// Everything else, including the messages relayed for peers.
    Message,
}

impl Characteristic {
    /// Every characteristic.
    pub const ALL: [Self; 9] = [
        Self::Name,
        Self::DeviceType,
        Self::SensorDataConfiguration,
        Self::SensorData,
        Self::MotionCalibration,
        Self::BatteryLevel,
        Self::Vibration,
        Self::Debug,
        Self::Message,
    ];

    /// The UUID of the characteristic.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        match self {
            Self::Name => vendor_uuid(0x0002),
            Self::DeviceType => vendor_uuid(0x0003),
            Self::SensorDataConfiguration => vendor_uuid(0x0004),
            Self::SensorData => vendor_uuid(0x0005),
            Self::MotionCalibration => vendor_uuid(0x0006),
            Self::BatteryLevel => Uuid::from_u128(0x0000_2a19_0000_1000_8000_0080_5f9b_34fb),
            Self::Vibration => vendor_uuid(0x0007),
            Self::Debug => vendor_uuid(0x0008),
            Self::Message => vendor_uuid(0x0009),
        }
    }

    /// Looks up a characteristic by UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.uuid() == uuid)
    }

    /// The characteristic that carries messages of type `ty`.
    #[must_use]
    pub const fn for_message(ty: MessageType) -> Self {
        match ty {
            MessageType::GetName | MessageType::SetName => Self::Name,
            MessageType::GetType | MessageType::SetType => Self::DeviceType,
            MessageType::GetSensorDataConfigurations
            | MessageType::SetSensorDataConfigurations => Self::SensorDataConfiguration,
            MessageType::SensorData => Self::SensorData,
            MessageType::MotionCalibration => Self::MotionCalibration,
            MessageType::BatteryLevel => Self::BatteryLevel,
            MessageType::Vibration => Self::Vibration,
            MessageType::GetDebug | MessageType::SetDebug => Self::Debug,
            _ => Self::Message,
        }
    }

    /// Returns `true` if the host subscribes to notifications of the characteristic.
    #[must_use]
    pub const fn is_notified(&self) -> bool {
        !matches!(self, Self::Vibration)
    }
}
