use super::DecodeError;

/// The kind of a message, independent of the numeric tag used on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageType {
    /// Keep-alive.
    Ping,
    /// Battery level in percent.
    BatteryLevel,
    /// Request the device type.
    GetType,
    /// Change the device type.
    SetType,
    /// Request the device name.
    GetName,
    /// Change the device name.
    SetName,
    /// Motion sensor calibration scores.
    MotionCalibration,
    /// Request the sensor data configuration.
    GetSensorDataConfigurations,
    /// Change the sensor data configuration.
    SetSensorDataConfigurations,
    /// Sensor samples.
    SensorData,
    /// Vibration pattern.
    Vibration,
    /// Request the debug flag.
    GetDebug,
    /// Change the debug flag.
    SetDebug,
    /// Number of devices in a mesh and their availability.
    GetNumberOfDevices,
    /// A device joined a mesh.
    DeviceAdded,
    /// A device left a mesh.
    DeviceRemoved,
    /// The availability of a device in a mesh changed.
    DeviceIsAvailable,
    /// Device sub-frames addressed by index.
    DeviceMessage,
}

impl MessageType {
    /// Returns `true` if the message is a request that expects a response of the same type.
    #[must_use]
    pub const fn is_get(&self) -> bool {
        matches!(
            self,
            MessageType::GetType
                | MessageType::GetName
                | MessageType::GetSensorDataConfigurations
                | MessageType::GetDebug
                | MessageType::GetNumberOfDevices
        )
    }

    /// Returns `true` if the message changes a remote property.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        matches!(
            self,
            MessageType::SetType
                | MessageType::SetName
                | MessageType::SetSensorDataConfigurations
                | MessageType::SetDebug
        )
    }

    /// Returns the getter that reads the property a setter writes.
    #[must_use]
    pub const fn getter(&self) -> Option<MessageType> {
        match self {
            MessageType::SetType => Some(MessageType::GetType),
            MessageType::SetName => Some(MessageType::GetName),
            MessageType::SetSensorDataConfigurations => {
                Some(MessageType::GetSensorDataConfigurations)
            }
            MessageType::SetDebug => Some(MessageType::GetDebug),
            _ => None,
        }
    }
}

/// An immutable mapping between message types and wire tags.
#[derive(Debug)]
pub struct TagTable {
    name: &'static str,
    tags: &'static [MessageType],
    status_prefixed: bool,
}

impl TagTable {
    const fn new(
        name: &'static str,
        tags: &'static [MessageType],
        status_prefixed: bool,
    ) -> Self {
        Self {
            name,
            tags,
            status_prefixed,
        }
    }

    /// The name of the table.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if get/set responses carry a [`ResponseStatus`](super::ResponseStatus) byte after the tag.
    #[must_use]
    pub const fn status_prefixed(&self) -> bool {
        self.status_prefixed
    }

    /// Looks up the message type of a tag.
    pub fn message_type(&self, tag: u8) -> Result<MessageType, DecodeError> {
        self.tags
            .get(tag as usize)
            .copied()
            .ok_or(DecodeError::UnknownTag {
                tag,
                table: self.name,
            })
    }

    /// Looks up the tag of a message type.
    pub fn tag(&self, ty: MessageType) -> Result<u8, DecodeError> {
        self.tags
            .iter()
            .position(|&t| t == ty)
            .map(|i| i as u8)
            .ok_or(DecodeError::Unsupported(ty, self.name))
    }

    /// Returns `true` if the table can encode the message type.
    #[must_use]
    pub fn supports(&self, ty: MessageType) -> bool {
        self.tags.contains(&ty)
    }
}

const DEVICE_TAGS: [MessageType; 13] = [
    MessageType::Ping,
    MessageType::BatteryLevel,
    MessageType::GetType,
    MessageType::SetType,
    MessageType::GetName,
    MessageType::SetName,
    MessageType::MotionCalibration,
    MessageType::GetSensorDataConfigurations,
    MessageType::SetSensorDataConfigurations,
    MessageType::SensorData,
    MessageType::Vibration,
    MessageType::GetDebug,
    MessageType::SetDebug,
];

const PRIMARY_TAGS: [MessageType; 18] = [
    DEVICE_TAGS[0],
    DEVICE_TAGS[1],
    DEVICE_TAGS[2],
    DEVICE_TAGS[3],
    DEVICE_TAGS[4],
    DEVICE_TAGS[5],
    DEVICE_TAGS[6],
    DEVICE_TAGS[7],
    DEVICE_TAGS[8],
    DEVICE_TAGS[9],
    DEVICE_TAGS[10],
    DEVICE_TAGS[11],
    DEVICE_TAGS[12],
    MessageType::GetNumberOfDevices,
    MessageType::DeviceAdded,
    MessageType::DeviceRemoved,
    MessageType::DeviceIsAvailable,
    MessageType::DeviceMessage,
];

/// Tags of a device connected directly.
pub static DEVICE: TagTable = TagTable::new("device", &DEVICE_TAGS, false);

/// Tags of a device addressed through a mesh.
pub static MESH_DEVICE: TagTable = TagTable::new(
    "mesh device",
    &[
        MessageType::GetName,
        MessageType::SetName,
        MessageType::GetType,
        MessageType::SetType,
        MessageType::GetSensorDataConfigurations,
        MessageType::SetSensorDataConfigurations,
        MessageType::SensorData,
        MessageType::MotionCalibration,
        MessageType::BatteryLevel,
        MessageType::Vibration,
        MessageType::GetDebug,
        MessageType::SetDebug,
    ],
    true,
);

/// Tags of the mesh itself.
pub static MESH: TagTable = TagTable::new(
    "mesh",
    &[
        MessageType::Ping,
        MessageType::BatteryLevel,
        MessageType::GetNumberOfDevices,
        MessageType::DeviceAdded,
        MessageType::DeviceRemoved,
        MessageType::DeviceIsAvailable,
        MessageType::DeviceMessage,
    ],
    false,
);

/// Tags of a primary device that relays its peers over a radio link.
pub static PRIMARY: TagTable = TagTable::new("primary", &PRIMARY_TAGS, false);

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case(Ok(MessageType::Ping), &DEVICE, 0)]
    #[case(Ok(MessageType::SensorData), &DEVICE, 9)]
    #[case(Ok(MessageType::SetDebug), &DEVICE, 12)]
    #[case(Err(DecodeError::UnknownTag { tag: 13, table: "device" }), &DEVICE, 13)]
    #[case(Ok(MessageType::GetName), &MESH_DEVICE, 0)]
    #[case(Ok(MessageType::SetName), &MESH_DEVICE, 1)]
    #[case(Ok(MessageType::SensorData), &MESH_DEVICE, 6)]
    #[case(Ok(MessageType::DeviceMessage), &MESH, 6)]
    #[case(Ok(MessageType::GetNumberOfDevices), &PRIMARY, 13)]
    #[case(Ok(MessageType::DeviceMessage), &PRIMARY, 17)]
    fn message_type(
        #[case] expected: Result<MessageType, DecodeError>,
        #[case] table: &TagTable,
        #[case] tag: u8,
    ) {
        assert_eq!(expected, table.message_type(tag));
    }

    #[rstest::rstest]
    #[case(&DEVICE)]
    #[case(&MESH_DEVICE)]
    #[case(&MESH)]
    #[case(&PRIMARY)]
    fn tag_is_inverse(#[case] table: &TagTable) {
        (0..=u8::MAX)
            .filter_map(|tag| table.message_type(tag).ok().map(|ty| (tag, ty)))
            .for_each(|(tag, ty)| assert_eq!(Ok(tag), table.tag(ty)));
    }

    #[test]
    fn primary_extends_device() {
        (0..DEVICE_TAGS.len() as u8).for_each(|tag| {
            assert_eq!(DEVICE.message_type(tag), PRIMARY.message_type(tag));
        });
    }

    #[test]
    fn unsupported() {
        assert_eq!(
            Err(DecodeError::Unsupported(MessageType::Ping, "mesh device")),
            MESH_DEVICE.tag(MessageType::Ping)
        );
        assert!(!DEVICE.supports(MessageType::DeviceMessage));
    }

    #[rstest::rstest]
    #[case(Some(MessageType::GetName), MessageType::SetName)]
    #[case(Some(MessageType::GetDebug), MessageType::SetDebug)]
    #[case(None, MessageType::GetName)]
    fn getter(#[case] expected: Option<MessageType>, #[case] ty: MessageType) {
        assert_eq!(expected, ty.getter());
    }
}
