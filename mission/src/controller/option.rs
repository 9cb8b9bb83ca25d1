use std::time::Duration;

use mission_core::common::{
    DEFAULT_LIVENESS_INTERVAL, DEFAULT_RECONNECT_DELAY, DEFAULT_SENSOR_DATA_TIMEOUT,
    DEFAULT_TIMEOUT,
};

/// The option of a [`Controller`](super::Controller).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControllerOption {
    /// Timeout of opening the link.
    pub open_timeout: Duration,
    /// Timeout of a request. If `None`, a request waits until the device responds or disconnects.
    pub request_timeout: Option<Duration>,
    /// A request unanswered for this long is given up, and later requests of its type are sent again.
    pub response_timeout: Duration,
    /// The interval of the liveness check.
    pub liveness_interval: Duration,
    /// A device streaming nothing for longer than this gets its sensor data configuration re-sent.
    pub sensor_data_timeout: Duration,
    /// A mesh link that received nothing for longer than this is sent a `PING`.
    pub ping_interval: Duration,
    /// The delay before retrying after a failed reconnect of a link that reconnects immediately.
    pub retry_interval: Duration,
    /// The capacity of each event channel. Slow subscribers lag behind and skip events.
    pub event_capacity: usize,
}

impl Default for ControllerOption {
    fn default() -> Self {
        Self {
            open_timeout: DEFAULT_TIMEOUT,
            request_timeout: Some(DEFAULT_TIMEOUT),
            response_timeout: DEFAULT_TIMEOUT,
            liveness_interval: DEFAULT_LIVENESS_INTERVAL,
            sensor_data_timeout: DEFAULT_SENSOR_DATA_TIMEOUT,
            ping_interval: DEFAULT_LIVENESS_INTERVAL,
            retry_interval: DEFAULT_RECONNECT_DELAY,
            event_capacity: 256,
        }
    }
}
