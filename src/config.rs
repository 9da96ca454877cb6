//! Transport and network configuration.
//!
//! Plain structs with `Default`. All of them round-trip through JSON with
//! durations written as milliseconds, and any missing field takes its
//! default:
//!
//! ```
//! use std::time::Duration;
//! use satlink::config::NetworkConfig;
//!
//! let config = NetworkConfig::from_json_str(r#"{ "liveness_timeout": 2500 }"#).unwrap();
//! assert_eq!(config.liveness_timeout, Duration::from_millis(2500));
//! assert_eq!(config.monitor_interval, Duration::from_millis(10));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::protocol::DEFAULT_RING_CAPACITY;

/// Default send queue depth, in frames.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default number of bytes written to the link per chunk.
pub const DEFAULT_TX_CHUNK_SIZE: usize = 32;

/// Default time a `send` may wait for queue space.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Default number of bytes requested from the link per read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64;

/// Default depth of the decoded inbound message queue.
pub const DEFAULT_INBOUND_QUEUE_DEPTH: usize = 32;

/// Default time since last valid frame before a satellite is inactive.
pub const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default monitor loop poll interval.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_millis(10);

/// Default wait after an ID assignment broadcast.
pub const DEFAULT_DISCOVERY_SETTLE: Duration = Duration::from_millis(500);

/// Default limit on concurrently running application handlers.
pub const DEFAULT_MAX_CONCURRENT_HANDLERS: usize = 16;

/// Configuration for a send worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Frames that may wait in the send queue.
    pub queue_capacity: usize,
    /// Bytes written per chunk before yielding.
    pub chunk_size: usize,
    /// How long `send` waits for queue space; `None` waits indefinitely.
    #[serde(with = "option_millis")]
    pub send_timeout: Option<Duration>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            chunk_size: DEFAULT_TX_CHUNK_SIZE,
            send_timeout: Some(DEFAULT_SEND_TIMEOUT),
        }
    }
}

/// Configuration for a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Receive ring buffer capacity in bytes (also used by the relay worker).
    pub ring_capacity: usize,
    /// Bytes requested from the link per read.
    pub read_chunk_size: usize,
    /// Decoded messages held for `receive` before the worker waits.
    pub inbound_queue_depth: usize,
    /// Send worker settings, shared by upstream and downstream writers.
    pub writer: WriterConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ring_capacity: DEFAULT_RING_CAPACITY,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            inbound_queue_depth: DEFAULT_INBOUND_QUEUE_DEPTH,
            writer: WriterConfig::default(),
        }
    }
}

impl TransportConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Configuration for a [`SatelliteNetworkManager`](crate::network::SatelliteNetworkManager).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    #[serde(with = "millis")]
    pub liveness_timeout: Duration,
    #[serde(with = "millis")]
    pub monitor_interval: Duration,
    #[serde(with = "millis")]
    pub discovery_settle: Duration,
    pub max_concurrent_handlers: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT,
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            discovery_settle: DEFAULT_DISCOVERY_SETTLE,
            max_concurrent_handlers: DEFAULT_MAX_CONCURRENT_HANDLERS,
        }
    }
}

impl NetworkConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod option_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}
