use serde::{Deserialize, Serialize};

use crate::queue::TimerAnchor;

/// Top-level configuration settings for a node.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    pub node: NodeSettings,
    pub discovery: DiscoverySettings,
    pub transport: TransportSettings,
    pub display: DisplaySettings,
    pub queue: QueueSettings,
}

/// Identity and WebSocket listener of this node, plus peers to dial at start.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeSettings {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub seeds: Vec<String>,
}

/// UDP broadcast discovery.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DiscoverySettings {
    pub enabled: bool,
    pub port: u16,
    pub interval_secs: u64,
}

/// Redial policy for seed connections.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TransportSettings {
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
}

/// OSC target and clip layout on the wall.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DisplaySettings {
    pub host: String,
    pub port: u16,
    pub layer: u32,
    pub slots: Vec<u32>,
    pub clear_slot: u32,
    pub uppercase: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct QueueSettings {
    pub timeout_minutes: u64,
    pub remote_timer_anchor: TimerAnchor,
}

impl QueueSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_minutes.saturating_mul(60))
    }
}

/// Partial configuration settings loaded from files or environment.
///
/// Every field is optional; missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub node: Option<PartialNodeSettings>,
    pub discovery: Option<PartialDiscoverySettings>,
    pub transport: Option<PartialTransportSettings>,
    pub display: Option<PartialDisplaySettings>,
    pub queue: Option<PartialQueueSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialNodeSettings {
    pub name: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub seeds: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialDiscoverySettings {
    pub enabled: Option<bool>,
    pub port: Option<u16>,
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialTransportSettings {
    pub backoff_initial_ms: Option<u64>,
    pub backoff_max_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialDisplaySettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub layer: Option<u32>,
    pub slots: Option<Vec<u32>>,
    pub clear_slot: Option<u32>,
    pub uppercase: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialQueueSettings {
    pub timeout_minutes: Option<u64>,
    pub remote_timer_anchor: Option<TimerAnchor>,
}

impl PartialSettings {
    pub fn merge_over(self, default: Settings) -> Settings {
        Settings {
            node: self.node.unwrap_or_default().merge_over(default.node),
            discovery: self
                .discovery
                .unwrap_or_default()
                .merge_over(default.discovery),
            transport: self
                .transport
                .unwrap_or_default()
                .merge_over(default.transport),
            display: self.display.unwrap_or_default().merge_over(default.display),
            queue: self.queue.unwrap_or_default().merge_over(default.queue),
        }
    }
}

impl PartialNodeSettings {
    fn merge_over(self, default: NodeSettings) -> NodeSettings {
        NodeSettings {
            name: self.name.unwrap_or(default.name),
            host: self.host.unwrap_or(default.host),
            port: self.port.unwrap_or(default.port),
            seeds: self.seeds.unwrap_or(default.seeds),
        }
    }
}

impl PartialDiscoverySettings {
    fn merge_over(self, default: DiscoverySettings) -> DiscoverySettings {
        DiscoverySettings {
            enabled: self.enabled.unwrap_or(default.enabled),
            port: self.port.unwrap_or(default.port),
            interval_secs: self.interval_secs.unwrap_or(default.interval_secs),
        }
    }
}

impl PartialTransportSettings {
    fn merge_over(self, default: TransportSettings) -> TransportSettings {
        TransportSettings {
            backoff_initial_ms: self.backoff_initial_ms.unwrap_or(default.backoff_initial_ms),
            backoff_max_ms: self.backoff_max_ms.unwrap_or(default.backoff_max_ms),
        }
    }
}

impl PartialDisplaySettings {
    fn merge_over(self, default: DisplaySettings) -> DisplaySettings {
        DisplaySettings {
            host: self.host.unwrap_or(default.host),
            port: self.port.unwrap_or(default.port),
            layer: self.layer.unwrap_or(default.layer),
            slots: self.slots.unwrap_or(default.slots),
            clear_slot: self.clear_slot.unwrap_or(default.clear_slot),
            uppercase: self.uppercase.unwrap_or(default.uppercase),
        }
    }
}

impl PartialQueueSettings {
    fn merge_over(self, default: QueueSettings) -> QueueSettings {
        QueueSettings {
            timeout_minutes: self.timeout_minutes.unwrap_or(default.timeout_minutes),
            remote_timer_anchor: self
                .remote_timer_anchor
                .unwrap_or(default.remote_timer_anchor),
        }
    }
}

/// Provides default values for `Settings`.
///
/// Port 7000 is the usual OSC input port of the mixing software.
impl Default for Settings {
    fn default() -> Self {
        Self {
            node: NodeSettings {
                name: "clipqueue".to_string(),
                host: "0.0.0.0".to_string(),
                port: 7878,
                seeds: Vec::new(),
            },
            discovery: DiscoverySettings {
                enabled: true,
                port: 7879,
                interval_secs: 5,
            },
            transport: TransportSettings {
                backoff_initial_ms: 500,
                backoff_max_ms: 30_000,
            },
            display: DisplaySettings {
                host: "127.0.0.1".to_string(),
                port: 7000,
                layer: 1,
                slots: vec![1, 2, 3],
                clear_slot: 4,
                uppercase: false,
            },
            queue: QueueSettings {
                timeout_minutes: 10,
                remote_timer_anchor: TimerAnchor::Timestamp,
            },
        }
    }
}
