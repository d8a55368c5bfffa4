use crate::error::Result;
use hotspot_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// How often the driver polls the playback position.
    pub tick_interval_ms: u64,
    /// How long to wait for mpv to create its IPC socket.
    pub socket_wait_ms: u64,
    /// Read timeout for a single IPC round trip.
    pub ipc_timeout_ms: u64,
    pub mpv_binary: String,
    /// Appended to the mpv command line after the built-in flags.
    pub extra_args: Vec<String>,
    pub engine: EngineConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            socket_wait_ms: 5000,
            ipc_timeout_ms: 2000,
            mpv_binary: "mpv".to_string(),
            extra_args: vec![],
            engine: EngineConfig::default(),
        }
    }
}

impl PlayerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.engine.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&data)
    }

    pub fn tick_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic.
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn socket_wait(&self) -> Duration {
        Duration::from_millis(self.socket_wait_ms)
    }

    pub fn ipc_timeout(&self) -> Duration {
        Duration::from_millis(self.ipc_timeout_ms)
    }
}
