//! Client settings.
//!
//! Everything the client consults at construction time lives in one
//! [`Settings`] value: connect timeout, optional read deadline, simulation
//! mode and the device registry. Build it once at startup (or load it from a
//! JSON file) and pass it to every client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{MmtError, MmtResult};
use crate::registry::Registry;
use crate::simulator::{HEXAPOD_FIXTURE, MOUNT_FIXTURE};

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1500;

/// Which canned fixture replaces real hardware, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    #[default]
    Off,
    Hexapod,
    Mount,
}

impl SimulationMode {
    pub fn fixture(self) -> Option<&'static str> {
        match self {
            SimulationMode::Off => None,
            SimulationMode::Hexapod => Some(HEXAPOD_FIXTURE),
            SimulationMode::Mount => Some(MOUNT_FIXTURE),
        }
    }

    pub fn is_active(self) -> bool {
        self != SimulationMode::Off
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SimulationMode::Off => "off",
            SimulationMode::Hexapod => "hexapod",
            SimulationMode::Mount => "mount",
        })
    }
}

impl FromStr for SimulationMode {
    type Err = MmtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" | "none" => Ok(SimulationMode::Off),
            "hexapod" => Ok(SimulationMode::Hexapod),
            "mount" => Ok(SimulationMode::Mount),
            other => Err(MmtError::Config(format!(
                "unknown simulation mode '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub connect_timeout_ms: u64,
    /// Per-line read deadline. `None` blocks until the device answers.
    pub read_timeout_ms: Option<u64>,
    pub simulate: SimulationMode,
    pub registry: Registry,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: None,
            simulate: SimulationMode::Off,
            registry: Registry::default(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn simulated(mode: SimulationMode) -> Self {
        Self {
            simulate: mode,
            ..Self::default()
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout_ms =
            timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_simulation(mut self, mode: SimulationMode) -> Self {
        self.simulate = mode;
        self
    }

    /// Zero disables the connect timeout and falls back to the OS default.
    pub fn connect_timeout(&self) -> Option<Duration> {
        if self.connect_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.connect_timeout_ms))
        }
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    pub fn from_json(text: &str) -> MmtResult<Self> {
        serde_json::from_str(text).map_err(|e| MmtError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> MmtResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| MmtError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> MmtResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MmtError::Config(e.to_string()))
    }
}
