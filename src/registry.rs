use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MmtError;

pub const DEFAULT_MOUNT_HOST: &str = "mount";
pub const DEFAULT_MOUNT_PORT: u16 = 5240;
pub const DEFAULT_HEXAPOD_HOST: &str = "hexapod";
pub const DEFAULT_HEXAPOD_PORT: u16 = 5340;

pub const SIM_HOST: &str = "vxsim";
pub const SIM_PORT: u16 = 5240;
pub const CELL_HOST: &str = "mmtcell";
pub const CELL_PORT: u16 = 5810;
pub const BCELL_PORT: u16 = 5800;
pub const ECELL_PORT: u16 = 5801;
pub const BMOUNT_PORT: u16 = 5220;

/// Register port used by `reboot` for every host but the cell crate.
pub const REBOOT_PORT: u16 = 5230;
pub const CELL_REBOOT_PORT: u16 = 5899;

/// Identifies one device instance on the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Hexapod,
    Mount,
    /// Mount software running on the vxsim simulation crate.
    Sim,
    Cell,
    Bcell,
    Ecell,
    /// Binary register port of the mount crate.
    Bmount,
}

impl DeviceClass {
    pub const ALL: [DeviceClass; 7] = [
        DeviceClass::Hexapod,
        DeviceClass::Mount,
        DeviceClass::Sim,
        DeviceClass::Cell,
        DeviceClass::Bcell,
        DeviceClass::Ecell,
        DeviceClass::Bmount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DeviceClass::Hexapod => "hexapod",
            DeviceClass::Mount => "mount",
            DeviceClass::Sim => "sim",
            DeviceClass::Cell => "cell",
            DeviceClass::Bcell => "bcell",
            DeviceClass::Ecell => "ecell",
            DeviceClass::Bmount => "bmount",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceClass {
    type Err = MmtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceClass::ALL
            .iter()
            .copied()
            .find(|class| class.name() == s)
            .ok_or_else(|| MmtError::Config(format!("unknown device class '{}'", s)))
    }
}

/// Default endpoints for the well-known device classes.
///
/// Only the hexapod and mount endpoints are configurable; the simulation and
/// cell crates sit on fixed hosts and ports. `bmount` follows the mount host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registry {
    pub mount: Endpoint,
    pub hexapod: Endpoint,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            mount: Endpoint::new(DEFAULT_MOUNT_HOST, DEFAULT_MOUNT_PORT),
            hexapod: Endpoint::new(DEFAULT_HEXAPOD_HOST, DEFAULT_HEXAPOD_PORT),
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the mount crate and/or port; `None` keeps the current value.
    pub fn set_mount(&mut self, host: Option<&str>, port: Option<u16>) {
        if let Some(host) = host {
            self.mount.host = host.to_string();
        }
        if let Some(port) = port {
            self.mount.port = port;
        }
    }

    pub fn set_hexapod(&mut self, host: Option<&str>, port: Option<u16>) {
        if let Some(host) = host {
            self.hexapod.host = host.to_string();
        }
        if let Some(port) = port {
            self.hexapod.port = port;
        }
    }

    /// Endpoint for `class`, with an optional port override.
    ///
    /// The hexapod always answers on its registered port, so the override is
    /// ignored for it.
    pub fn resolve(&self, class: DeviceClass, port: Option<u16>) -> Endpoint {
        match class {
            DeviceClass::Hexapod => self.hexapod.clone(),
            DeviceClass::Mount => {
                Endpoint::new(self.mount.host.clone(), port.unwrap_or(self.mount.port))
            }
            DeviceClass::Sim => Endpoint::new(SIM_HOST, port.unwrap_or(SIM_PORT)),
            DeviceClass::Cell => Endpoint::new(CELL_HOST, port.unwrap_or(CELL_PORT)),
            DeviceClass::Bcell => Endpoint::new(CELL_HOST, port.unwrap_or(BCELL_PORT)),
            DeviceClass::Ecell => Endpoint::new(CELL_HOST, port.unwrap_or(ECELL_PORT)),
            DeviceClass::Bmount => {
                Endpoint::new(self.mount.host.clone(), port.unwrap_or(BMOUNT_PORT))
            }
        }
    }

    /// Register port that accepts the reboot frame on `host`.
    pub fn reboot_endpoint(host: &str) -> Endpoint {
        let port = if host == CELL_HOST {
            CELL_REBOOT_PORT
        } else {
            REBOOT_PORT
        };
        Endpoint::new(host, port)
    }
}
