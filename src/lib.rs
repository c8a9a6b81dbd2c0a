//! # MMT Device Socket Client
//!
//! A blocking client for the line protocol spoken by the MMT hexapod, mount
//! and cell controller crates, plus their binary register port.
//!
//! ## Features
//!
//! - **Line protocol**: status dumps, single tag reads and free-form commands,
//!   with replies terminated by a `.EOF` sentinel line
//! - **Register protocol**: 4-byte big-endian `(code, address)` frames for
//!   low-level diagnostics and crate reboot
//! - **Simulation**: canned fixtures replace the socket so scripts can run
//!   without hardware
//! - **Degrade, don't fail**: a client that could not connect answers every
//!   query with an empty result
//!
//! ## Quick Start
//!
//! ```rust
//! use mmtsock::{DeviceClient, Settings, SimulationMode};
//!
//! let settings = Settings::simulated(SimulationMode::Hexapod);
//! let mut hexapod = DeviceClient::hexapod(&settings);
//!
//! let reply = hexapod.get("reply_s").unwrap();
//! assert_eq!(reply.as_deref(), Some("The Lights are on"));
//!
//! let values = hexapod.values("all").unwrap();
//! assert_eq!(values["pod_status"], "0000");
//! hexapod.close();
//! ```
//!
//! ## Architecture
//!
//! - [`transport`] - Blocking TCP link to one device
//! - [`protocol`] - Register frames and sentinel-terminated line framing
//! - [`simulator`] - Fixture replay standing in for a socket
//! - [`client`] - Device operations (`tags`, `values`, `get`, `command`, ...)
//! - [`registry`] - Well-known device classes and their endpoints
//! - [`shortcuts`] - Open, query, close helpers and crate reboot
//! - [`config`] - Settings threaded into every client
//! - [`responder`] - Device side of the line protocol, used by the emulator

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod responder;
pub mod shortcuts;
pub mod simulator;
pub mod transport;

// Re-export main public types for convenience
pub use client::{ConnectionState, DeviceClient, TagMap};
pub use config::{Settings, SimulationMode};
pub use error::{MmtError, MmtResult};
pub use protocol::RegisterFrame;
pub use registry::{DeviceClass, Endpoint, Registry};
pub use simulator::Simulator;
