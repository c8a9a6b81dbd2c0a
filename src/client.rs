use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::MmtResult;
use crate::protocol::{first_token, split_tag_value, Framer, Link};
use crate::registry::{DeviceClass, Endpoint};
use crate::simulator::Simulator;
use crate::transport::TcpTransport;

pub const DEFAULT_IDENT: &str = "MMT";
pub const DEFAULT_SELECTOR: &str = "all";

/// Tag to value, last occurrence wins.
pub type TagMap = HashMap<String, String>;

/// Set at construction, and not fixed after it: a live client becomes
/// `Disconnected` on [`DeviceClient::close`], and a socket client does too
/// once the peer hangs up or a read or write on it fails. `Failed` never
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Failed(String),
    Simulated,
}

/// One device, one socket (or one fixture).
///
/// A client that failed to connect, or has been closed, answers every
/// operation with an empty or absent result and performs no I/O. Errors are
/// only returned for faults on a live socket, such as a reset mid-reply or
/// an elapsed read deadline. There is no reconnection: build a new client to
/// retry.
#[derive(Debug)]
pub struct DeviceClient {
    endpoint: Endpoint,
    state: ConnectionState,
    framer: Framer,
}

impl DeviceClient {
    pub fn connect(endpoint: Endpoint, settings: &Settings) -> Self {
        Self::connect_with_timeout(endpoint, settings, settings.connect_timeout())
    }

    /// Like [`DeviceClient::connect`] with an explicit connect timeout.
    pub fn connect_with_timeout(
        endpoint: Endpoint,
        settings: &Settings,
        timeout: Option<Duration>,
    ) -> Self {
        if let Some(fixture) = settings.simulate.fixture() {
            debug!("simulating {} with {} fixture", endpoint, settings.simulate);
            return Self {
                endpoint,
                state: ConnectionState::Simulated,
                framer: Framer::new(Link::Simulated(Simulator::new(fixture))),
            };
        }

        match TcpTransport::open(&endpoint, timeout, settings.read_timeout()) {
            Ok(transport) => Self {
                endpoint,
                state: ConnectionState::Connected,
                framer: Framer::new(Link::Socket(transport)),
            },
            Err(e) => {
                let status = e.status();
                info!("{} unavailable: {}", endpoint, status);
                Self {
                    endpoint,
                    state: ConnectionState::Failed(status),
                    framer: Framer::new(Link::Closed),
                }
            }
        }
    }

    /// Client for a registered device class.
    pub fn open(class: DeviceClass, port: Option<u16>, settings: &Settings) -> Self {
        Self::connect(settings.registry.resolve(class, port), settings)
    }

    pub fn hexapod(settings: &Settings) -> Self {
        Self::open(DeviceClass::Hexapod, None, settings)
    }

    pub fn mount(settings: &Settings, port: Option<u16>) -> Self {
        Self::open(DeviceClass::Mount, port, settings)
    }

    pub fn sim(settings: &Settings, port: Option<u16>) -> Self {
        Self::open(DeviceClass::Sim, port, settings)
    }

    pub fn cell(settings: &Settings, port: Option<u16>) -> Self {
        Self::open(DeviceClass::Cell, port, settings)
    }

    pub fn bcell(settings: &Settings, port: Option<u16>) -> Self {
        Self::open(DeviceClass::Bcell, port, settings)
    }

    pub fn ecell(settings: &Settings, port: Option<u16>) -> Self {
        Self::open(DeviceClass::Ecell, port, settings)
    }

    pub fn bmount(settings: &Settings, port: Option<u16>) -> Self {
        Self::open(DeviceClass::Bmount, port, settings)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Failure reason, `None` when the client is usable.
    pub fn status(&self) -> Option<&str> {
        match &self.state {
            ConnectionState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, ConnectionState::Failed(_))
    }

    pub fn is_simulated(&self) -> bool {
        self.state == ConnectionState::Simulated
    }

    fn is_live(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::Simulated
        )
    }

    /// Run one exchange on a live link. A client that is not live answers
    /// `idle` without I/O; a socket that drops during the exchange leaves the
    /// client `Disconnected`.
    fn exchange<T, F>(&mut self, idle: T, op: F) -> MmtResult<T>
    where
        F: FnOnce(&mut Framer) -> MmtResult<T>,
    {
        if !self.is_live() {
            return Ok(idle);
        }
        let result = op(&mut self.framer);
        if self.is_live() && !self.framer.is_connected() && !self.framer.is_simulated() {
            info!("{} disconnected", self.endpoint);
            self.state = ConnectionState::Disconnected;
        }
        result
    }

    /// Send `@ident <id>` and return the status line.
    pub fn identify(&mut self, id: &str) -> MmtResult<Option<String>> {
        self.exchange(None, |framer| {
            framer.request_single_line(&format!("@ident {}", id))
        })
    }

    /// First token of every reply line, in arrival order.
    pub fn tags(&mut self, selector: &str) -> MmtResult<Vec<String>> {
        self.exchange(Vec::new(), |framer| {
            framer.request(selector)?;
            let mut tags = Vec::new();
            for line in framer.drain_lines() {
                let line = line?;
                if let Some(tag) = first_token(&line) {
                    tags.push(tag.to_string());
                }
            }
            Ok(tags)
        })
    }

    pub fn values(&mut self, selector: &str) -> MmtResult<TagMap> {
        self.exchange(TagMap::new(), |framer| {
            framer.request(selector)?;
            let mut values = TagMap::new();
            for line in framer.drain_lines() {
                let line = line?;
                if let Some((tag, value)) = split_tag_value(&line) {
                    values.insert(tag.to_string(), value.to_string());
                }
            }
            Ok(values)
        })
    }

    /// Value of `tag` from a `get <tag>` request.
    ///
    /// The whole reply is drained so the socket stays in step; the last
    /// matching line wins. `Some("")` means the device reported the tag
    /// with no value, `None` that the tag was not reported at all.
    pub fn get(&mut self, tag: &str) -> MmtResult<Option<String>> {
        self.exchange(None, |framer| {
            framer.request(&format!("get {}", tag))?;
            let mut found = None;
            for line in framer.drain_lines() {
                let line = line?;
                if let Some((t, value)) = split_tag_value(&line) {
                    if t == tag {
                        found = Some(value.to_string());
                    }
                }
            }
            Ok(found)
        })
    }

    pub fn command(&mut self, cmd: &str) -> MmtResult<Option<String>> {
        self.command_with_args(cmd, std::iter::empty::<&str>())
    }

    /// Send `cmd`, then each argument on its own line, then read one status
    /// line. Devices answer `OK` on success.
    pub fn command_with_args<I, A>(&mut self, cmd: &str, args: I) -> MmtResult<Option<String>>
    where
        I: IntoIterator<Item = A>,
        A: Display,
    {
        self.exchange(None, |framer| {
            framer.request(cmd)?;
            for arg in args {
                framer.request(&arg.to_string())?;
            }
            framer.read_status()
        })
    }

    /// Full reply to `version`.
    pub fn version(&mut self) -> MmtResult<Vec<String>> {
        self.lines("version")
    }

    /// Every reply line to `selector`, unparsed.
    pub fn lines(&mut self, selector: &str) -> MmtResult<Vec<String>> {
        self.exchange(Vec::new(), |framer| {
            framer.request(selector)?;
            framer.drain_lines().collect()
        })
    }

    /// Copy the reply to `selector` into `out`, one line per line. Returns
    /// the number of lines written.
    pub fn show<W: Write>(&mut self, selector: &str, out: &mut W) -> MmtResult<usize> {
        self.exchange(0, |framer| {
            copy_reply(framer, selector, |line| writeln!(out, "{}", line))
        })
    }

    /// Like [`DeviceClient::show`], each line prefixed by its length on the
    /// wire (newline included).
    pub fn dump<W: Write>(&mut self, selector: &str, out: &mut W) -> MmtResult<usize> {
        self.exchange(0, |framer| {
            copy_reply(framer, selector, |line| {
                writeln!(out, "{}{}", line.len() + 1, line)
            })
        })
    }

    // Binary register passthroughs; all are no-ops when simulated.

    pub fn send_register(&mut self, code: u16, address: u16) -> MmtResult<()> {
        self.exchange((), |framer| framer.write_register(code, address))
    }

    pub fn get_register(
        &mut self,
        code: u16,
        address: u16,
        count: usize,
    ) -> MmtResult<Option<Vec<u8>>> {
        self.exchange(None, |framer| framer.read_register(code, address, count))
    }

    pub fn peek_register(&mut self, count: usize) -> MmtResult<Option<Vec<u8>>> {
        self.exchange(None, |framer| framer.peek_register(count))
    }

    /// Release the socket. Safe to call more than once; a failed client
    /// keeps its failure reason.
    pub fn close(&mut self) {
        self.framer.close();
        if self.is_live() {
            self.state = ConnectionState::Disconnected;
        }
    }
}

/// Write each reply line through `emit`. If the writer fails the rest of the
/// reply is still on the socket, so the link is closed rather than left out
/// of step.
fn copy_reply<F>(framer: &mut Framer, selector: &str, mut emit: F) -> MmtResult<usize>
where
    F: FnMut(&str) -> io::Result<()>,
{
    framer.request(selector)?;
    let mut count = 0;
    let mut failure = None;
    for line in framer.drain_lines() {
        if let Err(e) = emit(line?.as_str()) {
            failure = Some(e);
            break;
        }
        count += 1;
    }
    match failure {
        Some(e) => {
            framer.close();
            Err(e.into())
        }
        None => Ok(count),
    }
}
