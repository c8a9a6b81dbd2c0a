//! Framing for the two device sub-protocols.
//!
//! The binary register protocol sends a fixed 4-byte frame and reads back a
//! caller-sized block of raw bytes. The line protocol sends one text line and
//! reads replies until a sentinel line beginning with [`SENTINEL`]. Device
//! firmware has no length prefix, so a reader that misses the sentinel would
//! block forever on variable-length replies.

use std::slice;
use tracing::{debug, trace};

use crate::error::{MmtError, MmtResult};
use crate::simulator::{Simulator, SIMULATED_STATUS};
use crate::transport::TcpTransport;

pub const SENTINEL: &str = ".EOF";
pub const REGISTER_FRAME_LEN: usize = 4;

/// Status line reported when there is no socket to read from.
pub const NOT_CONNECTED_STATUS: &str = "IES";

/// Register request: `[u16 code][u16 address]`, big-endian, no acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFrame {
    pub code: u16,
    pub address: u16,
}

impl RegisterFrame {
    pub fn new(code: u16, address: u16) -> Self {
        Self { code, address }
    }

    pub fn encode(&self) -> [u8; REGISTER_FRAME_LEN] {
        let code = self.code.to_be_bytes();
        let address = self.address.to_be_bytes();
        [code[0], code[1], address[0], address[1]]
    }

    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < REGISTER_FRAME_LEN {
            return None;
        }
        Some(Self {
            code: u16::from_be_bytes([buf[0], buf[1]]),
            address: u16::from_be_bytes([buf[2], buf[3]]),
        })
    }
}

pub fn is_sentinel(line: &str) -> bool {
    line.starts_with(SENTINEL)
}

/// Strip one trailing `\n` (and a `\r` before it).
pub fn chomp(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Split a reply line into its tag and the remainder after the first
/// whitespace run. A line holding only a tag yields an empty value; a blank
/// line yields `None`.
pub fn split_tag_value(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((tag, rest)) => Some((tag, rest.trim_start())),
        None => Some((line, "")),
    }
}

pub fn first_token(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

/// What a framer talks to.
#[derive(Debug)]
pub enum Link {
    Socket(TcpTransport),
    Simulated(Simulator),
    Closed,
}

#[derive(Debug)]
pub struct Framer {
    link: Link,
}

impl Framer {
    pub fn new(link: Link) -> Self {
        Self { link }
    }

    pub fn is_connected(&self) -> bool {
        matches!(&self.link, Link::Socket(t) if t.is_open())
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self.link, Link::Simulated(_))
    }

    // Binary register protocol

    pub fn write_register(&mut self, code: u16, address: u16) -> MmtResult<()> {
        let Link::Socket(transport) = &mut self.link else {
            return Ok(());
        };
        let frame = RegisterFrame::new(code, address);
        debug!("register write code={} address={}", code, address);
        transport.write_bytes(&frame.encode())
    }

    pub fn read_register(
        &mut self,
        code: u16,
        address: u16,
        count: usize,
    ) -> MmtResult<Option<Vec<u8>>> {
        if !self.is_connected() {
            return Ok(None);
        }
        self.write_register(code, address)?;
        self.peek_register(count)
    }

    /// Read `count` raw bytes without sending a frame first.
    pub fn peek_register(&mut self, count: usize) -> MmtResult<Option<Vec<u8>>> {
        match &mut self.link {
            Link::Socket(transport) => transport.read_bytes(count),
            _ => Ok(None),
        }
    }

    // Line protocol

    pub fn request(&mut self, text: &str) -> MmtResult<()> {
        match &mut self.link {
            Link::Socket(transport) => {
                trace!("-> {}", text);
                transport.write_line(text)
            }
            _ => Ok(()),
        }
    }

    /// Lines of the reply to the last request, sentinel excluded.
    ///
    /// On a socket the stream ends at the sentinel or when the peer closes.
    /// A simulated link replays its whole fixture with no sentinel check.
    pub fn drain_lines(&mut self) -> ResponseLines<'_> {
        match &mut self.link {
            Link::Socket(transport) => ResponseLines::Socket {
                transport,
                done: false,
            },
            Link::Simulated(sim) => ResponseLines::Simulated(sim.replay()),
            Link::Closed => ResponseLines::Empty,
        }
    }

    /// Read one status line, trailing newline removed.
    ///
    /// Simulated links always answer `OK`; a missing socket answers `IES`.
    /// `None` means the peer closed before sending anything.
    pub fn read_status(&mut self) -> MmtResult<Option<String>> {
        match &mut self.link {
            Link::Simulated(_) => Ok(Some(SIMULATED_STATUS.to_string())),
            Link::Socket(transport) if transport.is_open() => {
                let line = transport.read_line()?;
                Ok(line.map(|l| chomp(&l).to_string()))
            }
            _ => Ok(Some(NOT_CONNECTED_STATUS.to_string())),
        }
    }

    pub fn request_single_line(&mut self, text: &str) -> MmtResult<Option<String>> {
        self.request(text)?;
        self.read_status()
    }

    /// Drop whatever the framer talks to. Idempotent.
    pub fn close(&mut self) {
        if let Link::Socket(transport) = &mut self.link {
            transport.close();
        }
        self.link = Link::Closed;
    }
}

/// Lazily produced reply lines, newline stripped.
///
/// Dropping the iterator early leaves unread reply lines on the socket.
pub enum ResponseLines<'a> {
    Socket {
        transport: &'a mut TcpTransport,
        done: bool,
    },
    Simulated(slice::Iter<'a, String>),
    Empty,
}

impl Iterator for ResponseLines<'_> {
    type Item = MmtResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ResponseLines::Socket { transport, done } => {
                if *done {
                    return None;
                }
                match transport.read_line() {
                    Ok(Some(line)) if is_sentinel(&line) => {
                        *done = true;
                        None
                    }
                    Ok(Some(line)) => {
                        trace!("<- {}", chomp(&line));
                        Some(Ok(chomp(&line).to_string()))
                    }
                    Ok(None) | Err(MmtError::EndOfStream) => {
                        *done = true;
                        None
                    }
                    Err(e) => {
                        *done = true;
                        Some(Err(e))
                    }
                }
            }
            ResponseLines::Simulated(lines) => lines.next().map(|line| Ok(line.clone())),
            ResponseLines::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_frame_big_endian() {
        assert_eq!(RegisterFrame::new(123, 0).encode(), [0x00, 0x7b, 0x00, 0x00]);
        assert_eq!(
            RegisterFrame::new(0x1234, 0xabcd).encode(),
            [0x12, 0x34, 0xab, 0xcd]
        );
    }

    #[test]
    fn test_register_frame_decode() {
        let frame = RegisterFrame::decode(&[0x00, 0x01, 0xff, 0xfe, 0x99]).unwrap();
        assert_eq!(frame, RegisterFrame::new(1, 0xfffe));
        assert!(RegisterFrame::decode(&[0x00, 0x01, 0x02]).is_none());
    }

    #[test]
    fn test_sentinel_prefix() {
        assert!(is_sentinel(".EOF\n"));
        assert!(is_sentinel(".EOF trailing"));
        assert!(!is_sentinel("xEOF\n"));
        assert!(!is_sentinel(" .EOF\n"));
    }

    #[test]
    fn test_split_tag_value() {
        assert_eq!(split_tag_value("reply_s The Lights are on"), Some(("reply_s", "The Lights are on")));
        assert_eq!(split_tag_value("lvdt_1   -26380"), Some(("lvdt_1", "-26380")));
        assert_eq!(split_tag_value("lonely"), Some(("lonely", "")));
        assert_eq!(split_tag_value("   "), None);
    }

    #[test]
    fn test_chomp() {
        assert_eq!(chomp("? bogus\n"), "? bogus");
        assert_eq!(chomp("crlf\r\n"), "crlf");
        assert_eq!(chomp("bare"), "bare");
    }

    #[test]
    fn test_closed_link_degrades() {
        let mut framer = Framer::new(Link::Closed);
        assert!(framer.request("all").is_ok());
        assert_eq!(framer.drain_lines().count(), 0);
        assert_eq!(framer.read_status().unwrap().as_deref(), Some(NOT_CONNECTED_STATUS));
        assert!(framer.read_register(1, 2, 4).unwrap().is_none());
    }

    #[test]
    fn test_simulated_link_replays() {
        let mut framer = Framer::new(Link::Simulated(Simulator::new("a 1\nb 2\n")));
        framer.request("ignored").unwrap();
        let lines: Vec<String> = framer.drain_lines().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["a 1", "b 2"]);
        assert_eq!(framer.read_status().unwrap().as_deref(), Some("OK"));
        assert!(framer.peek_register(2).unwrap().is_none());
    }
}
