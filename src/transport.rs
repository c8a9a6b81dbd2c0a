//! Blocking TCP link to one device.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{MmtError, MmtResult};
use crate::registry::Endpoint;

/// Owns the socket to a single device, or nothing once closed.
///
/// Writes on a closed transport are silently dropped and reads report end of
/// stream, so callers holding a dead link degrade instead of failing. The
/// transport closes itself when the peer hangs up or any read or write fails.
#[derive(Debug)]
pub struct TcpTransport {
    endpoint: Endpoint,
    stream: Option<BufReader<TcpStream>>,
}

impl TcpTransport {
    /// One connection attempt per resolved address, no retries.
    pub fn open(
        endpoint: &Endpoint,
        connect_timeout: Option<Duration>,
        read_timeout: Option<Duration>,
    ) -> MmtResult<Self> {
        let addrs = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(|e| MmtError::Connection(e.to_string()))?;

        let mut last_err = None;
        for addr in addrs {
            let attempt = match connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_read_timeout(read_timeout)?;
                    stream.set_nodelay(true)?;
                    debug!("connected to {} ({})", endpoint, addr);
                    return Ok(Self {
                        endpoint: endpoint.clone(),
                        stream: Some(BufReader::new(stream)),
                    });
                }
                Err(e) => {
                    debug!("connect to {} ({}) failed: {}", endpoint, addr, e);
                    last_err = Some(e);
                }
            }
        }

        let err = match last_err {
            Some(e) if e.kind() == io::ErrorKind::ConnectionRefused => MmtError::ConnectionRefused,
            Some(e) => MmtError::Connection(e.to_string()),
            None => MmtError::Connection(format!("no address found for {}", endpoint.host)),
        };
        warn!("cannot connect to {}: {}", endpoint, err);
        Err(err)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Send `text` followed by a newline.
    pub fn write_line(&mut self, text: &str) -> MmtResult<()> {
        let mut buf = Vec::with_capacity(text.len() + 1);
        buf.extend_from_slice(text.as_bytes());
        buf.push(b'\n');
        self.write_bytes(&buf)
    }

    pub fn write_bytes(&mut self, buf: &[u8]) -> MmtResult<()> {
        let Some(reader) = self.stream.as_mut() else {
            return Ok(());
        };
        let stream = reader.get_mut();
        let result = stream.write_all(buf).and_then(|()| stream.flush());
        self.settle(result)
    }

    /// Next raw line including its newline, or `None` once the peer closes.
    ///
    /// A trailing fragment without a newline is returned as the last line.
    pub fn read_line(&mut self) -> MmtResult<Option<String>> {
        let Some(reader) = self.stream.as_mut() else {
            return Ok(None);
        };
        let mut raw = Vec::new();
        let result = reader.read_until(b'\n', &mut raw);
        if self.settle(result)? == 0 {
            debug!("{} closed the connection", self.endpoint);
            self.close();
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
    }

    /// Read `count` raw bytes, fewer only if the peer closes first.
    ///
    /// Returns `None` when nothing at all arrives before end of stream.
    pub fn read_bytes(&mut self, count: usize) -> MmtResult<Option<Vec<u8>>> {
        let Some(reader) = self.stream.as_mut() else {
            return Ok(None);
        };
        let mut buf = vec![0u8; count];
        let mut filled = 0;
        let mut eof = false;
        let mut result = Ok(());
        while filled < count {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => {
                    eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.settle(result)?;
        if eof {
            debug!("{} closed the connection", self.endpoint);
            self.close();
        }
        if filled == 0 && count > 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        Ok(Some(buf))
    }

    /// A fault leaves the stream at an unknown point in a reply, so the
    /// socket is dropped and later calls behave as on a closed transport.
    fn settle<T>(&mut self, result: io::Result<T>) -> MmtResult<T> {
        result.map_err(|e| {
            let err = MmtError::from_io(e);
            warn!("dropping connection to {}: {}", self.endpoint, err);
            self.close();
            err
        })
    }

    pub fn close(&mut self) {
        if let Some(reader) = self.stream.take() {
            let _ = reader.get_ref().shutdown(Shutdown::Both);
            debug!("closed connection to {}", self.endpoint);
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}
