use std::io;
use thiserror::Error;

/// Errors raised by the device socket layer.
///
/// Construction failures never surface through this type: they are captured
/// as [`ConnectionState::Failed`](crate::client::ConnectionState::Failed) on
/// the client. These variants cover faults on an already established link
/// and configuration problems.
#[derive(Debug, Error)]
pub enum MmtError {
    #[error("Refusing connection")]
    ConnectionRefused,

    #[error("Error: {0}")]
    Connection(String),

    #[error("not connected")]
    NotConnected,

    /// Peer closed the socket. Line draining treats this as a terminator.
    #[error("end of stream")]
    EndOfStream,

    #[error("read deadline elapsed")]
    Timeout,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl MmtError {
    /// Classify an I/O error from a connect attempt or an established socket.
    pub fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => MmtError::ConnectionRefused,
            io::ErrorKind::UnexpectedEof => MmtError::EndOfStream,
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => MmtError::Timeout,
            _ => MmtError::Io(err),
        }
    }

    /// Status text recorded on a client whose construction failed.
    pub fn status(&self) -> String {
        match self {
            MmtError::ConnectionRefused => "Refusing connection".to_string(),
            MmtError::Connection(detail) => format!("Error: {}", detail),
            MmtError::Io(err) => format!("Error: {}", err),
            other => format!("Error: {}", other),
        }
    }
}

pub type MmtResult<T> = Result<T, MmtError>;
