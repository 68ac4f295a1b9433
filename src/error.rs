//! Error types for kvcli
//!
//! Provides a unified error type for all client operations.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type alias using ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

/// Unified error type for kvcli operations
#[derive(Debug, Error)]
pub enum ClientError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("Could not connect to {addr}")]
    ConnectionRefused { addr: String },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timed out after {0:?} waiting for the server")]
    Timeout(Duration),

    #[error("Connection out of sync: an earlier reply was not fully read")]
    Desynced,

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Classify an I/O error raised while talking to the server.
    ///
    /// `timeout` is the read/write timeout in effect, reported back when the
    /// socket gave up waiting.
    pub fn from_socket(err: io::Error, timeout: Option<Duration>) -> Self {
        match err.kind() {
            io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof => ClientError::ConnectionClosed,
            // Unix reports an expired SO_RCVTIMEO as WouldBlock, Windows as TimedOut
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                ClientError::Timeout(timeout.unwrap_or_default())
            }
            _ => ClientError::Io(err),
        }
    }

    /// Whether this error can leave part of a reply unread on the socket.
    ///
    /// After such an error the next bytes on the stream may belong to the
    /// abandoned reply, so the connection must not be reused.
    pub fn leaves_stream_dirty(&self) -> bool {
        !matches!(
            self,
            ClientError::InvalidCommand(_)
                | ClientError::Config(_)
                | ClientError::ConnectionRefused { .. }
        )
    }
}
