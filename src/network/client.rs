//! Client Connection
//!
//! Owns the TCP connection to the server for the length of a session.

use std::io::{ErrorKind, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::protocol::{encode_command, ResponseReader};

/// A connected client session
///
/// The socket is shut down when the client is dropped, so every exit path
/// (quit, error, early return) releases the connection.
pub struct Client {
    /// TCP stream, used for both directions
    stream: TcpStream,

    /// Reply reader holding any bytes received past the last reply
    reader: ResponseReader,

    /// `host:port` as configured, for the prompt and for logging
    addr: String,

    write_timeout: Option<Duration>,

    /// Set once an exchange failed part way; the stream may still hold
    /// bytes of a reply nobody will read
    desynced: bool,
}

impl Client {
    /// Connect to the server named in `config`
    ///
    /// Every resolved address is tried in turn. A refusal from the last one
    /// is reported as [`ClientError::ConnectionRefused`].
    pub fn connect(config: &Config) -> Result<Self> {
        config.validate()?;
        let addr = config.addr();

        let candidates: Vec<SocketAddr> = addr
            .to_socket_addrs()
            .map_err(|e| ClientError::Config(format!("cannot resolve {}: {}", addr, e)))?
            .collect();

        let mut last_err = None;
        for candidate in &candidates {
            let attempt = match config.connect_timeout() {
                Some(timeout) => TcpStream::connect_timeout(candidate, timeout),
                None => TcpStream::connect(candidate),
            };
            match attempt {
                Ok(stream) => {
                    tracing::debug!("Connected to {} ({})", addr, candidate);
                    return Self::from_stream(stream, addr, config);
                }
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", candidate, e);
                    last_err = Some(e);
                }
            }
        }

        Err(match last_err {
            Some(e) if e.kind() == ErrorKind::ConnectionRefused => {
                ClientError::ConnectionRefused { addr }
            }
            Some(e) if e.kind() == ErrorKind::TimedOut => {
                ClientError::Timeout(config.connect_timeout().unwrap_or_default())
            }
            Some(e) => ClientError::Io(e),
            None => ClientError::Config(format!("{} resolved to no addresses", addr)),
        })
    }

    /// Wrap an already connected stream
    ///
    /// Disables Nagle's algorithm and applies the configured timeouts.
    pub fn from_stream(stream: TcpStream, addr: impl Into<String>, config: &Config) -> Result<Self> {
        stream.set_nodelay(true)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        Ok(Self {
            stream,
            reader: ResponseReader::from_config(config),
            addr: addr.into(),
            write_timeout: config.write_timeout(),
            desynced: false,
        })
    }

    /// Send one command and wait for its reply.
    ///
    /// A failed write or read (timeout, protocol error, oversized reply)
    /// leaves the rest of that reply on the socket, where it would be read
    /// as the answer to the next command. The client refuses further
    /// commands after such a failure with [`ClientError::Desynced`].
    pub fn execute<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<String> {
        if self.desynced {
            return Err(ClientError::Desynced);
        }
        let request = encode_command(tokens)?;
        tracing::debug!(
            command = tokens[0].as_ref(),
            args = tokens.len() - 1,
            bytes = request.len(),
            "Sending command to {}",
            self.addr
        );

        let result = self.exchange(&request);
        if let Err(e) = &result {
            if e.leaves_stream_dirty() {
                tracing::warn!(error = %e, "Connection to {} is out of sync", self.addr);
                self.desynced = true;
            }
        }
        result
    }

    fn exchange(&mut self, request: &[u8]) -> Result<String> {
        self.stream
            .write_all(request)
            .and_then(|()| self.stream.flush())
            .map_err(|e| ClientError::from_socket(e, self.write_timeout))?;

        let reply = self.reader.read(&mut self.stream)?;
        tracing::trace!(bytes = reply.len(), "Reply from {}", self.addr);
        Ok(reply)
    }

    /// Whether an earlier failure left the connection unusable
    pub fn is_desynced(&self) -> bool {
        self.desynced
    }

    /// Whether the server closed the connection during the last exchange
    pub fn peer_closed(&self) -> bool {
        self.reader.peer_closed()
    }

    /// The `host:port` this client was configured with
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => tracing::debug!("Closed connection to {}", self.addr),
            // already gone on the other side
            Err(e) if e.kind() == ErrorKind::NotConnected => {}
            Err(e) => tracing::warn!("Error closing connection to {}: {}", self.addr, e),
        }
    }
}
