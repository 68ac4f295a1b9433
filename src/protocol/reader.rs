//! Response reader
//!
//! Reads one server reply from a byte stream and returns it as text.
//!
//! Bytes are pulled in fixed-size chunks into an accumulator until either
//! the peer closes the stream (a read returns 0 bytes) or the termination
//! rule of the configured [`FrameMode`] is met:
//!
//! - [`FrameMode::Resp`] walks the buffered bytes by RESP type and stops
//!   once one whole reply is present. Anything read past the end of that
//!   reply stays buffered for the next call.
//! - [`FrameMode::CrlfSuffix`] stops as soon as the buffer ends with CRLF.
//!   A multi-element reply whose chunk happens to end on an inner CRLF is
//!   cut short; the rest shows up at the start of the next read.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use bytes::BytesMut;

use crate::config::{Config, FrameMode, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RESPONSE_SIZE};
use crate::error::{ClientError, Result};

use super::encoder::CRLF;
use super::frame::FrameScanner;

/// Read one reply with default settings.
///
/// Bytes past the end of the reply are discarded along with the reader;
/// keep a [`ResponseReader`] around to carry them over between calls.
pub fn read_response<R: Read>(conn: &mut R) -> Result<String> {
    ResponseReader::default().read(conn)
}

/// Stateful reply reader bound to one connection
#[derive(Debug)]
pub struct ResponseReader {
    mode: FrameMode,
    chunk_size: usize,
    max_response_size: usize,

    /// Read timeout of the underlying socket, reported on timeout errors
    timeout: Option<Duration>,

    /// Accumulated bytes not yet handed out
    buffer: BytesMut,

    /// Progress through the reply at the front of `buffer`
    scanner: FrameScanner,

    /// Whether the last read ended because the peer closed the stream
    peer_closed: bool,
}

impl Default for ResponseReader {
    fn default() -> Self {
        Self::new(FrameMode::default())
    }
}

impl ResponseReader {
    /// Create a reader with the default chunk and size limits
    pub fn new(mode: FrameMode) -> Self {
        Self {
            mode,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            timeout: None,
            buffer: BytesMut::with_capacity(DEFAULT_CHUNK_SIZE),
            scanner: FrameScanner::new(),
            peer_closed: false,
        }
    }

    /// Create a reader from the protocol section of a config
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.frame_mode)
            .with_chunk_size(config.chunk_size)
            .with_max_response_size(config.max_response_size)
            .with_timeout(config.read_timeout())
    }

    /// Set the number of bytes requested per read (minimum 1)
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Set the largest reply accepted
    pub fn with_max_response_size(mut self, size: usize) -> Self {
        self.max_response_size = size;
        self
    }

    /// Record the socket read timeout so timeout errors can report it
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn mode(&self) -> FrameMode {
        self.mode
    }

    /// Whether the most recent read ended because the peer closed the stream
    pub fn peer_closed(&self) -> bool {
        self.peer_closed
    }

    /// Bytes received past the end of the last reply
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Read one reply from `conn` and decode it as (lossy) UTF-8 text.
    ///
    /// On error the accumulator is cleared, so a half-read reply never
    /// leaks into the next call.
    pub fn read<R: Read>(&mut self, conn: &mut R) -> Result<String> {
        self.peer_closed = false;
        let result = self.read_frame(conn);
        if result.is_err() {
            self.buffer.clear();
            self.scanner.reset();
        }
        result.map(|frame| String::from_utf8_lossy(&frame).into_owned())
    }

    fn read_frame<R: Read>(&mut self, conn: &mut R) -> Result<BytesMut> {
        let mut chunk = vec![0u8; self.chunk_size];

        loop {
            if let Some(len) = self.complete_len()? {
                tracing::trace!(len, leftover = self.buffer.len() - len, "Reply complete");
                self.scanner.reset();
                return Ok(self.buffer.split_to(len));
            }

            if self.buffer.len() > self.max_response_size {
                return Err(ClientError::Protocol(format!(
                    "reply exceeds {} bytes",
                    self.max_response_size
                )));
            }

            let n = match conn.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ClientError::from_socket(e, self.timeout)),
            };

            if n == 0 {
                tracing::debug!(buffered = self.buffer.len(), "Peer closed the stream");
                self.peer_closed = true;
                self.scanner.reset();
                return Ok(self.buffer.split());
            }

            tracing::trace!(n, "Read chunk");
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Length of the first complete reply in the buffer, if there is one
    fn complete_len(&mut self) -> Result<Option<usize>> {
        match self.mode {
            FrameMode::Resp => self.scanner.advance(&self.buffer),
            FrameMode::CrlfSuffix => {
                Ok(self.buffer.ends_with(CRLF).then(|| self.buffer.len()))
            }
        }
    }
}
