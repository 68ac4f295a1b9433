//! RESP reply framing
//!
//! Finds where the first complete reply in a buffer ends, without building
//! any values. Used by the response reader to know when to stop reading.
//!
//! ## Reply Types
//! ```text
//! +  -  :  _  ,  #  (     line      <prefix><text>\r\n
//! $  !  =                 blob      <prefix><len>\r\n<len bytes>\r\n   (len -1 = null)
//! *  ~  >                 aggregate <prefix><n>\r\n then n replies      (n -1 = null)
//! %                       map       <prefix><n>\r\n then 2n replies
//! |                       attribute <prefix><n>\r\n then 2n replies, then the reply itself
//! ```
//!
//! Aggregates are laid out depth-first, so a running count of replies
//! still owed is enough to walk nested arrays without recursion.
//!
//! [`FrameScanner`] keeps that count and its position between calls, so a
//! reply arriving in many chunks is scanned once rather than from the start
//! on every chunk.

use std::fmt::Display;

use crate::error::{ClientError, Result};

/// Scan `buf` for one complete reply.
///
/// Returns `Ok(Some(len))` with the reply's length in bytes once it is
/// fully buffered, `Ok(None)` if more bytes are needed, or a protocol error
/// if the bytes cannot be a RESP reply.
pub fn frame_len(buf: &[u8]) -> Result<Option<usize>> {
    FrameScanner::new().advance(buf)
}

/// Resumable scan over a growing buffer
///
/// Each call to [`advance`](FrameScanner::advance) must be given the same
/// buffer as before, possibly with more bytes appended. Elements already
/// walked are not looked at again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameScanner {
    /// Start of the first element not yet fully buffered
    pos: usize,

    /// Replies still owed before the top-level reply is complete
    owed: u64,

    /// Where to resume looking for the CRLF ending the header at `pos`
    line_from: usize,
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScanner {
    pub fn new() -> Self {
        Self {
            pos: 0,
            owed: 1,
            line_from: 0,
        }
    }

    /// Forget all progress, ready for the next reply
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Offset up to which the buffer has been fully accounted for
    pub fn scanned(&self) -> usize {
        self.pos
    }

    /// Continue scanning `buf` from where the last call stopped
    pub fn advance(&mut self, buf: &[u8]) -> Result<Option<usize>> {
        while self.owed > 0 {
            let Some(&kind) = buf.get(self.pos) else {
                return Ok(None);
            };
            let search_from = self.line_from.max(self.pos + 1);
            let Some(line_end) = find_crlf(buf, search_from) else {
                // the last byte may be the '\r' of a split CRLF
                self.line_from = buf.len().saturating_sub(1).max(self.pos + 1);
                return Ok(None);
            };
            let header = &buf[self.pos + 1..line_end];
            let mut next = line_end + 2;
            let mut owed = self.owed - 1;

            match kind {
                b'+' | b'-' | b':' | b'_' | b',' | b'#' | b'(' => {}
                b'$' | b'!' | b'=' => {
                    if let Some(len) = parse_length(kind, header)? {
                        let end = next
                            .checked_add(len)
                            .and_then(|n| n.checked_add(2))
                            .ok_or_else(|| too_large(len))?;
                        if buf.len() < end {
                            self.line_from = line_end;
                            return Ok(None);
                        }
                        if &buf[end - 2..end] != b"\r\n" {
                            return Err(ClientError::Protocol(format!(
                                "bulk reply of {} bytes is not followed by CRLF",
                                len
                            )));
                        }
                        next = end;
                    }
                }
                b'*' | b'~' | b'>' => {
                    if let Some(n) = parse_length(kind, header)? {
                        owed = add_owed(owed, n as u64)?;
                    }
                }
                b'%' => {
                    if let Some(n) = parse_length(kind, header)? {
                        owed = add_owed(owed, (n as u64).saturating_mul(2))?;
                    }
                }
                b'|' => {
                    if let Some(n) = parse_length(kind, header)? {
                        owed = add_owed(owed, (n as u64).saturating_mul(2).saturating_add(1))?;
                    }
                }
                other => {
                    return Err(ClientError::Protocol(format!(
                        "unknown reply type byte 0x{:02x}",
                        other
                    )))
                }
            }

            self.pos = next;
            self.owed = owed;
            self.line_from = next;
        }

        Ok(Some(self.pos))
    }
}

/// Index of the first `\r\n` at or after `from`
pub(crate) fn find_crlf(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|i| from + i)
}

/// Parse a length/count header. `-1` is the null marker and yields `None`.
fn parse_length(kind: u8, header: &[u8]) -> Result<Option<usize>> {
    let value: i64 = std::str::from_utf8(header)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            ClientError::Protocol(format!(
                "invalid length '{}' in '{}' reply",
                String::from_utf8_lossy(header),
                kind as char
            ))
        })?;

    match value {
        -1 => Ok(None),
        n if n < -1 => Err(ClientError::Protocol(format!(
            "negative length {} in '{}' reply",
            n, kind as char
        ))),
        n => usize::try_from(n).map(Some).map_err(|_| too_large(n)),
    }
}

fn add_owed(owed: u64, more: u64) -> Result<u64> {
    owed.checked_add(more)
        .ok_or_else(|| ClientError::Protocol("aggregate reply is too large".to_string()))
}

fn too_large(len: impl Display) -> ClientError {
    ClientError::Protocol(format!("reply length {} is too large", len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_crlf() {
        assert_eq!(find_crlf(b"ab\r\ncd\r\n", 0), Some(2));
        assert_eq!(find_crlf(b"ab\r\ncd\r\n", 3), Some(6));
        assert_eq!(find_crlf(b"ab\r", 0), None);
        assert_eq!(find_crlf(b"ab", 5), None);
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length(b'$', b"5").unwrap(), Some(5));
        assert_eq!(parse_length(b'$', b"-1").unwrap(), None);
        assert!(parse_length(b'$', b"-2").is_err());
        assert!(parse_length(b'*', b"x").is_err());
        assert!(parse_length(b'*', b"").is_err());
    }

    #[test]
    fn test_scanner_stops_at_last_complete_element() {
        let mut scanner = FrameScanner::new();
        assert_eq!(scanner.advance(b"*3\r\n$3\r\nfoo\r\n$3\r\nba").unwrap(), None);
        assert_eq!(scanner.scanned(), 13);
        assert_eq!(scanner.owed, 2);
        assert_eq!(scanner.line_from, 15);
    }

    #[test]
    fn test_scanner_resumes_split_crlf() {
        let mut scanner = FrameScanner::new();
        assert_eq!(scanner.advance(b"+OK\r").unwrap(), None);
        assert_eq!(scanner.line_from, 3);
        assert_eq!(scanner.advance(b"+OK\r\n").unwrap(), Some(5));
    }

    #[test]
    fn test_reset() {
        let mut scanner = FrameScanner::new();
        scanner.advance(b"*2\r\n:1\r\n").unwrap();
        scanner.reset();
        assert_eq!(scanner, FrameScanner::new());
    }
}
