//! Request encoder
//!
//! Turns a tokenized command into a RESP array of bulk strings.
//!
//! ## Wire Format
//! ```text
//! *<N>\r\n                 array header, N = number of arguments
//! $<len>\r\n<bytes>\r\n    one bulk string per argument, len in bytes
//! ```
//!
//! `["SET", "foo", "bar"]` becomes
//! `*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`.

use std::io::Write;

use crate::error::{ClientError, Result};

/// Line terminator used by every RESP header and payload
pub const CRLF: &[u8] = b"\r\n";

/// Per-argument framing overhead: `$`, up to 20 length digits, two CRLFs
const BULK_OVERHEAD: usize = 1 + 20 + 2 + 2;

/// Encode a command given as string tokens.
///
/// Each token is framed with its UTF-8 byte length, so multi-byte
/// characters are counted correctly. Tokens are taken as-is: embedded
/// whitespace stays inside a single bulk string.
pub fn encode_command<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<u8>> {
    let args: Vec<&[u8]> = tokens.iter().map(|t| t.as_ref().as_bytes()).collect();
    encode_bytes_command(&args)
}

/// Encode a command given as raw byte arguments
pub fn encode_bytes_command(args: &[&[u8]]) -> Result<Vec<u8>> {
    if args.is_empty() {
        return Err(ClientError::InvalidCommand(
            "command must have at least one token".to_string(),
        ));
    }

    let payload: usize = args.iter().map(|a| a.len() + BULK_OVERHEAD).sum();
    let mut message = Vec::with_capacity(1 + 20 + 2 + payload);

    write_header(&mut message, b'*', args.len());
    for arg in args {
        write_header(&mut message, b'$', arg.len());
        message.extend_from_slice(arg);
        message.extend_from_slice(CRLF);
    }

    Ok(message)
}

/// Encode a command and write it to a stream
pub fn write_command<W: Write, S: AsRef<str>>(writer: &mut W, tokens: &[S]) -> Result<()> {
    let bytes = encode_command(tokens)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// `<prefix><n>\r\n`
fn write_header(buf: &mut Vec<u8>, prefix: u8, n: usize) {
    buf.push(prefix);
    buf.extend_from_slice(n.to_string().as_bytes());
    buf.extend_from_slice(CRLF);
}
