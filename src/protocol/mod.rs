//! Protocol Module
//!
//! RESP request encoding and reply framing.
//!
//! ## Request Format
//! ```text
//! *<N>\r\n
//! $<len>\r\n<arg 1>\r\n
//! ...
//! $<len>\r\n<arg N>\r\n
//! ```
//!
//! ## Reply Handling
//! Replies are not turned into values. The reader only decides where a
//! reply ends and hands back its bytes as text, see [`reader`].

mod encoder;
mod frame;
pub mod reader;

pub use crate::config::FrameMode;
pub use encoder::{encode_bytes_command, encode_command, write_command, CRLF};
pub use frame::{frame_len, FrameScanner};
pub use reader::{read_response, ResponseReader};
