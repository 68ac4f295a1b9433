//! # kvcli
//!
//! An interactive command-line client for key-value servers that speak RESP
//! (the Redis serialization protocol):
//! - Encodes whitespace-split commands as RESP arrays of bulk strings
//! - Reads back one reply per command, delimited by RESP type
//! - Blocking, single-connection sessions with scoped cleanup
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            REPL (stdin/stdout)           │
//! └────────────────────┬─────────────────────┘
//!                      │ tokens
//! ┌────────────────────▼─────────────────────┐
//! │                 Client                   │
//! │          (owns the TcpStream)            │
//! └─────────┬──────────────────────▲─────────┘
//!           │                      │
//!           ▼                      │
//!   ┌──────────────┐       ┌───────┴────────┐
//!   │   Encoder    │       │ ResponseReader │
//!   │ (*N / $len)  │       │ (frame scanner)│
//!   └──────┬───────┘       └───────▲────────┘
//!          │                       │
//!          └──────► socket ────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod repl;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ClientError, Result};
pub use config::{Config, FrameMode};
pub use network::Client;
pub use repl::Repl;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvcli
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
