//! Network Module
//!
//! TCP connection handling for the client.
//!
//! ## Model
//! - One blocking connection per session
//! - One exchange (request then reply) at a time
//! - Connection closed when the `Client` is dropped

mod client;

pub use client::Client;
