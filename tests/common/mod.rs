//! Shared helpers for tests that talk to a real socket

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use kvcli::protocol::frame_len;
use kvcli::Config;

/// What the scripted server does after receiving each request
pub enum Step {
    /// Write these parts, pausing briefly between them
    Reply(&'static [&'static [u8]]),

    /// Wait this many milliseconds, then write the parts
    Late(u64, &'static [&'static [u8]]),

    /// Close the connection without replying
    Hangup,
}

/// A one-connection server running a fixed script on a background thread
pub struct ScriptedServer {
    pub port: u16,
    handle: JoinHandle<Vec<Vec<u8>>>,
}

impl ScriptedServer {
    /// Start listening on an ephemeral loopback port.
    ///
    /// After the script runs out the server keeps the connection open and
    /// waits for the client to close it.
    pub fn start(script: Vec<Step>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut pending = Vec::new();
            let mut requests = Vec::new();

            for step in script {
                match read_request(&mut stream, &mut pending) {
                    Some(request) => requests.push(request),
                    None => return requests,
                }
                match step {
                    Step::Reply(parts) => {
                        for (i, part) in parts.iter().enumerate() {
                            if i > 0 {
                                thread::sleep(Duration::from_millis(30));
                            }
                            stream.write_all(part).unwrap();
                            stream.flush().unwrap();
                        }
                    }
                    Step::Late(ms, parts) => {
                        thread::sleep(Duration::from_millis(ms));
                        for part in parts {
                            // the client may already have given up and closed
                            if stream.write_all(part).is_err() {
                                return requests;
                            }
                        }
                    }
                    Step::Hangup => return requests,
                }
            }

            // drain until the client goes away
            let mut buf = [0u8; 1024];
            while matches!(stream.read(&mut buf), Ok(n) if n > 0) {}
            requests
        });

        Self { port, handle }
    }

    /// Config pointing at this server
    pub fn config(&self) -> Config {
        Config::builder()
            .host("127.0.0.1")
            .port(self.port)
            .read_timeout_ms(2000)
            .build()
    }

    /// Wait for the server to finish and return the raw requests it got.
    ///
    /// Only returns once the client has closed the connection (or the
    /// script hung up), so it also checks that the client released it.
    pub fn finish(self) -> Vec<Vec<u8>> {
        self.handle.join().unwrap()
    }
}

/// Read one RESP request; `None` if the client closed first
fn read_request<R: Read>(stream: &mut R, pending: &mut Vec<u8>) -> Option<Vec<u8>> {
    let mut buf = [0u8; 1024];
    loop {
        if let Some(len) = frame_len(pending).unwrap() {
            return Some(pending.drain(..len).collect());
        }
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => pending.extend_from_slice(&buf[..n]),
        }
    }
}
