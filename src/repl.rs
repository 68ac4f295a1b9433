//! Interactive Loop
//!
//! Reads lines, turns them into commands, and prints the server's replies.
//! Input and output are plain `BufRead`/`Write` handles, so the loop runs
//! the same over a terminal or over in-memory buffers.

use std::io::{BufRead, Write};

use crate::error::{ClientError, Result};
use crate::network::Client;

/// Text shown for `HELP`
pub const HELP_TEXT: &str = "\
Commands are sent to the server as typed, split on whitespace.
  SET key value   - Set a key
  GET key         - Get a key
  DEL key         - Delete a key
  KEYS pattern    - Find keys (e.g. KEYS *)
  PING            - Test connection
  help            - Show this help
  quit / exit     - Exit client";

/// One parsed line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A command to send; the first token is upper-cased
    Command(Vec<String>),

    /// Show local help
    Help,

    /// End the session
    Quit,
}

/// Parse a line of input. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<Input> {
    let mut tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
    let name = tokens.first_mut()?;

    if name.eq_ignore_ascii_case("quit") || name.eq_ignore_ascii_case("exit") {
        return Some(Input::Quit);
    }
    if name.eq_ignore_ascii_case("help") {
        return Some(Input::Help);
    }

    name.make_ascii_uppercase();
    Some(Input::Command(tokens))
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// `QUIT`/`EXIT` was entered
    Quit,

    /// Input ran out
    EndOfInput,

    /// The server closed the connection
    ServerClosed,

    /// An exchange failed part way and the connection can't be trusted
    Desynced,
}

/// Send one command, print its trimmed reply, and return.
///
/// Used for one-shot mode. An empty reply prints nothing. If the server
/// hung up instead of answering in full, whatever arrived is printed and
/// [`ClientError::ConnectionClosed`] is returned.
pub fn run_once<O: Write>(client: &mut Client, tokens: &[String], mut output: O) -> Result<()> {
    let reply = client.execute(tokens)?;
    print_reply(&mut output, &reply)?;
    if client.peer_closed() {
        return Err(ClientError::ConnectionClosed);
    }
    Ok(())
}

fn print_reply<O: Write>(output: &mut O, reply: &str) -> Result<()> {
    let reply = reply.trim();
    if !reply.is_empty() {
        writeln!(output, "{}", reply)?;
    }
    Ok(())
}

/// Prompt loop over a connected client
pub struct Repl {
    prompt: String,
}

impl Repl {
    /// Create a loop whose prompt names the client's server
    pub fn new(client: &Client) -> Self {
        Self::with_prompt(format!("{}> ", client.addr()))
    }

    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    /// Run until quit, end of input, or the connection is lost.
    ///
    /// A rejected command is reported and the loop carries on. A failure
    /// part way through an exchange (timeout, malformed or oversized reply)
    /// is reported and ends the session with [`Exit::Desynced`], since the
    /// rest of that reply may still be in flight. Only failures to read
    /// input or write output end it with an error.
    ///
    /// Ctrl-C is not handled here: SIGINT terminates the process without
    /// running `Client`'s `Drop`, and the OS closes the socket.
    pub fn run<I: BufRead, O: Write>(
        &self,
        client: &mut Client,
        mut input: I,
        mut output: O,
    ) -> Result<Exit> {
        let mut line = String::new();

        loop {
            write!(output, "{}", self.prompt)?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                return Ok(Exit::EndOfInput);
            }

            let tokens = match parse_line(&line) {
                None => continue,
                Some(Input::Quit) => return Ok(Exit::Quit),
                Some(Input::Help) => {
                    writeln!(output, "{}", HELP_TEXT)?;
                    continue;
                }
                Some(Input::Command(tokens)) => tokens,
            };

            match client.execute(&tokens) {
                Ok(reply) => {
                    print_reply(&mut output, &reply)?;
                    if client.peer_closed() {
                        writeln!(output, "Server closed connection.")?;
                        return Ok(Exit::ServerClosed);
                    }
                }
                Err(ClientError::ConnectionClosed) => {
                    tracing::debug!("Command {} ended the session", tokens[0]);
                    writeln!(output, "Server closed connection.")?;
                    return Ok(Exit::ServerClosed);
                }
                Err(e) => {
                    tracing::warn!("Command {} failed: {}", tokens[0], e);
                    writeln!(output, "Error: {}", e)?;
                    if client.is_desynced() {
                        writeln!(output, "Connection out of sync, closing.")?;
                        return Ok(Exit::Desynced);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_ignored() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   \t \n"), None);
    }

    #[test]
    fn test_quit_and_exit_any_case() {
        for line in ["quit", "QUIT", "Exit", "  exit  \n", "quit now"] {
            assert_eq!(parse_line(line), Some(Input::Quit), "line {:?}", line);
        }
    }

    #[test]
    fn test_help() {
        assert_eq!(parse_line("Help"), Some(Input::Help));
    }

    #[test]
    fn test_command_name_upper_cased_args_untouched() {
        assert_eq!(
            parse_line("set Key  Value\n"),
            Some(Input::Command(vec![
                "SET".to_string(),
                "Key".to_string(),
                "Value".to_string()
            ]))
        );
    }

    #[test]
    fn test_quit_is_only_matched_as_command_name() {
        assert_eq!(
            parse_line("get quit"),
            Some(Input::Command(vec!["GET".to_string(), "quit".to_string()]))
        );
    }
}
