//! kvcli Binary
//!
//! Interactive client for RESP key-value servers. With trailing command
//! words it runs that one command and exits instead.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use kvcli::repl;
use kvcli::{Client, ClientError, Config, FrameMode, Repl};
use tracing_subscriber::{fmt, EnvFilter};

/// kvcli
#[derive(Parser, Debug)]
#[command(name = "kvcli")]
#[command(about = "Interactive client for RESP key-value servers")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Read timeout in milliseconds (0 = wait forever)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// End replies at the first trailing CRLF instead of parsing RESP types
    #[arg(long)]
    legacy_framing: bool,

    /// Log filter used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Command to run once, e.g. `kvcli GET mykey`
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.log_level);
    tracing::debug!("kvcli v{} with {:?}", kvcli::VERSION, config);

    let mut client = match Client::connect(&config) {
        Ok(client) => client,
        Err(ClientError::ConnectionRefused { addr }) => {
            eprintln!("Could not connect to {}. Is the server running?", addr);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", config.addr(), e);
            return ExitCode::FAILURE;
        }
    };

    if !args.command.is_empty() {
        return run_once(&mut client, args.command);
    }

    println!("Connected to {}", client.addr());
    println!("Type commands (e.g., SET key value, GET key, QUIT to exit)");

    let repl = Repl::new(&client);
    match repl.run(&mut client, io::stdin().lock(), io::stdout().lock()) {
        Ok(repl::Exit::Desynced) => ExitCode::FAILURE,
        Ok(exit) => {
            tracing::debug!(?exit, "Session ended");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Defaults, then the config file, then command-line flags
fn load_config(args: &Args) -> kvcli::Result<Config> {
    let base = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let mut builder = base.into_builder();
    if let Some(host) = &args.host {
        builder = builder.host(host.as_str());
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    if let Some(ms) = args.timeout {
        builder = builder.read_timeout_ms(ms);
    }
    if args.legacy_framing {
        builder = builder.frame_mode(FrameMode::CrlfSuffix);
    }
    if let Some(level) = &args.log_level {
        builder = builder.log_level(level.as_str());
    }

    let config = builder.build();
    config.validate()?;
    Ok(config)
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stderr, so log lines never interleave with replies on stdout
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_once(client: &mut Client, mut tokens: Vec<String>) -> ExitCode {
    tokens[0].make_ascii_uppercase();

    match repl::run_once(client, &tokens, io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ClientError::ConnectionClosed) => {
            eprintln!("Server closed connection.");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
