//! Line-based chat client over the transport.
//!
//! Demonstrates:
//! - Building a transport with a channel sink
//! - Registering an open listener that greets the server
//! - Forwarding stdin lines as CRLF-terminated frames
//! - Closing with `/quit`
//!
//! Usage:
//!   cargo run --example chat_client -- ws://127.0.0.1:6667/chat
//!   cargo run --example chat_client -- ws://127.0.0.1:6667/chat --nick alice
//!   cargo run --example chat_client -- ws://127.0.0.1:6667/chat --debug

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use chat_transport::{EventKind, OutputEvent, Result, Transport, TransportConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_ADDRESS: &str = "ws://127.0.0.1:6667/chat";
const QUIT_COMMAND: &str = "/quit";

// ============================================================================
// Args
// ============================================================================

#[derive(Debug, Clone)]
struct Args {
    address: String,
    nick: Option<String>,
    debug: bool,
}

impl Args {
    fn parse() -> Self {
        Self::from_args(std::env::args().skip(1).collect())
    }

    fn from_args(args: Vec<String>) -> Self {
        let nick_at = args.iter().position(|a| a == "--nick");
        let nick = nick_at.and_then(|i| args.get(i + 1)).cloned();

        // First positional argument; a bad address is reported by the transport
        let address = args
            .iter()
            .enumerate()
            .find(|&(i, a)| !a.starts_with("--") && nick_at.is_none_or(|n| i != n + 1))
            .map(|(_, a)| a.clone())
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_owned());

        Self {
            address,
            nick,
            debug: args.iter().any(|a| a == "--debug"),
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "chat_transport=trace"
    } else {
        "chat_transport=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Chat Client: {} ===\n", args.address);

    let config = TransportConfig::new()
        .with_connect_timeout(Duration::from_secs(10))
        .with_close_timeout(Duration::from_secs(2));
    let (transport, mut events) = Transport::builder().config(config).build_channel()?;

    transport.connect(args.address.as_str());

    if let Some(nick) = args.nick {
        transport.on(EventKind::Open, move |ctx| {
            ctx.write(format!("NICK {nick}"));
            ctx.write(format!("USER {nick} 0 * :{nick}"));
        });
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    OutputEvent::Connected => println!("[connected]"),
                    OutputEvent::Sent(line) => println!("> {line}"),
                    OutputEvent::Received(line) => print!("< {line}"),
                    OutputEvent::Errored => println!("[error]"),
                    OutputEvent::Closed => {
                        println!("[closed]");
                        break;
                    }
                }
            }

            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) if line.trim() == QUIT_COMMAND => transport.close(),
                    Some(line) => {
                        if let Err(e) = transport.try_write(line) {
                            println!("[not sent: {e}]");
                        }
                    }
                    None => {
                        stdin_open = false;
                        transport.close();
                    }
                }
            }
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
