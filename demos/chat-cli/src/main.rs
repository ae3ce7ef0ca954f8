//! Terminal chat client.
//!
//! ```bash
//! chat-cli alice "Alice"
//! chat-cli --server-url ws://chat.example:8000/ws bob
//! SOCKET_HUB_URL=ws://localhost:8000/ws chat-cli carol --log-level debug
//! ```
//!
//! Lines starting with `/` are commands (`/help` lists them); anything
//! else is sent to the current room.

use std::time::Duration;

use clap::Parser;
use sockethub::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
commands:
  /connect        connect to the chat server
  /join <room>    join a room (leaves the current one on the server side)
  /leave          leave the current room
  /disconnect     close the connection
  /quit           disconnect and exit
  anything else   send it to the current room";

/// Terminal chat client for Socket-Hub
#[derive(Parser, Debug)]
#[command(name = "chat-cli")]
#[command(about = "Chat in Socket-Hub rooms from the terminal")]
#[command(version)]
struct Args {
    /// User id to connect as
    user_id: String,

    /// Name shown to other users (defaults to the user id)
    display_name: Option<String>,

    /// Base WebSocket URL of the chat server
    #[arg(long, env = "SOCKET_HUB_URL", default_value = "ws://localhost:8000/ws")]
    server_url: String,

    /// Seconds to wait for the connection to open
    #[arg(long, default_value = "10")]
    connect_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

enum Command<'a> {
    Connect,
    Disconnect,
    Join(&'a str),
    Leave,
    Help,
    Quit,
    Say(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
        match head {
            "/connect" => Self::Connect,
            "/disconnect" => Self::Disconnect,
            "/join" => Self::Join(rest.trim()),
            "/leave" => Self::Leave,
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Say(line),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn render(entry: &TranscriptEntry) -> String {
    let at = entry.occurred_at.format("%H:%M:%S");
    match entry.origin {
        Origin::System => format!("{at} * {}", entry.text),
        Origin::Sent => format!("{at} > {}", entry.text),
        Origin::Received => format!("{at} < {}", entry.text),
    }
}

/// Prints each transcript entry once, as snapshots arrive.
async fn print_transcript(mut updates: watch::Receiver<SessionSnapshot>) {
    let mut last_seen: Option<EntryId> = None;
    loop {
        {
            let snapshot = updates.borrow_and_update();
            let fresh = snapshot.entries_since(last_seen);
            for entry in fresh {
                println!("{}", render(entry));
            }
            if let Some(entry) = fresh.last() {
                last_seen = Some(entry.id);
            }
        }
        if updates.changed().await.is_err() {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), SocketHubError> {
    let args = Args::parse();

    // Logs go to stderr so they don't interleave with the transcript.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let display_name = args.display_name.unwrap_or_else(|| args.user_id.clone());
    let session = ChatClientBuilder::new()
        .server_url(args.server_url)
        .connect_timeout(Duration::from_secs(args.connect_timeout))
        .spawn(Identity::new(args.user_id, display_name)?)?;
    let printer = tokio::spawn(print_transcript(session.subscribe()));

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let result = match Command::parse(line) {
            Command::Connect => session.connect().await,
            Command::Disconnect => session.disconnect().await,
            Command::Join(room) => session.join_room(room).await,
            Command::Leave => session.leave_room().await,
            Command::Say(text) => session.send_message(text).await,
            Command::Help => {
                println!("{HELP}");
                Ok(())
            }
            Command::Quit => break,
        };
        match result {
            // Refusals are already in the transcript.
            Err(SocketHubError::Session(e)) => tracing::debug!(error = %e, "command refused"),
            Err(e) => return Err(e),
            Ok(()) => {}
        }
    }

    session.shutdown().await?;
    let _ = printer.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_user_id_only_uses_defaults() {
        let args = Args::try_parse_from(["chat-cli", "alice"]).unwrap();
        assert_eq!(args.user_id, "alice");
        assert_eq!(args.display_name, None);
        assert_eq!(args.connect_timeout, 10);
        assert_eq!(args.log_level, "warn");
        if std::env::var_os("SOCKET_HUB_URL").is_none() {
            assert_eq!(args.server_url, "ws://localhost:8000/ws");
        }
    }

    #[test]
    fn test_args_flags_override_defaults() {
        let args = Args::try_parse_from([
            "chat-cli",
            "bob",
            "Bob B",
            "--server-url",
            "ws://chat.example:9000/ws",
            "--connect-timeout",
            "3",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.display_name.as_deref(), Some("Bob B"));
        assert_eq!(args.server_url, "ws://chat.example:9000/ws");
        assert_eq!(args.connect_timeout, 3);
        assert_eq!(args.log_level, "debug");
    }

    #[test]
    fn test_args_without_user_id_is_rejected() {
        assert!(Args::try_parse_from(["chat-cli"]).is_err());
    }

    #[test]
    fn test_command_parse() {
        assert!(matches!(Command::parse("/join lobby"), Command::Join("lobby")));
        assert!(matches!(Command::parse("/join"), Command::Join("")));
        assert!(matches!(Command::parse("/quit"), Command::Quit));
        assert!(matches!(Command::parse("/connect"), Command::Connect));
        assert!(matches!(Command::parse("hello there"), Command::Say("hello there")));
    }
}
