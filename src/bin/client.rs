//! Group chat client
//!
//! Usage: chat-client <host> <port>
//!
//! Commands: `list users`, `send all "<text>"`, `send to <id> "<text>"`,
//! `close connection`.

use std::process::ExitCode;

use clap::Parser;
use groupchat::{ChatClient, ClientConfig, Error};
use tokio::io::BufReader;

#[derive(Debug, Parser)]
#[command(name = "chat-client", about = "Group chat client")]
struct Args {
    /// Server address (IP literal or host name)
    host: String,

    /// Server port
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so they don't interleave with chat output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = ClientConfig::new(args.host, args.port);

    let client = match ChatClient::connect(&config).await {
        Ok(client) => client,
        Err(Error::Rejected(code)) => {
            println!("{}", code.reason());
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Failed to join {}: {}", config.server_addr(), e);
            return ExitCode::FAILURE;
        }
    };

    let input = BufReader::new(tokio::io::stdin());
    match client.run(input, tokio::io::stdout()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Connection lost: {}", e);
            ExitCode::FAILURE
        }
    }
}
