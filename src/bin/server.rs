//! Group chat server
//!
//! Usage: chat-server <v4|v6> <port>
//!
//! Set RUST_LOG to adjust logging, e.g. `RUST_LOG=groupchat=debug`.

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use groupchat::server::AddressFamily;
use groupchat::{ChatServer, ServerConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Family {
    V4,
    V6,
}

impl From<Family> for AddressFamily {
    fn from(family: Family) -> Self {
        match family {
            Family::V4 => AddressFamily::V4,
            Family::V6 => AddressFamily::V6,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "chat-server", about = "Group chat server")]
struct Args {
    /// Protocol family to listen on
    #[arg(value_enum)]
    family: Family,

    /// TCP port to listen on
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let bind_addr = AddressFamily::from(args.family).any(args.port);
    let server = ChatServer::new(ServerConfig::with_addr(bind_addr));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    match server.run_until(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
