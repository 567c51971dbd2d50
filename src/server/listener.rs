//! Chat server listener
//!
//! Handles TCP accept loop and spawns connection handlers.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

use crate::error::Result;
use crate::registry::{RegistryConfig, SessionRegistry};
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;

/// Group chat server
pub struct ChatServer {
    config: ServerConfig,
    registry: Arc<SessionRegistry>,
}

impl ChatServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registry_config(config, RegistryConfig::default())
    }

    /// Create a new server with custom registry configuration
    pub fn with_registry_config(config: ServerConfig, registry_config: RegistryConfig) -> Self {
        Self {
            config,
            registry: Arc::new(SessionRegistry::with_config(registry_config)),
        }
    }

    /// Get a reference to the session registry
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method runs until the listener fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    ///
    /// On shutdown every admitted session is asked to close, and all
    /// connection tasks are finished (or, past the grace period, aborted)
    /// before this returns.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            addr = %listener.local_addr()?,
            capacity = self.registry.capacity(),
            "Chat server listening"
        );

        let mut connections = JoinSet::new();

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
            }
            _ = self.accept_loop(&listener, &mut connections) => {}
        }

        drop(listener);
        self.drain(connections).await;
        Ok(())
    }

    async fn accept_loop(&self, listener: &TcpListener, connections: &mut JoinSet<()>) {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    // Reap finished connection tasks
                    while connections.try_join_next().is_some() {}
                    self.handle_connection(socket, peer_addr, connections);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(
        &self,
        socket: TcpStream,
        peer_addr: SocketAddr,
        connections: &mut JoinSet<()>,
    ) {
        tracing::debug!(peer = %peer_addr, "New connection");

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::error!(error = %e, "Failed to configure socket");
                return;
            }
        }

        let config = self.config.clone();
        let registry = Arc::clone(&self.registry);

        connections.spawn(async move {
            let connection = Connection::new(socket, peer_addr.to_string(), registry, config);

            if let Err(e) = connection.run().await {
                tracing::debug!(peer = %peer_addr, error = %e, "Connection error");
            }

            tracing::debug!(peer = %peer_addr, "Connection closed");
        });
    }

    /// Close every session and wait for the connection tasks
    async fn drain(&self, mut connections: JoinSet<()>) {
        let signalled = self.registry.close_all().await;
        tracing::info!(
            sessions = signalled,
            connections = connections.len(),
            "Closing connections"
        );

        let graceful = tokio::time::timeout(self.config.shutdown_grace, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        if graceful.is_err() {
            tracing::warn!(
                remaining = connections.len(),
                "Grace period elapsed, aborting connections"
            );
            connections.shutdown().await;
        }
    }
}
