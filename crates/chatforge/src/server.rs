//! `ChatServer` builder and accept loop.
//!
//! This is the entry point for running a Chatforge server. It ties the
//! layers together: transport (TCP lines) → protocol → store → registry.

use std::path::PathBuf;
use std::sync::Arc;

use chatforge_registry::Registry;
use chatforge_store::CredentialStore;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::handler::handle_connection;
use crate::ChatError;

/// Configuration for the connection acceptor.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum number of concurrently running session handlers.
    ///
    /// This is a soft ceiling, not admission control: connections beyond
    /// the limit are accepted and queue for a worker slot, waiting
    /// indefinitely rather than being refused.
    ///
    /// Default: 500.
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { max_sessions: 500 }
    }
}

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry and the store each carry their own internal lock; nothing
/// here needs an outer one.
pub(crate) struct ServerState {
    pub(crate) registry: Registry,
    pub(crate) store: CredentialStore,
}

/// Builder for configuring and starting a Chatforge server.
///
/// # Example
///
/// ```rust,no_run
/// use chatforge::ChatServer;
///
/// # async fn run() -> Result<(), chatforge::ChatError> {
/// let server = ChatServer::builder()
///     .bind("0.0.0.0:59001")
///     .store_path("users.dat")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ChatServerBuilder {
    bind_addr: String,
    store_path: PathBuf,
    config: ServerConfig,
}

impl ChatServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:59001".to_string(),
            store_path: PathBuf::from("users.dat"),
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the credential file path.
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// Sets the maximum number of concurrent session handlers.
    pub fn max_sessions(mut self, max: usize) -> Self {
        self.config.max_sessions = max;
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<ChatServer, ChatError> {
        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .map_err(ChatError::Bind)?;
        tracing::info!(addr = %self.bind_addr, "chat server listening");

        let state = Arc::new(ServerState {
            registry: Registry::new(),
            store: CredentialStore::new(self.store_path),
        });

        Ok(ChatServer {
            listener,
            state,
            workers: Arc::new(Semaphore::new(self.config.max_sessions)),
        })
    }
}

impl Default for ChatServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Chatforge server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ChatServer {
    listener: TcpListener,
    state: Arc<ServerState>,
    /// The fixed-size worker pool. Each handler task holds one permit
    /// for its whole lifetime; tasks past capacity queue on `acquire`.
    workers: Arc<Semaphore>,
}

impl ChatServer {
    /// Creates a new builder.
    pub fn builder() -> ChatServerBuilder {
        ChatServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop.
    ///
    /// Accepts incoming connections and spawns one handler task per
    /// connection; each task first waits for a worker permit, runs its
    /// session to termination, then releases the permit. Runs until the
    /// process is terminated.
    pub async fn run(self) -> Result<(), ChatError> {
        tracing::info!("chat server running");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&self.state);
                    let workers = Arc::clone(&self.workers);
                    tokio::spawn(async move {
                        // The semaphore is never closed, so this only
                        // fails if the server is torn down mid-wait.
                        let Ok(_permit) = workers.acquire_owned().await
                        else {
                            return;
                        };
                        tracing::debug!(%addr, "session handler started");
                        if let Err(e) =
                            handle_connection(stream, state).await
                        {
                            tracing::debug!(
                                %addr,
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
