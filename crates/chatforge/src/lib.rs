//! # Chatforge
//!
//! A line-protocol chat server engine: concurrent client sessions, a
//! multi-step authentication protocol over a durable salted-hash
//! credential store, and broadcast/whisper message routing through a
//! shared registry of active identities.
//!
//! This meta-crate ties the layers together — transport (newline-
//! delimited TCP), protocol (`chatforge-protocol`), credentials
//! (`chatforge-store`), and presence (`chatforge-registry`) — behind a
//! single server type.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use chatforge::ChatServer;
//!
//! # async fn run() -> Result<(), chatforge::ChatError> {
//! let server = ChatServer::builder()
//!     .bind("0.0.0.0:59001")
//!     .store_path("users.dat")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::ChatError;
pub use server::{ChatServer, ChatServerBuilder, ServerConfig};

// Re-export the sub-crate vocabulary so embedders (and the integration
// tests) can speak the protocol without naming every layer crate.
pub use chatforge_protocol::{
    AuthCommand, ChatCommand, LoginFailReason, RegisterFailReason,
    ServerLine, UserId,
};
pub use chatforge_registry::{InsertOutcome, OutboundSink, Registry};
pub use chatforge_store::{
    AuthOutcome, CredentialStore, RegisterOutcome, StoreError,
};
