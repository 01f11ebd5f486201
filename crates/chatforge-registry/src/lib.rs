//! The session registry: who is online, and how to reach them.
//!
//! This crate owns the process-wide table of currently authenticated
//! sessions. It is the single source of truth for three questions:
//!
//! 1. **Presence** — is this identity online right now?
//!    ([`Registry::contains`], and atomically, [`Registry::try_insert`])
//! 2. **Broadcast** — deliver one line to every active session
//!    ([`Registry::broadcast`], [`Registry::broadcast_user_list`])
//! 3. **Whisper** — deliver to exactly one target, echo to the sender
//!    ([`Registry::whisper`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Handler (above)  ← registers after auth, routes chat lines here
//!     ↕
//! Registry (this crate)  ← owns the identity → sink map
//!     ↕
//! Protocol layer (below)  ← provides UserId and the line formats
//! ```

mod registry;

pub use registry::{InsertOutcome, OutboundSink, Registry};
