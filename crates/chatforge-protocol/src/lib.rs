//! Wire protocol for Chatforge.
//!
//! This crate defines the "language" that clients and servers speak:
//!
//! - **Types** ([`UserId`]) — the identity that travels on the wire and
//!   keys every server-side table.
//! - **Client commands** ([`AuthCommand`], [`ChatCommand`]) — how raw
//!   inbound lines are classified during each protocol phase.
//! - **Server lines** ([`ServerLine`]) — every line the server may write,
//!   with its exact wire text produced by `Display`.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw lines) and the session
//! handler (identity and registry context). It doesn't know about
//! connections, the registry, or the credential store — it only knows how
//! to turn text lines into commands and commands into text lines.
//!
//! ```text
//! Transport (lines) → Protocol (commands) → Handler (session context)
//! ```
//!
//! The wire format is newline-delimited UTF-8 text, one logical message
//! per line. There is deliberately no serialization framework here: every
//! message is a short, space-delimited line, and the whole format fits in
//! [`ServerLine`]'s `Display` impl and two parse functions.

mod command;
mod types;

pub use command::{AuthCommand, ChatCommand};
pub use types::{LoginFailReason, RegisterFailReason, ServerLine, UserId};
