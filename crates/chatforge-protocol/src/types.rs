//! Core protocol types: identities and the server's line vocabulary.
//!
//! Everything the server ever writes to a client is a [`ServerLine`], and
//! its `Display` impl is the single source of truth for the wire text.
//! Keeping the formatting in one place means the handler and the registry
//! can't drift apart on what a notice or a whisper looks like.

use std::fmt;

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// The unique identifier a client authenticates as.
///
/// This is a newtype wrapper around `String` — the same pattern as a
/// numeric ID newtype, but for a user-chosen name. Wrapping it buys us:
///
/// 1. **Type safety**: a password or a message body can't be passed where
///    an identity is expected, even though all three are strings.
/// 2. **One place for identity semantics**: comparison is case-sensitive
///    byte equality, and `Ord` gives the deterministic ordering used by
///    the user-list snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Failure reasons
// ---------------------------------------------------------------------------

/// Why a `LOGIN` attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailReason {
    /// The identity already has an active session.
    AlreadyLoggedIn,
    /// Unknown identity or wrong password. The two cases are deliberately
    /// indistinguishable on the wire so a client can't probe which IDs
    /// exist.
    WrongIdPw,
    /// The credential store failed (I/O). Generic on the wire; the real
    /// cause stays in the server log.
    Error,
}

/// Why a `REGISTER` attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterFailReason {
    /// The requested identity is already taken.
    IdExists,
    /// The credential store failed (I/O).
    Error,
}

// ---------------------------------------------------------------------------
// ServerLine
// ---------------------------------------------------------------------------

/// A single server → client protocol line.
///
/// `Display` produces the exact wire text, without the trailing newline —
/// the transport writer appends that. The variants mirror the protocol
/// table:
///
/// ```text
/// SUBMITNAME                      prompt for a login/register command
/// NAMEACCEPTED <id>               authentication complete, now active
/// LOGIN_SUCCESS <id>              login accepted
/// LOGIN_FAIL <reason>             ALREADY_LOGGED_IN | WRONG_ID_PW | ERROR
/// REGISTER_SUCCESS                registration accepted
/// REGISTER_FAIL <reason>          ID_EXISTS | ERROR
/// /userlist <id1>,<id2>,...,      full snapshot, trailing comma
/// MESSAGE <text>                  chat or system line, rendered verbatim
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    /// Prompt the client for a `LOGIN` or `REGISTER` command.
    SubmitName,
    /// Authentication is complete; the session is active.
    NameAccepted(UserId),
    /// A login attempt succeeded.
    LoginSuccess(UserId),
    /// A login attempt failed.
    LoginFail(LoginFailReason),
    /// A registration succeeded.
    RegisterSuccess,
    /// A registration failed.
    RegisterFail(RegisterFailReason),
    /// The full list of currently active identities.
    UserList(Vec<UserId>),
    /// A chat or system line the client renders verbatim.
    Message(String),
}

impl ServerLine {
    /// An ordinary chat line, prefixed with the sender's identity.
    pub fn chat(sender: &UserId, text: &str) -> Self {
        Self::Message(format!("{sender}: {text}"))
    }

    /// The join announcement broadcast when a session becomes active.
    pub fn join_notice(id: &UserId) -> Self {
        Self::Message(format!("[notice] {id} joined the chat."))
    }

    /// The departure announcement broadcast when a session terminates.
    pub fn leave_notice(id: &UserId) -> Self {
        Self::Message(format!("[notice] {id} left the chat."))
    }

    /// The line a whisper target sees.
    pub fn whisper_from(sender: &UserId, text: &str) -> Self {
        Self::Message(format!("(from {sender}): {text}"))
    }

    /// The confirmation echo the whisper sender sees.
    pub fn whisper_to(target: &UserId, text: &str) -> Self {
        Self::Message(format!("(to {target}): {text}"))
    }

    /// The notice sent when a whisper target is not connected.
    pub fn unknown_target(target: &UserId) -> Self {
        Self::Message(format!("[system] '{target}' is not connected."))
    }

    /// The notice sent back for a malformed whisper command.
    pub fn whisper_usage() -> Self {
        Self::Message("[system] usage: /whisper <target> <message>".into())
    }
}

impl fmt::Display for ServerLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubmitName => f.write_str("SUBMITNAME"),
            Self::NameAccepted(id) => write!(f, "NAMEACCEPTED {id}"),
            Self::LoginSuccess(id) => write!(f, "LOGIN_SUCCESS {id}"),
            Self::LoginFail(reason) => {
                let reason = match reason {
                    LoginFailReason::AlreadyLoggedIn => "ALREADY_LOGGED_IN",
                    LoginFailReason::WrongIdPw => "WRONG_ID_PW",
                    LoginFailReason::Error => "ERROR",
                };
                write!(f, "LOGIN_FAIL {reason}")
            }
            Self::RegisterSuccess => f.write_str("REGISTER_SUCCESS"),
            Self::RegisterFail(reason) => {
                let reason = match reason {
                    RegisterFailReason::IdExists => "ID_EXISTS",
                    RegisterFailReason::Error => "ERROR",
                };
                write!(f, "REGISTER_FAIL {reason}")
            }
            Self::UserList(ids) => {
                // Every identity is followed by a comma, including the
                // last one — selection-based clients split on ',' and
                // drop the empty tail.
                f.write_str("/userlist ")?;
                for id in ids {
                    write!(f, "{id},")?;
                }
                Ok(())
            }
            Self::Message(text) => write!(f, "MESSAGE {text}"),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
