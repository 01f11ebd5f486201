//! Client → server command parsing.
//!
//! The protocol has two phases, and each phase accepts a different set of
//! lines, so there are two parsers:
//!
//! - [`AuthCommand::parse`] — the credential phase. Only well-formed
//!   `LOGIN` and `REGISTER` lines parse; everything else returns `None`
//!   and the caller re-prompts.
//! - [`ChatCommand::parse`] — the active phase. Every line means
//!   *something* here (worst case: broadcast it verbatim), so this parser
//!   is total and returns a variant for every input.
//!
//! Fields are split on single spaces, exactly as typed. That means
//! display names, emails, and whisper targets cannot contain spaces —
//! a documented limit of the line format, not a bug to fix with quoting.

use crate::types::UserId;

// ---------------------------------------------------------------------------
// AuthCommand
// ---------------------------------------------------------------------------

/// A command accepted while a session is awaiting credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCommand {
    /// `LOGIN <id> <password>` — authenticate an existing identity.
    Login { user_id: UserId, password: String },

    /// `REGISTER <id> <password> <displayName> <email>` — create a new
    /// credential record. Registration does not log the user in.
    Register {
        user_id: UserId,
        password: String,
        display_name: String,
        email: String,
    },
}

impl AuthCommand {
    /// Parses one credential-phase line.
    ///
    /// Returns `None` for anything that isn't an exact-arity `LOGIN` or
    /// `REGISTER` — malformed input is ignored, not answered, and the
    /// prompt repeats.
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split(' ').collect();
        match parts.as_slice() {
            ["LOGIN", id, password] => Some(Self::Login {
                user_id: UserId::new(*id),
                password: (*password).to_string(),
            }),
            ["REGISTER", id, password, display_name, email] => {
                Some(Self::Register {
                    user_id: UserId::new(*id),
                    password: (*password).to_string(),
                    display_name: (*display_name).to_string(),
                    email: (*email).to_string(),
                })
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ChatCommand
// ---------------------------------------------------------------------------

/// A line received from an active (authenticated) session.
///
/// This classification is total: every possible line maps to exactly one
/// variant, so the message loop is a single `match` with no fallthrough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// `/quit` (case-insensitive prefix) — disconnect gracefully.
    Quit,

    /// `/whisper <target> <message...>` — route to one identity.
    Whisper { target: UserId, message: String },

    /// A `/whisper` line missing its target or body. Answered with a
    /// local usage notice; never broadcast.
    MalformedWhisper,

    /// Any other nonempty line — broadcast verbatim, prefixed with the
    /// sender's identity.
    Say(String),

    /// An empty line. Dropped silently.
    Empty,
}

impl ChatCommand {
    /// Classifies one active-phase line.
    pub fn parse(line: &str) -> Self {
        if line.is_empty() {
            return Self::Empty;
        }
        // Case-insensitive prefix match: "/quit", "/QUIT now", etc.
        // `get` instead of indexing: byte 5 may not be a char boundary.
        if line.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("/quit")) {
            return Self::Quit;
        }
        if line == "/whisper" || line.starts_with("/whisper ") {
            // Limit-3 split: the message body keeps its internal spaces.
            let mut parts = line.splitn(3, ' ');
            let _command = parts.next();
            return match (parts.next(), parts.next()) {
                (Some(target), Some(message)) if !target.is_empty() => {
                    Self::Whisper {
                        target: UserId::new(target),
                        message: message.to_string(),
                    }
                }
                _ => Self::MalformedWhisper,
            };
        }
        Self::Say(line.to_string())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s)
    }

    // =====================================================================
    // AuthCommand::parse
    // =====================================================================

    #[test]
    fn test_parse_login_two_fields_succeeds() {
        let cmd = AuthCommand::parse("LOGIN alice pw1");
        assert_eq!(
            cmd,
            Some(AuthCommand::Login {
                user_id: uid("alice"),
                password: "pw1".into(),
            })
        );
    }

    #[test]
    fn test_parse_login_wrong_arity_is_ignored() {
        // One field too few, one too many — both malformed.
        assert_eq!(AuthCommand::parse("LOGIN alice"), None);
        assert_eq!(AuthCommand::parse("LOGIN alice pw1 extra"), None);
    }

    #[test]
    fn test_parse_register_four_fields_succeeds() {
        let cmd = AuthCommand::parse("REGISTER alice pw1 Alice a@x.com");
        assert_eq!(
            cmd,
            Some(AuthCommand::Register {
                user_id: uid("alice"),
                password: "pw1".into(),
                display_name: "Alice".into(),
                email: "a@x.com".into(),
            })
        );
    }

    #[test]
    fn test_parse_register_wrong_arity_is_ignored() {
        assert_eq!(AuthCommand::parse("REGISTER alice pw1 Alice"), None);
        assert_eq!(
            AuthCommand::parse("REGISTER alice pw1 Alice a@x.com extra"),
            None
        );
    }

    #[test]
    fn test_parse_auth_keyword_is_case_sensitive() {
        // Unlike /quit, the auth keywords are exact matches.
        assert_eq!(AuthCommand::parse("login alice pw1"), None);
        assert_eq!(AuthCommand::parse("register a b c d"), None);
    }

    #[test]
    fn test_parse_auth_garbage_is_ignored() {
        assert_eq!(AuthCommand::parse(""), None);
        assert_eq!(AuthCommand::parse("hello there"), None);
        assert_eq!(AuthCommand::parse("/quit"), None);
    }

    // =====================================================================
    // ChatCommand::parse
    // =====================================================================

    #[test]
    fn test_parse_quit_is_case_insensitive_prefix() {
        assert_eq!(ChatCommand::parse("/quit"), ChatCommand::Quit);
        assert_eq!(ChatCommand::parse("/QUIT"), ChatCommand::Quit);
        assert_eq!(ChatCommand::parse("/Quit now"), ChatCommand::Quit);
    }

    #[test]
    fn test_parse_whisper_with_target_and_body() {
        assert_eq!(
            ChatCommand::parse("/whisper bob hello there"),
            ChatCommand::Whisper {
                target: uid("bob"),
                message: "hello there".into(),
            }
        );
    }

    #[test]
    fn test_parse_whisper_body_keeps_internal_spaces() {
        let cmd = ChatCommand::parse("/whisper bob a  b   c");
        assert_eq!(
            cmd,
            ChatCommand::Whisper {
                target: uid("bob"),
                message: "a  b   c".into(),
            }
        );
    }

    #[test]
    fn test_parse_whisper_missing_body_is_malformed() {
        assert_eq!(
            ChatCommand::parse("/whisper bob"),
            ChatCommand::MalformedWhisper
        );
    }

    #[test]
    fn test_parse_whisper_missing_target_is_malformed() {
        assert_eq!(
            ChatCommand::parse("/whisper"),
            ChatCommand::MalformedWhisper
        );
        assert_eq!(
            ChatCommand::parse("/whisper  trailing"),
            ChatCommand::MalformedWhisper
        );
    }

    #[test]
    fn test_parse_plain_text_is_say() {
        assert_eq!(
            ChatCommand::parse("hello everyone"),
            ChatCommand::Say("hello everyone".into())
        );
    }

    #[test]
    fn test_parse_unknown_slash_command_is_say() {
        // Only /quit and /whisper are commands; anything else is chat.
        assert_eq!(
            ChatCommand::parse("/dance"),
            ChatCommand::Say("/dance".into())
        );
    }

    #[test]
    fn test_parse_empty_line_is_dropped() {
        assert_eq!(ChatCommand::parse(""), ChatCommand::Empty);
    }
}
