//! The on-disk credential record and its line format.

use chatforge_protocol::UserId;

/// One persisted credential: an identity, its salted password digest, and
/// the profile fields captured at registration.
///
/// A record is immutable once written. There is no update or delete — the
/// file only ever grows, and the first record for an identity is the one
/// that counts (uniqueness is enforced before append, so there is never a
/// second).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// The unique identity this record belongs to. Case-sensitive.
    pub user_id: UserId,
    /// Lowercase hex SHA-256 of `password ++ salt` (64 chars).
    pub password_hash: String,
    /// Lowercase hex encoding of the 16 random salt bytes (32 chars).
    pub salt: String,
    /// Display name captured at registration. Not used for auth.
    pub display_name: String,
    /// Email captured at registration. Not used for auth.
    pub email: String,
}

impl CredentialRecord {
    /// Parses one line of the credential file.
    ///
    /// The format is five comma-separated fields in fixed order:
    /// `userID,passwordHash,salt,displayName,email`. Lines that don't
    /// have all five fields return `None` and are skipped by scans —
    /// a torn final line from a crashed append must not poison every
    /// lookup after it.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.splitn(5, ',');
        Some(Self {
            user_id: UserId::new(fields.next()?),
            password_hash: fields.next()?.to_string(),
            salt: fields.next()?.to_string(),
            display_name: fields.next()?.to_string(),
            email: fields.next()?.to_string(),
        })
    }

    /// Formats the record as one credential-file line, without the
    /// trailing newline.
    pub fn to_line(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.user_id,
            self.password_hash,
            self.salt,
            self.display_name,
            self.email
        )
    }
}
