//! The credential store: uniqueness-checked insert and verified lookup
//! over one append-only file.
//!
//! # Concurrency note
//!
//! Every operation takes the store-wide async mutex for its whole
//! duration, reads included. That is deliberate: a flat file has no
//! atomic read-modify-write, so registration must hold the lock from the
//! uniqueness scan through the append, and letting authentication read
//! concurrently would buy little at the target scale (dozens of users)
//! while complicating the reasoning. The store is the known bottleneck
//! of the system.
//!
//! # Digest parameters
//!
//! These are stable across restarts — records are long-lived:
//!
//! - salt: 16 cryptographically random bytes, stored lowercase hex
//! - hash: `hex(sha256(password_bytes ++ salt_hex_bytes))`, lowercase
//!
//! The salt is fed to the digest in its hex form, exactly as stored, so
//! verification never has to decode it.

use std::path::{Path, PathBuf};

use chatforge_protocol::UserId;
use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::{CredentialRecord, StoreError};

/// Salt length in raw bytes (32 hex characters on disk).
pub const SALT_LEN: usize = 16;

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A fresh record was appended.
    Created,
    /// The identity already has a record; nothing was written.
    IdExists,
}

/// Outcome of an authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The recomputed digest matched the stored one.
    Accepted,
    /// No record exists for the identity.
    UnknownId,
    /// A record exists but the digest did not match.
    WrongPassword,
}

/// Durable mapping from identity to salted password hash plus profile
/// fields, backed by one append-only file.
///
/// The store owns exclusive access to the file: all callers go through
/// [`register`](Self::register) and [`authenticate`](Self::authenticate),
/// which serialize on a single internal lock. Lookup is a linear scan in
/// append order — fine for the expected record counts, and it keeps the
/// file a plain text artifact an operator can inspect.
pub struct CredentialStore {
    path: PathBuf,
    /// Guards the whole file for the duration of each operation. The
    /// guarded data is the file itself, hence `Mutex<()>`.
    lock: Mutex<()>,
}

impl CredentialStore {
    /// Creates a store backed by the file at `path`.
    ///
    /// The file does not need to exist yet — a missing file reads as an
    /// empty store, and the first registration creates it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registers a new identity.
    ///
    /// Scans the file for the identity under the store lock; if absent,
    /// generates a fresh salt, digests the password, and durably appends
    /// the record. The lock spans the scan *and* the append so a
    /// concurrent registration can never interleave with the uniqueness
    /// check.
    ///
    /// # Errors
    /// Returns [`StoreError`] if the file cannot be read or appended.
    /// The caller reports this to the requesting client as a generic
    /// failure; no record is written.
    pub async fn register(
        &self,
        user_id: &UserId,
        password: &str,
        display_name: &str,
        email: &str,
    ) -> Result<RegisterOutcome, StoreError> {
        let _guard = self.lock.lock().await;

        let contents = self.read_contents().await?;
        // Uniqueness only needs the first field, so even lines that are
        // too torn to parse as full records still reserve their identity.
        let taken = contents
            .lines()
            .any(|line| line.split(',').next() == Some(user_id.as_str()));
        if taken {
            return Ok(RegisterOutcome::IdExists);
        }

        let salt = generate_salt();
        let record = CredentialRecord {
            user_id: user_id.clone(),
            password_hash: hash_password(password, &salt),
            salt,
            display_name: display_name.to_string(),
            email: email.to_string(),
        };

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await
            .map_err(StoreError::Append)?;
        file.write_all(format!("{}\n", record.to_line()).as_bytes())
            .await
            .map_err(StoreError::Append)?;
        file.flush().await.map_err(StoreError::Append)?;

        tracing::info!(%user_id, "credential record created");
        Ok(RegisterOutcome::Created)
    }

    /// Verifies a password against the stored record for `user_id`.
    ///
    /// Recomputes the digest with the record's own salt and requires
    /// exact hex equality.
    ///
    /// # Errors
    /// Returns [`StoreError`] only for file-level failures. "No such
    /// identity" and "wrong password" are ordinary outcomes, not errors.
    pub async fn authenticate(
        &self,
        user_id: &UserId,
        password: &str,
    ) -> Result<AuthOutcome, StoreError> {
        let _guard = self.lock.lock().await;

        let contents = self.read_contents().await?;
        for line in contents.lines() {
            let Some(record) = CredentialRecord::parse_line(line) else {
                continue;
            };
            if record.user_id == *user_id {
                return Ok(
                    if hash_password(password, &record.salt)
                        == record.password_hash
                    {
                        AuthOutcome::Accepted
                    } else {
                        AuthOutcome::WrongPassword
                    },
                );
            }
        }
        Ok(AuthOutcome::UnknownId)
    }

    /// Reads the whole credential file. A missing file is an empty store.
    async fn read_contents(&self) -> Result<String, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(String::new())
            }
            Err(e) => Err(StoreError::Read(e)),
        }
    }
}

/// Generates a fresh random salt as a 32-character lowercase hex string.
fn generate_salt() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; SALT_LEN] = rng.random();
    hex::encode(bytes)
}

/// Digests `password ++ salt` with SHA-256 and hex-encodes the result.
///
/// The salt goes in as its hex string, byte for byte as stored on disk.
fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

// =========================================================================
// Tests
// =========================================================================
