//! Credential persistence for Chatforge.
//!
//! This crate owns the durable side of authentication:
//!
//! 1. **Records** ([`CredentialRecord`]) — one identity's salted password
//!    hash plus profile fields, persisted as a comma-separated line.
//! 2. **The store** ([`CredentialStore`]) — uniqueness-checked insert
//!    ([`CredentialStore::register`]) and verified lookup
//!    ([`CredentialStore::authenticate`]) over an append-only file.
//! 3. **Errors** ([`StoreError`]) — what can go wrong at the file level.
//!
//! # How it fits in the stack
//!
//! ```text
//! Handler (above)  ← calls register/authenticate during the credential phase
//!     ↕
//! Store layer (this crate)  ← owns the file, the digest, and the lock
//!     ↕
//! Protocol layer (below)  ← provides the UserId type
//! ```
//!
//! The store never learns about sessions or the registry: a credential
//! record outlives any connection, and nothing in here mutates or deletes
//! a record once written.

mod error;
mod record;
mod store;

pub use error::StoreError;
pub use record::CredentialRecord;
pub use store::{AuthOutcome, CredentialStore, RegisterOutcome, SALT_LEN};
