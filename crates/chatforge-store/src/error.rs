//! Error types for the credential store.

/// Errors that can occur while reading or appending the credential file.
///
/// Both variants are I/O failures; they are split so the log line says
/// which half of an operation died. Callers report either one to the
/// requesting client as a generic failure — the underlying cause never
/// crosses the wire.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading the credential file failed.
    #[error("credential file read failed: {0}")]
    Read(#[source] std::io::Error),

    /// Appending a new record to the credential file failed.
    #[error("credential file append failed: {0}")]
    Append(#[source] std::io::Error),
}
