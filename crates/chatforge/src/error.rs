//! Unified error type for the Chatforge server.

/// Top-level error for building and running a server.
///
/// Deliberately small: almost everything that goes wrong at runtime is
/// session-local policy, not an error — bad credentials are answered on
/// the wire, a dead connection just ends its own session, and store I/O
/// failures are reported to the requesting client and logged. What
/// remains is the transport itself.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Binding the listener failed at startup.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    /// A connection's transport failed before an identity was bound.
    /// After binding, transport failures are handled as a disconnect
    /// and never surface here.
    #[error("transport failed: {0}")]
    Transport(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_mentions_cause() {
        let io = std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "port taken",
        );
        let err = ChatError::Bind(io);
        assert!(err.to_string().contains("bind failed"));
    }

    #[test]
    fn test_transport_error_mentions_cause() {
        let io = std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "gone",
        );
        let err = ChatError::Transport(io);
        assert!(err.to_string().contains("transport failed"));
    }
}
