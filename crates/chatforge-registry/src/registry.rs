//! The registry itself: one coarse lock around the identity → sink map.
//!
//! # Concurrency note
//!
//! Every operation — insert, remove, lookup, and full-map iteration for
//! broadcast — takes the same `tokio::sync::Mutex`. This is intentional:
//! the expected entry count is small (dozens), so per-entry locking would
//! add complexity without moving the bottleneck, which is the credential
//! store's file lock, not this map.
//!
//! Sinks are unbounded `mpsc` senders drained by each session's writer
//! task, so a send never blocks and never performs I/O. That is what
//! makes it safe to write to every sink while holding the lock: the lock
//! guards pure memory operations, and slow or dead clients can't stall a
//! broadcast for anyone else.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chatforge_protocol::{ServerLine, UserId};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;

/// The per-session destination for outbound protocol lines.
///
/// One line per send, no trailing newline — the session's writer task
/// appends the newline when it drains the channel onto the socket. A send
/// fails only when the receiving session is gone, and every caller in
/// this module treats that as "they missed the message", never as an
/// error to surface.
pub type OutboundSink = UnboundedSender<String>;

/// Outcome of an atomic registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The identity was free and is now registered.
    Inserted,
    /// Another session already holds this identity; the map is unchanged.
    AlreadyPresent,
}

/// Process-wide table of active identities and their outbound sinks.
///
/// Created once at startup and shared by every connection handler; there
/// is no teardown — process exit reclaims it. All access goes through
/// these methods; the underlying map is never exposed.
#[derive(Default)]
pub struct Registry {
    inner: Mutex<HashMap<UserId, OutboundSink>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically registers `identity` if it is not already present.
    ///
    /// This check-and-set is the single point of truth for the "at most
    /// one session per identity" invariant. Two near-simultaneous logins
    /// for the same identity can both pass the advisory
    /// [`contains`](Self::contains) check, but only one can win here.
    pub async fn try_insert(
        &self,
        identity: UserId,
        sink: OutboundSink,
    ) -> InsertOutcome {
        let mut map = self.inner.lock().await;
        match map.entry(identity) {
            Entry::Occupied(_) => InsertOutcome::AlreadyPresent,
            Entry::Vacant(slot) => {
                tracing::info!(identity = %slot.key(), "session registered");
                slot.insert(sink);
                InsertOutcome::Inserted
            }
        }
    }

    /// Returns whether `identity` currently has an active session.
    ///
    /// Advisory only — the answer can be stale by the time the caller
    /// acts on it. Use [`try_insert`](Self::try_insert) when the answer
    /// has to hold.
    pub async fn contains(&self, identity: &UserId) -> bool {
        self.inner.lock().await.contains_key(identity)
    }

    /// Removes `identity` from the registry. No-op if absent.
    pub async fn remove(&self, identity: &UserId) {
        if self.inner.lock().await.remove(identity).is_some() {
            tracing::info!(%identity, "session deregistered");
        }
    }

    /// Writes `line` to every registered sink. Best-effort: a dead sink
    /// is skipped and never affects delivery to the others.
    pub async fn broadcast(&self, line: ServerLine) {
        let map = self.inner.lock().await;
        let text = line.to_string();
        for sink in map.values() {
            let _ = sink.send(text.clone());
        }
    }

    /// Broadcasts the full `/userlist` snapshot to every session.
    ///
    /// Snapshot and delivery happen under one lock acquisition so the
    /// list every client receives is exactly the set of sinks it was
    /// delivered to.
    pub async fn broadcast_user_list(&self) {
        let map = self.inner.lock().await;
        let mut ids: Vec<UserId> = map.keys().cloned().collect();
        ids.sort();
        let text = ServerLine::UserList(ids).to_string();
        for sink in map.values() {
            let _ = sink.send(text.clone());
        }
    }

    /// Routes a whisper from `sender` to `target`.
    ///
    /// If the target is online it receives a `(from sender)` line and the
    /// sender receives a `(to target)` echo; if not, the sender alone
    /// receives a system notice. Both writes happen under the map lock so
    /// the target cannot be removed between lookup and delivery.
    ///
    /// The sender's sink is passed in rather than looked up: the sender
    /// is always the calling session, which owns its sink, and the notice
    /// path must work even in the odd moment where the sender itself has
    /// already been deregistered.
    pub async fn whisper(
        &self,
        sender: &UserId,
        sender_sink: &OutboundSink,
        target: &UserId,
        message: &str,
    ) {
        let map = self.inner.lock().await;
        match map.get(target) {
            Some(target_sink) => {
                let _ = target_sink
                    .send(ServerLine::whisper_from(sender, message).to_string());
                let _ = sender_sink
                    .send(ServerLine::whisper_to(target, message).to_string());
            }
            None => {
                let _ = sender_sink
                    .send(ServerLine::unknown_target(target).to_string());
            }
        }
    }

    /// Returns the currently active identities in sorted order.
    pub async fn snapshot(&self) -> Vec<UserId> {
        let map = self.inner.lock().await;
        let mut ids: Vec<UserId> = map.keys().cloned().collect();
        ids.sort();
        ids
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Registry tests drive the real map through real mpsc channels —
    //! the receiving half of each channel plays the session's writer
    //! task, so "what did this client see" is just `try_recv`.

    use super::*;
    use tokio::sync::mpsc;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn uid(s: &str) -> UserId {
        UserId::new(s)
    }

    fn sink() -> (OutboundSink, UnboundedReceiver<String>) {
        mpsc::unbounded_channel()
    }

    /// Drains everything currently queued for one fake session.
    fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    // =====================================================================
    // try_insert() / contains() / remove()
    // =====================================================================

    #[tokio::test]
    async fn test_try_insert_free_identity_inserts() {
        let registry = Registry::new();
        let (tx, _rx) = sink();

        let outcome = registry.try_insert(uid("alice"), tx).await;

        assert_eq!(outcome, InsertOutcome::Inserted);
        assert!(registry.contains(&uid("alice")).await);
        assert_eq!(registry.snapshot().await, vec![uid("alice")]);
    }

    #[tokio::test]
    async fn test_try_insert_taken_identity_rejected() {
        let registry = Registry::new();
        let (tx1, mut rx1) = sink();
        let (tx2, _rx2) = sink();
        registry.try_insert(uid("alice"), tx1).await;

        let outcome = registry.try_insert(uid("alice"), tx2).await;

        assert_eq!(outcome, InsertOutcome::AlreadyPresent);
        // The original sink must still be the registered one.
        registry.broadcast(ServerLine::Message("ping".into())).await;
        assert_eq!(drain(&mut rx1), vec!["MESSAGE ping"]);
    }

    #[tokio::test]
    async fn test_remove_present_identity_removes() {
        let registry = Registry::new();
        let (tx, _rx) = sink();
        registry.try_insert(uid("alice"), tx).await;

        registry.remove(&uid("alice")).await;

        assert!(!registry.contains(&uid("alice")).await);
        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_absent_identity_is_noop() {
        let registry = Registry::new();
        registry.remove(&uid("ghost")).await;
        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_identity_free_again_after_remove() {
        let registry = Registry::new();
        let (tx1, _rx1) = sink();
        registry.try_insert(uid("alice"), tx1).await;
        registry.remove(&uid("alice")).await;

        let (tx2, _rx2) = sink();
        let outcome = registry.try_insert(uid("alice"), tx2).await;

        assert_eq!(outcome, InsertOutcome::Inserted);
    }

    // =====================================================================
    // broadcast()
    // =====================================================================

    #[tokio::test]
    async fn test_broadcast_reaches_every_sink() {
        let registry = Registry::new();
        let (tx_a, mut rx_a) = sink();
        let (tx_b, mut rx_b) = sink();
        registry.try_insert(uid("alice"), tx_a).await;
        registry.try_insert(uid("bob"), tx_b).await;

        registry
            .broadcast(ServerLine::chat(&uid("alice"), "hi"))
            .await;

        assert_eq!(drain(&mut rx_a), vec!["MESSAGE alice: hi"]);
        assert_eq!(drain(&mut rx_b), vec!["MESSAGE alice: hi"]);
    }

    #[tokio::test]
    async fn test_broadcast_dead_sink_does_not_block_others() {
        let registry = Registry::new();
        let (tx_a, rx_a) = sink();
        let (tx_b, mut rx_b) = sink();
        registry.try_insert(uid("alice"), tx_a).await;
        registry.try_insert(uid("bob"), tx_b).await;
        // Alice's session is gone but her entry hasn't been cleaned
        // up yet — the mid-disconnect window.
        drop(rx_a);

        registry.broadcast(ServerLine::Message("still here".into())).await;

        assert_eq!(drain(&mut rx_b), vec!["MESSAGE still here"]);
    }

    #[tokio::test]
    async fn test_broadcast_empty_registry_is_noop() {
        let registry = Registry::new();
        registry.broadcast(ServerLine::Message("void".into())).await;
    }

    // =====================================================================
    // broadcast_user_list() / snapshot()
    // =====================================================================

    #[tokio::test]
    async fn test_broadcast_user_list_is_sorted_with_trailing_comma() {
        let registry = Registry::new();
        let (tx_c, mut rx_c) = sink();
        let (tx_a, _rx_a) = sink();
        registry.try_insert(uid("carol"), tx_c).await;
        registry.try_insert(uid("alice"), tx_a).await;

        registry.broadcast_user_list().await;

        assert_eq!(drain(&mut rx_c), vec!["/userlist alice,carol,"]);
    }

    #[tokio::test]
    async fn test_snapshot_returns_sorted_identities() {
        let registry = Registry::new();
        let (tx_b, _rx_b) = sink();
        let (tx_a, _rx_a) = sink();
        registry.try_insert(uid("bob"), tx_b).await;
        registry.try_insert(uid("alice"), tx_a).await;

        let snapshot = registry.snapshot().await;

        assert_eq!(snapshot, vec![uid("alice"), uid("bob")]);
    }

    // =====================================================================
    // whisper()
    // =====================================================================

    #[tokio::test]
    async fn test_whisper_delivers_to_target_and_echoes_sender() {
        let registry = Registry::new();
        let (tx_a, mut rx_a) = sink();
        let (tx_b, mut rx_b) = sink();
        registry.try_insert(uid("alice"), tx_a.clone()).await;
        registry.try_insert(uid("bob"), tx_b).await;

        registry
            .whisper(&uid("alice"), &tx_a, &uid("bob"), "psst")
            .await;

        assert_eq!(drain(&mut rx_b), vec!["MESSAGE (from alice): psst"]);
        assert_eq!(drain(&mut rx_a), vec!["MESSAGE (to bob): psst"]);
    }

    #[tokio::test]
    async fn test_whisper_does_not_leak_to_third_parties() {
        let registry = Registry::new();
        let (tx_a, _rx_a) = sink();
        let (tx_b, _rx_b) = sink();
        let (tx_c, mut rx_c) = sink();
        registry.try_insert(uid("alice"), tx_a.clone()).await;
        registry.try_insert(uid("bob"), tx_b).await;
        registry.try_insert(uid("carol"), tx_c).await;

        registry
            .whisper(&uid("alice"), &tx_a, &uid("bob"), "secret")
            .await;

        assert!(drain(&mut rx_c).is_empty());
    }

    #[tokio::test]
    async fn test_whisper_absent_target_notifies_sender_only() {
        let registry = Registry::new();
        let (tx_a, mut rx_a) = sink();
        let (tx_b, mut rx_b) = sink();
        registry.try_insert(uid("alice"), tx_a.clone()).await;
        registry.try_insert(uid("bob"), tx_b).await;

        registry
            .whisper(&uid("alice"), &tx_a, &uid("ghost"), "anyone?")
            .await;

        assert_eq!(
            drain(&mut rx_a),
            vec!["MESSAGE [system] 'ghost' is not connected."]
        );
        assert!(drain(&mut rx_b).is_empty());
    }
}
