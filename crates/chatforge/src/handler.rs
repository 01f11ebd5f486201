//! Per-connection handler: the protocol engine.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The session moves through four states:
//!
//! 1. **Awaiting credentials** — prompt, read one line, handle
//!    `REGISTER`/`LOGIN`, repeat until a login sticks (no retry limit).
//! 2. **Authenticated** — confirm the identity, register in the shared
//!    registry, announce the join and the refreshed user list.
//! 3. **Active** — the message loop: quit, whisper, or broadcast.
//! 4. **Terminated** — deregister, announce the departure, close.
//!
//! The handler owns its session exclusively. Outbound lines — its own
//! replies and everyone else's broadcasts — all flow through one
//! unbounded channel drained by a writer task, so a session's wire
//! output is totally ordered no matter who produced it.

use std::sync::Arc;

use chatforge_protocol::{
    AuthCommand, ChatCommand, LoginFailReason, RegisterFailReason,
    ServerLine, UserId,
};
use chatforge_registry::{InsertOutcome, OutboundSink};
use chatforge_store::{AuthOutcome, RegisterOutcome};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::server::ServerState;
use crate::ChatError;

/// The buffered line reader over a connection's receive half.
type LineReader = Lines<BufReader<OwnedReadHalf>>;

/// Drop guard that deregisters a session and announces its departure.
///
/// Created the moment an identity is bound into the registry, so cleanup
/// happens on every exit from the message loop — quit, EOF, transport
/// error, or a panic in the handler. Since `Drop` is synchronous, the
/// async registry work runs in a fire-and-forget task.
struct SessionGuard {
    identity: UserId,
    state: Arc<ServerState>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let identity = self.identity.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.registry.remove(&identity).await;
            state
                .registry
                .broadcast(ServerLine::leave_notice(&identity))
                .await;
            state.registry.broadcast_user_list().await;
            tracing::info!(%identity, "session terminated");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    state: Arc<ServerState>,
) -> Result<(), ChatError> {
    let (read_half, write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    // One sink per session: the handler's own replies and the registry's
    // broadcasts both send here, and the writer task drains onto the
    // socket. The socket closes when the last sender is dropped.
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(write_outbound(write_half, rx));

    // --- State 1: awaiting credentials ---
    let Some(identity) =
        await_credentials(&mut lines, &tx, &state).await?
    else {
        // Client went away without ever logging in. Nothing was
        // registered, so there is nothing to announce.
        return Ok(());
    };

    // Registered in the registry from here on — guard before anything
    // that can fail, so the entry can't leak.
    let _guard = SessionGuard {
        identity: identity.clone(),
        state: Arc::clone(&state),
    };

    // --- State 2: authenticated ---
    let _ = tx.send(ServerLine::NameAccepted(identity.clone()).to_string());
    state
        .registry
        .broadcast(ServerLine::join_notice(&identity))
        .await;
    state.registry.broadcast_user_list().await;
    tracing::info!(%identity, "session active");

    // --- State 3: the message loop ---
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                // A broken transport ends the session exactly like an
                // explicit quit; no one else hears about it.
                tracing::debug!(%identity, error = %e, "read failed");
                break;
            }
        };

        match ChatCommand::parse(&line) {
            ChatCommand::Quit => break,
            ChatCommand::Whisper { target, message } => {
                state
                    .registry
                    .whisper(&identity, &tx, &target, &message)
                    .await;
            }
            ChatCommand::MalformedWhisper => {
                let _ = tx.send(ServerLine::whisper_usage().to_string());
            }
            ChatCommand::Say(text) => {
                state
                    .registry
                    .broadcast(ServerLine::chat(&identity, &text))
                    .await;
            }
            ChatCommand::Empty => {}
        }
    }

    // --- State 4: terminated ---
    // _guard drops here → deregistration and departure announcements.
    Ok(())
}

/// Runs the credential phase until a login binds an identity.
///
/// Returns `Ok(None)` if the client disconnects first. Registration and
/// failed logins loop forever — retry policy belongs to the client.
async fn await_credentials(
    lines: &mut LineReader,
    tx: &OutboundSink,
    state: &Arc<ServerState>,
) -> Result<Option<UserId>, ChatError> {
    loop {
        let _ = tx.send(ServerLine::SubmitName.to_string());

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(None),
            Err(e) => return Err(ChatError::Transport(e)),
        };

        // Malformed lines are ignored; the prompt repeats.
        let Some(command) = AuthCommand::parse(&line) else {
            continue;
        };

        match command {
            AuthCommand::Register {
                user_id,
                password,
                display_name,
                email,
            } => {
                let reply = match state
                    .store
                    .register(&user_id, &password, &display_name, &email)
                    .await
                {
                    Ok(RegisterOutcome::Created) => {
                        ServerLine::RegisterSuccess
                    }
                    Ok(RegisterOutcome::IdExists) => {
                        ServerLine::RegisterFail(RegisterFailReason::IdExists)
                    }
                    Err(e) => {
                        tracing::warn!(
                            %user_id,
                            error = %e,
                            "registration failed on storage"
                        );
                        ServerLine::RegisterFail(RegisterFailReason::Error)
                    }
                };
                let _ = tx.send(reply.to_string());
                // Registration never logs the user in; keep prompting.
            }

            AuthCommand::Login { user_id, password } => {
                // Advisory fast-path: skip the credential check when the
                // identity is visibly online. The authoritative check is
                // the try_insert below.
                if state.registry.contains(&user_id).await {
                    let _ = tx.send(
                        ServerLine::LoginFail(
                            LoginFailReason::AlreadyLoggedIn,
                        )
                        .to_string(),
                    );
                    continue;
                }

                match state.store.authenticate(&user_id, &password).await {
                    Ok(AuthOutcome::Accepted) => {}
                    Ok(
                        AuthOutcome::UnknownId | AuthOutcome::WrongPassword,
                    ) => {
                        let _ = tx.send(
                            ServerLine::LoginFail(LoginFailReason::WrongIdPw)
                                .to_string(),
                        );
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(
                            %user_id,
                            error = %e,
                            "login failed on storage"
                        );
                        let _ = tx.send(
                            ServerLine::LoginFail(LoginFailReason::Error)
                                .to_string(),
                        );
                        continue;
                    }
                }

                // The atomic check-and-set is the single point of truth
                // for identity uniqueness: two logins that both passed
                // the advisory check race here, and exactly one wins.
                match state
                    .registry
                    .try_insert(user_id.clone(), tx.clone())
                    .await
                {
                    InsertOutcome::Inserted => {
                        let _ = tx.send(
                            ServerLine::LoginSuccess(user_id.clone())
                                .to_string(),
                        );
                        return Ok(Some(user_id));
                    }
                    InsertOutcome::AlreadyPresent => {
                        let _ = tx.send(
                            ServerLine::LoginFail(
                                LoginFailReason::AlreadyLoggedIn,
                            )
                            .to_string(),
                        );
                    }
                }
            }
        }
    }
}

/// Drains a session's outbound channel onto its socket, one line at a
/// time, appending the protocol's newline delimiter.
///
/// Exits when every sender is gone (session terminated and deregistered)
/// or the socket dies; either way the write half is dropped and the
/// connection closes.
async fn write_outbound(
    mut write_half: OwnedWriteHalf,
    mut rx: UnboundedReceiver<String>,
) {
    while let Some(line) = rx.recv().await {
        let framed = format!("{line}\n");
        if write_half.write_all(framed.as_bytes()).await.is_err() {
            break;
        }
    }
}
