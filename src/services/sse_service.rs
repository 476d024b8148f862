//! Transport glue for the two SSE endpoints: bridging the broadcast hubs
//! into axum response streams, plus the claim/release protocol that keeps
//! the presenter stream single-subscriber.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::{
    dto::sse::{AdminHandshake, ServerEvent},
    error::ServiceError,
    state::{EventHub, SharedState},
};

/// Buffer between the hub forwarder and the HTTP response body.
const FORWARD_BUFFER: usize = 8;
/// Interval of the comment pings that keep idle connections open through
/// proxies.
const KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Subscribe to the audience stream.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.public_sse().subscribe()
}

/// Claim the presenter stream and subscribe to it. Fails while another
/// console still holds the admin token.
pub async fn subscribe_admin(
    state: &SharedState,
) -> Result<(broadcast::Receiver<ServerEvent>, String), ServiceError> {
    let token = claim_admin_token(state).await?;
    let receiver = state.admin_sse().subscribe();
    Ok((receiver, token))
}

/// Which endpoint a response stream serves, deciding the teardown work once
/// the subscriber goes away.
#[derive(Clone)]
pub enum StreamKind {
    /// Audience stream; disconnects need no bookkeeping.
    Public,
    /// Presenter stream. Carries the shared state so the teardown can
    /// release the admin token after the request context is gone.
    Admin(SharedState),
}

/// Wrap a hub subscription in an SSE response. A forwarder task drains the
/// broadcast receiver into a bounded channel and runs the teardown for
/// `kind` when either side hangs up.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(FORWARD_BUFFER);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                received = receiver.recv() => match received {
                    Ok(payload) => {
                        let mut event = Event::default().data(payload.data);
                        if let Some(name) = payload.event {
                            event = event.event(name);
                        }
                        if tx.send(Ok(event)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                    // A slow consumer skips the backlog and picks up live.
                    Err(RecvError::Lagged(_)) => continue,
                },
            }
        }

        match kind {
            StreamKind::Public => tracing::info!("audience stream subscriber left"),
            StreamKind::Admin(state) => {
                reset_admin_token(&state).await;
                tracing::info!("presenter console disconnected, admin token released");
            }
        }
    });

    Sse::new(ReceiverStream::new(rx))
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE).text("ping"))
}

/// Mint a token for a new presenter console, rejecting the claim while an
/// earlier console still holds the stream.
async fn claim_admin_token(state: &SharedState) -> Result<String, ServiceError> {
    let mut guard = state.admin_token().lock().await;
    match &mut *guard {
        slot @ None => {
            let token = Uuid::new_v4().simple().to_string();
            slot.replace(token.clone());
            Ok(token)
        }
        Some(_) => Err(ServiceError::Unauthorized(
            "another presenter console already holds the admin stream".into(),
        )),
    }
}

/// Push the freshly minted token down the presenter stream so the console
/// can authenticate its admin calls.
pub fn broadcast_admin_handshake(hub: &EventHub, token: &str) {
    if let Ok(event) = ServerEvent::json(
        Some("admin_token".to_string()),
        &AdminHandshake {
            token: token.to_string(),
        },
    ) {
        hub.broadcast(event);
    }
}

/// Put a plain informational message on the audience stream.
pub fn broadcast_public_info(hub: &EventHub, message: &str) {
    hub.broadcast(ServerEvent::new(
        Some("info".to_string()),
        message.to_string(),
    ));
}

/// Free the token slot so the next `/sse/admin` subscriber can claim it.
async fn reset_admin_token(state: &SharedState) {
    state.admin_token().lock().await.take();
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{config::AppConfig, state::AppState};

    fn test_state() -> SharedState {
        AppState::new(AppConfig::for_tests(Duration::from_millis(10)))
    }

    #[tokio::test]
    async fn only_one_presenter_console_at_a_time() {
        let state = test_state();

        let (_receiver, token) = subscribe_admin(&state).await.unwrap();
        assert!(!token.is_empty());

        assert!(matches!(
            subscribe_admin(&state).await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn releasing_the_token_lets_the_next_console_claim_it() {
        let state = test_state();

        let (_receiver, first) = subscribe_admin(&state).await.unwrap();
        reset_admin_token(&state).await;

        let (_receiver, second) = subscribe_admin(&state).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn handshake_reaches_the_presenter_stream() {
        let state = test_state();
        let (mut receiver, token) = subscribe_admin(&state).await.unwrap();

        broadcast_admin_handshake(state.admin_sse(), &token);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("admin_token"));
        assert!(event.data.contains(&token));
    }
}
