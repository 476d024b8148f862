//! Typed SSE event emission: driver phase notifications for admins, and the
//! store fan-out that relays live session and player changes to every public
//! subscriber.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::SessionState,
        session_store::{LiveSessionChange, PlayerChange, SessionStore},
    },
    dto::sse::{
        PhaseChangedEvent, PlayerRemovedEvent, PlayerWrittenEvent, ServerEvent,
        SessionRemovedEvent, SessionWrittenEvent,
    },
    state::SharedState,
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_SESSION_WRITTEN: &str = "session.written";
const EVENT_SESSION_REMOVED: &str = "session.removed";
const EVENT_PLAYER_WRITTEN: &str = "player.written";
const EVENT_PLAYER_REMOVED: &str = "player.removed";

/// Notify admins that a driver moved its session to a new lifecycle state.
pub fn broadcast_phase_changed(state: &SharedState, session_id: Uuid, session_state: SessionState) {
    let payload = PhaseChangedEvent {
        session_id,
        state: session_state,
    };
    send_admin_event(state, EVENT_PHASE_CHANGED, &payload);
}

/// Relay the store's change feeds onto the public SSE hub. Spawned once per
/// installed store; the task ends when the store (and its senders) is dropped.
pub fn spawn_store_fanout(state: SharedState, store: Arc<dyn SessionStore>) {
    let mut live_changes = store.watch_live_sessions();
    let mut player_changes = store.watch_players();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                change = live_changes.recv() => match change {
                    Ok(LiveSessionChange::Written { id, doc }) => {
                        let payload = SessionWrittenEvent {
                            session_id: id,
                            session: doc.into(),
                        };
                        send_public_event(&state, EVENT_SESSION_WRITTEN, &payload);
                    }
                    Ok(LiveSessionChange::Removed { id }) => {
                        let payload = SessionRemovedEvent { session_id: id };
                        send_public_event(&state, EVENT_SESSION_REMOVED, &payload);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "live session fan-out lagged; dropping changes");
                    }
                    Err(RecvError::Closed) => break,
                },
                change = player_changes.recv() => match change {
                    Ok(PlayerChange::Added(player)) | Ok(PlayerChange::Changed(player)) => {
                        let payload = PlayerWrittenEvent {
                            session_id: player.session_id,
                            player: player.into(),
                        };
                        send_public_event(&state, EVENT_PLAYER_WRITTEN, &payload);
                    }
                    Ok(PlayerChange::Removed { id }) => {
                        let payload = PlayerRemovedEvent { player_id: id };
                        send_public_event(&state, EVENT_PLAYER_REMOVED, &payload);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "player fan-out lagged; dropping changes");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        info!("store fan-out stopped");
    });
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

fn send_admin_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.admin_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize admin SSE payload"),
    }
}
