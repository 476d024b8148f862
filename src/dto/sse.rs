use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::common::{LiveSessionView, PlayerSummary};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Build an event from a pre-rendered data string.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Token handed to the single admin SSE subscriber on connect.
pub struct AdminHandshake {
    /// Credential expected in the `X-Admin-Token` header of admin requests.
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a live session document is created or rewritten.
pub struct SessionWrittenEvent {
    pub session_id: Uuid,
    pub session: LiveSessionView,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a live session document is removed (session reset).
pub struct SessionRemovedEvent {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player record appears or changes.
pub struct PlayerWrittenEvent {
    pub player: PlayerSummary,
    /// Session the player currently belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player record is removed.
pub struct PlayerRemovedEvent {
    pub player_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast to admins after every driver transition.
pub struct PhaseChangedEvent {
    pub session_id: Uuid,
    pub state: crate::dao::models::SessionState,
}
