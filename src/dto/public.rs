//! DTO definitions for the public read-only endpoints.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::SessionState,
    dto::common::{LiveSessionView, PlayerSummary},
};

/// One joinable live session in the public listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct LiveSessionListItem {
    pub id: Uuid,
    pub name: String,
    pub state: SessionState,
    /// Whether the trimmed name is non-empty and unique among live sessions.
    pub displayable: bool,
}

/// Listing of live sessions players may join.
#[derive(Debug, Serialize, ToSchema)]
pub struct LiveSessionsResponse {
    pub sessions: Vec<LiveSessionListItem>,
}

/// Full public view of one live session, with the advisory countdown derived
/// from the stored round start time. The countdown is display-only; the
/// driver's own timer is the only authority for closing the round.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicSessionResponse {
    pub session: LiveSessionView,
    /// Remaining round seconds, present while a question is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_left: Option<u32>,
}

/// Waiting-room roster of a session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionPlayersResponse {
    pub players: Vec<PlayerSummary>,
}
