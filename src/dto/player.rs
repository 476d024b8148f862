//! DTO definitions for the player-facing endpoints (join, answer).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Payload joining a session. When `player_id` is present the existing record
/// switches its membership; otherwise a new player record is created.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinSessionRequest {
    #[serde(default)]
    pub player_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub image: String,
}

/// Acknowledgement of a join, carrying the player's stable identifier.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinSessionResponse {
    pub player_id: Uuid,
}

/// A player's answer for the open round. Overwrites any earlier answer;
/// only the last write before round close counts.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitAnswerRequest {
    pub player_id: Uuid,
    /// Chosen option slot.
    #[validate(range(max = 3))]
    pub answer: u8,
}
