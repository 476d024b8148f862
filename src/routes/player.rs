use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        common::ActionResponse,
        player::{JoinSessionRequest, JoinSessionResponse, SubmitAnswerRequest},
    },
    error::AppError,
    services::player_service,
    state::SharedState,
};

/// Player-facing write endpoints: joining and answering.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions/{id}/join", post(join_session))
        .route("/sessions/{id}/answer", post(submit_answer))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/join",
    tag = "players",
    params(("id" = Uuid, Path, description = "Identifier of the session to join")),
    request_body = JoinSessionRequest,
    responses(
        (status = 200, description = "Player joined", body = JoinSessionResponse),
        (status = 400, description = "Invalid profile"),
        (status = 404, description = "Session not initialized")
    )
)]
/// Join a live session, creating the player record on first contact.
pub async fn join_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<JoinSessionRequest>,
) -> Result<Json<JoinSessionResponse>, AppError> {
    payload.validate()?;
    let response = player_service::join_session(&state, id, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/answer",
    tag = "players",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = ActionResponse),
        (status = 400, description = "Invalid answer"),
        (status = 409, description = "No question is open")
    )
)]
/// Submit or overwrite the player's answer for the open question.
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    let response = player_service::submit_answer(&state, id, payload).await?;
    Ok(Json(response))
}
