use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::public::{LiveSessionsResponse, PublicSessionResponse, SessionPlayersResponse},
    error::AppError,
    services::public_service,
    state::SharedState,
};

/// Public read-only endpoints over live sessions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/players", get(get_session_players))
}

#[utoipa::path(
    get,
    path = "/sessions",
    tag = "public",
    responses((status = 200, description = "Live sessions open to players", body = LiveSessionsResponse))
)]
/// List every live session a player could join.
pub async fn list_sessions(
    State(state): State<SharedState>,
) -> Result<Json<LiveSessionsResponse>, AppError> {
    let payload = public_service::list_live_sessions(&state).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "public",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Live session document", body = PublicSessionResponse),
        (status = 404, description = "Session not initialized")
    )
)]
/// Return the public document of one live session, with the advisory
/// countdown while a question is open.
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicSessionResponse>, AppError> {
    let payload = public_service::get_live_session(&state, id).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/players",
    tag = "public",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Players who joined the session", body = SessionPlayersResponse),
        (status = 404, description = "Session not initialized")
    )
)]
/// Return the waiting-room roster of a session.
pub async fn get_session_players(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionPlayersResponse>, AppError> {
    let payload = public_service::session_players(&state, id).await?;
    Ok(Json(payload))
}
