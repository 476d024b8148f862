use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin::{
            CreateSessionRequest, QuestionInput, QuestionSummary, ReorderQuestionsRequest,
            SessionSummary, UpdateSessionRequest,
        },
        common::{ActionResponse, LiveSessionView},
    },
    error::AppError,
    services::{driver_service, question_service, session_service},
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only endpoints for configuring sessions and driving the live game.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/sessions", get(list_sessions).post(create_session))
        .route(
            "/admin/sessions/{id}",
            get(get_session).put(update_session).delete(delete_session),
        )
        .route(
            "/admin/sessions/{id}/questions",
            get(list_questions).post(create_question),
        )
        .route(
            "/admin/sessions/{id}/questions/reorder",
            post(reorder_questions),
        )
        .route(
            "/admin/questions/{id}",
            put(update_question).delete(delete_question),
        )
        .route("/admin/sessions/{id}/initialize", post(initialize_session))
        .route("/admin/sessions/{id}/question/next", post(next_question))
        .route("/admin/sessions/{id}/question/end", post(end_question))
        .route("/admin/sessions/{id}/leaderboard", post(show_leaderboard))
        .route("/admin/sessions/{id}/end", post(end_game))
        .route("/admin/sessions/{id}/reset", post(reset_session))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

#[utoipa::path(
    get,
    path = "/admin/sessions",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "List session definitions", body = [SessionSummary]))
)]
/// Retrieve every session definition for administration purposes.
pub async fn list_sessions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    Ok(Json(session_service::list_sessions(&state).await?))
}

#[utoipa::path(
    post,
    path = "/admin/sessions",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = CreateSessionRequest,
    responses((status = 200, description = "Session created", body = SessionSummary))
)]
/// Create a session definition, filling omitted fields with defaults.
pub async fn create_session(
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(session_service::create_session(&state, payload).await?))
}

#[utoipa::path(
    get,
    path = "/admin/sessions/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the session")),
    responses((status = 200, description = "Session definition", body = SessionSummary))
)]
/// Retrieve a session definition by its identifier.
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(session_service::get_session(&state, id).await?))
}

#[utoipa::path(
    put,
    path = "/admin/sessions/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the session")),
    request_body = UpdateSessionRequest,
    responses((status = 200, description = "Session updated", body = SessionSummary))
)]
/// Apply a partial update to a session definition.
pub async fn update_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSessionRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(
        session_service::update_session(&state, id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/admin/sessions/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the session")),
    responses((status = 204, description = "Session and its question bank deleted"))
)]
/// Delete a session definition with everything hanging off it.
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    session_service::delete_session(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/admin/sessions/{id}/questions",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the session")),
    responses((status = 200, description = "Question bank in presentation order", body = [QuestionSummary]))
)]
/// List the question bank of a session.
pub async fn list_questions(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<QuestionSummary>>, AppError> {
    Ok(Json(question_service::list_questions(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/questions",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the session")),
    request_body = QuestionInput,
    responses(
        (status = 200, description = "Question added", body = QuestionSummary),
        (status = 409, description = "Question bank is frozen")
    )
)]
/// Add a question to the bank of a session.
pub async fn create_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionInput>,
) -> Result<Json<QuestionSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        question_service::create_question(&state, id, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/questions/reorder",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the session")),
    request_body = ReorderQuestionsRequest,
    responses((status = 200, description = "Question bank reordered", body = [QuestionSummary]))
)]
/// Reorder the whole question bank of a session.
pub async fn reorder_questions(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReorderQuestionsRequest>,
) -> Result<Json<Vec<QuestionSummary>>, AppError> {
    Ok(Json(
        question_service::reorder_questions(&state, id, payload).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/admin/questions/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the question")),
    request_body = QuestionInput,
    responses((status = 200, description = "Question updated", body = QuestionSummary))
)]
/// Replace the content of a question.
pub async fn update_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionInput>,
) -> Result<Json<QuestionSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        question_service::update_question(&state, id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/admin/questions/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the question")),
    responses((status = 200, description = "Question deleted", body = ActionResponse))
)]
/// Remove a question from the bank.
pub async fn delete_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(question_service::delete_question(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/initialize",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Session initialized", body = LiveSessionView),
        (status = 409, description = "Already initialized or no presentable question")
    )
)]
/// Publish the live document of a session and start driving it.
pub async fn initialize_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LiveSessionView>, AppError> {
    Ok(Json(driver_service::initialize_session(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/question/next",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Next question opened", body = LiveSessionView),
        (status = 409, description = "No more questions or wrong state")
    )
)]
/// Open the next question and start its countdown.
pub async fn next_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LiveSessionView>, AppError> {
    Ok(Json(driver_service::start_next_question(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/question/end",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the session")),
    responses((status = 200, description = "Question closed and scored", body = ActionResponse))
)]
/// Close the open question early, scoring the round.
pub async fn end_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(driver_service::close_question(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/leaderboard",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the session")),
    responses((status = 200, description = "Leaderboard displayed", body = ActionResponse))
)]
/// Put the ranked leaderboard on display.
pub async fn show_leaderboard(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(driver_service::show_leaderboard(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/end",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the session")),
    responses((status = 200, description = "Game ended", body = ActionResponse))
)]
/// Move the session to its terminal state.
pub async fn end_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(driver_service::end_game(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/sessions/{id}/reset",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
    ("id" = Uuid, Path, description = "Identifier of the session")),
    responses((status = 200, description = "Session reset to its definition", body = ActionResponse))
)]
/// Tear the live session back down to its definition.
pub async fn reset_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(driver_service::reset_session(&state, id).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    verify_admin_token(&state, provided).await?;
    Ok(next.run(req).await)
}

/// Compare a presented token against the one held by the live admin stream.
async fn verify_admin_token(state: &SharedState, provided: Option<&str>) -> Result<(), AppError> {
    let provided = provided.ok_or_else(|| {
        AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
    })?;

    let guard = state.admin_token().lock().await;
    match guard.as_deref() {
        Some(token) if token == provided => Ok(()),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized(
            "admin SSE stream not initialised yet".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{config::AppConfig, state::AppState};

    fn test_state() -> SharedState {
        AppState::new(AppConfig::for_tests(Duration::from_millis(10)))
    }

    async fn set_token(state: &SharedState, token: &str) {
        state.admin_token().lock().await.replace(token.to_string());
    }

    #[tokio::test]
    async fn no_token_works_before_an_admin_stream_exists() {
        let state = test_state();
        assert!(matches!(
            verify_admin_token(&state, Some("whatever")).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn missing_and_wrong_tokens_are_rejected() {
        let state = test_state();
        set_token(&state, "s3cret").await;

        assert!(matches!(
            verify_admin_token(&state, None).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            verify_admin_token(&state, Some("not-it")).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn the_issued_token_passes_the_gate() {
        let state = test_state();
        set_token(&state, "s3cret").await;
        assert!(verify_admin_token(&state, Some("s3cret")).await.is_ok());
    }

    #[tokio::test]
    async fn a_stale_token_stops_working_after_the_stream_resets() {
        let state = test_state();
        set_token(&state, "s3cret").await;
        assert!(verify_admin_token(&state, Some("s3cret")).await.is_ok());

        state.admin_token().lock().await.take();
        assert!(matches!(
            verify_admin_token(&state, Some("s3cret")).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
