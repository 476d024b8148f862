use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trivia Live.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::sse::admin_stream,
        crate::routes::public::list_sessions,
        crate::routes::public::get_session,
        crate::routes::public::get_session_players,
        crate::routes::player::join_session,
        crate::routes::player::submit_answer,
        crate::routes::admin::list_sessions,
        crate::routes::admin::create_session,
        crate::routes::admin::get_session,
        crate::routes::admin::update_session,
        crate::routes::admin::delete_session,
        crate::routes::admin::list_questions,
        crate::routes::admin::create_question,
        crate::routes::admin::reorder_questions,
        crate::routes::admin::update_question,
        crate::routes::admin::delete_question,
        crate::routes::admin::initialize_session,
        crate::routes::admin::next_question,
        crate::routes::admin::end_question,
        crate::routes::admin::show_leaderboard,
        crate::routes::admin::end_game,
        crate::routes::admin::reset_session,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::AdminHandshake,
            crate::dto::sse::SessionWrittenEvent,
            crate::dto::sse::SessionRemovedEvent,
            crate::dto::sse::PlayerWrittenEvent,
            crate::dto::sse::PlayerRemovedEvent,
            crate::dto::sse::PhaseChangedEvent,
            crate::dto::common::ActionResponse,
            crate::dto::common::PlayerSummary,
            crate::dto::common::QuestionView,
            crate::dto::common::ScoreView,
            crate::dto::common::LeaderboardEntryView,
            crate::dto::common::LiveSessionView,
            crate::dto::public::LiveSessionListItem,
            crate::dto::public::LiveSessionsResponse,
            crate::dto::public::PublicSessionResponse,
            crate::dto::public::SessionPlayersResponse,
            crate::dto::player::JoinSessionRequest,
            crate::dto::player::JoinSessionResponse,
            crate::dto::player::SubmitAnswerRequest,
            crate::dto::admin::CreateSessionRequest,
            crate::dto::admin::UpdateSessionRequest,
            crate::dto::admin::SessionSummary,
            crate::dto::admin::QuestionInput,
            crate::dto::admin::QuestionSummary,
            crate::dto::admin::ReorderQuestionsRequest,
            crate::dao::models::SessionState,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "public", description = "Read-only views of live sessions"),
        (name = "players", description = "Joining sessions and answering questions"),
        (name = "admin", description = "Session configuration and game driving"),
    )
)]
pub struct ApiDoc;
