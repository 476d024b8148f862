//! Admin CRUD over session definitions.

use std::collections::HashMap;
use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::SessionEntity,
    dto::{
        admin::{CreateSessionRequest, SessionSummary, UpdateSessionRequest},
        common::ActionResponse,
    },
    error::ServiceError,
    services::driver_service,
    state::SharedState,
};

/// Bounds accepted for a leaderboard cap before the fallback kicks in.
const LEADERBOARD_MAX_RANGE: std::ops::RangeInclusive<i64> = 1..=1_000;

/// List every session definition with its displayable/initialized flags.
pub async fn list_sessions(state: &SharedState) -> Result<Vec<SessionSummary>, ServiceError> {
    let store = state.require_session_store().await?;
    let definitions = store.list_sessions().await?;
    let name_counts = count_names(&definitions);

    let mut summaries = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let displayable = displayable_name(&definition.name, &name_counts);
        let initialized = store.read_live_session(definition.id).await?.is_some();
        summaries.push(SessionSummary::from_entity(
            definition,
            displayable,
            initialized,
        ));
    }
    Ok(summaries)
}

/// Create a session definition, filling omitted fields with configured defaults.
pub async fn create_session(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<SessionSummary, ServiceError> {
    let store = state.require_session_store().await?;
    let now = SystemTime::now();

    let definition = SessionEntity {
        id: Uuid::new_v4(),
        name: request.name.unwrap_or_default(),
        seconds_per_question: request
            .seconds_per_question
            .unwrap_or_else(|| state.config().default_seconds_per_question()),
        leaderboard_max: state.config().fallback_leaderboard_max(),
        created_at: now,
        updated_at: now,
    };
    store.save_session(definition.clone()).await?;
    info!(session_id = %definition.id, "session definition created");

    summarize(state, definition).await
}

/// Fetch one session definition.
pub async fn get_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionSummary, ServiceError> {
    let store = state.require_session_store().await?;
    let definition = store
        .find_session(session_id)
        .await?
        .ok_or_else(|| session_not_found(session_id))?;
    summarize(state, definition).await
}

/// Apply a partial update to a session definition.
///
/// Tuning changes only affect rounds opened after the next initialization;
/// an already live document keeps the values it was initialized with.
pub async fn update_session(
    state: &SharedState,
    session_id: Uuid,
    request: UpdateSessionRequest,
) -> Result<SessionSummary, ServiceError> {
    let store = state.require_session_store().await?;
    let mut definition = store
        .find_session(session_id)
        .await?
        .ok_or_else(|| session_not_found(session_id))?;

    if let Some(name) = request.name {
        definition.name = name;
    }
    if let Some(seconds) = request.seconds_per_question {
        definition.seconds_per_question = seconds;
    }
    if let Some(raw) = request.leaderboard_max {
        definition.leaderboard_max =
            coerce_leaderboard_max(raw, state.config().fallback_leaderboard_max());
    }
    definition.updated_at = SystemTime::now();

    store.save_session(definition.clone()).await?;
    summarize(state, definition).await
}

/// Delete a session definition along with everything hanging off it: the
/// live document (via a reset), the question bank, and pending answers.
pub async fn delete_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<ActionResponse, ServiceError> {
    let store = state.require_session_store().await?;

    if store.find_session(session_id).await?.is_none() {
        return Err(session_not_found(session_id));
    }

    driver_service::reset_session(state, session_id).await?;

    for question in store.questions_for_session(session_id).await? {
        store.remove_question(question.id).await?;
    }
    store.remove_session(session_id).await?;
    info!(%session_id, "session definition deleted");

    Ok(ActionResponse {
        message: "session deleted".into(),
    })
}

/// Clamp an arbitrary client-supplied cap into the accepted range, falling
/// back to the configured value rather than rejecting the request.
pub fn coerce_leaderboard_max(raw: i64, fallback: u32) -> u32 {
    if LEADERBOARD_MAX_RANGE.contains(&raw) {
        raw as u32
    } else {
        fallback
    }
}

async fn summarize(
    state: &SharedState,
    definition: SessionEntity,
) -> Result<SessionSummary, ServiceError> {
    let store = state.require_session_store().await?;
    let definitions = store.list_sessions().await?;
    let name_counts = count_names(&definitions);
    let displayable = displayable_name(&definition.name, &name_counts);
    let initialized = store.read_live_session(definition.id).await?.is_some();
    Ok(SessionSummary::from_entity(
        definition,
        displayable,
        initialized,
    ))
}

fn session_not_found(session_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("session `{session_id}` does not exist"))
}

fn count_names(definitions: &[SessionEntity]) -> HashMap<String, u32> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for definition in definitions {
        *counts
            .entry(definition.name.trim().to_lowercase())
            .or_default() += 1;
    }
    counts
}

fn displayable_name(name: &str, name_counts: &HashMap<String, u32>) -> bool {
    let folded = name.trim().to_lowercase();
    !folded.is_empty() && name_counts.get(&folded).copied().unwrap_or(0) == 1
}
