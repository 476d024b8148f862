//! Read-only projections served to players and big screens.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    dao::models::{LiveSessionEntity, SessionState},
    dto::public::{
        LiveSessionListItem, LiveSessionsResponse, PublicSessionResponse, SessionPlayersResponse,
    },
    error::ServiceError,
    state::SharedState,
};

/// List every live session, flagging the ones whose name is presentable.
pub async fn list_live_sessions(
    state: &SharedState,
) -> Result<LiveSessionsResponse, ServiceError> {
    let store = state.require_session_store().await?;
    let mut live = store.list_live_sessions().await?;
    live.sort_by(|(_, a), (_, b)| a.name.cmp(&b.name));

    let mut name_counts: HashMap<String, u32> = HashMap::new();
    for (_, doc) in &live {
        *name_counts
            .entry(doc.name.trim().to_lowercase())
            .or_default() += 1;
    }

    let sessions = live
        .into_iter()
        .map(|(id, doc)| {
            let displayable = displayable_name(&doc.name, &name_counts);
            LiveSessionListItem {
                id,
                name: doc.name,
                state: doc.state,
                displayable,
            }
        })
        .collect();

    Ok(LiveSessionsResponse { sessions })
}

/// Full public view of one live session, with the advisory countdown attached
/// while a question is open.
pub async fn get_live_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<PublicSessionResponse, ServiceError> {
    let store = state.require_session_store().await?;
    let doc = store
        .read_live_session(session_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("session `{session_id}` is not initialized"))
        })?;

    let seconds_left = match seconds_left_inputs(&doc) {
        Some((start_time, total_seconds)) => {
            let now = store.server_time_ms().await?;
            let elapsed_seconds = (now.saturating_sub(start_time) / 1_000) as u32;
            Some(total_seconds.saturating_sub(elapsed_seconds))
        }
        None => None,
    };

    Ok(PublicSessionResponse {
        session: doc.into(),
        seconds_left,
    })
}

/// Waiting-room roster of a session.
pub async fn session_players(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionPlayersResponse, ServiceError> {
    let store = state.require_session_store().await?;

    if store.read_live_session(session_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "session `{session_id}` is not initialized"
        )));
    }

    let players = store
        .list_players()
        .await?
        .into_iter()
        .filter(|player| player.session_id == Some(session_id))
        .map(Into::into)
        .collect();

    Ok(SessionPlayersResponse { players })
}

fn seconds_left_inputs(doc: &LiveSessionEntity) -> Option<(u64, u32)> {
    if doc.state != SessionState::QuestionOpen {
        return None;
    }
    let round = doc.question.as_ref()?;
    Some((round.start_time?, round.total_seconds))
}

/// A name is displayable when it is non-blank and no other live session
/// carries the same trimmed, case-folded name.
fn displayable_name(name: &str, name_counts: &HashMap<String, u32>) -> bool {
    let folded = name.trim().to_lowercase();
    !folded.is_empty() && name_counts.get(&folded).copied().unwrap_or(0) == 1
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{PlayerEntity, QuestionRound},
            session_store::{SessionStore, memory::MemorySessionStore},
        },
        state::AppState,
    };

    async fn test_state() -> (SharedState, Arc<dyn SessionStore>) {
        let state = AppState::new(AppConfig::for_tests(std::time::Duration::from_millis(10)));
        let store = MemorySessionStore::connect().await.unwrap();
        state.install_session_store(store.clone()).await;
        (state, store)
    }

    fn live_doc(name: &str, state_value: SessionState) -> LiveSessionEntity {
        LiveSessionEntity {
            name: name.into(),
            seconds_per_question: 30,
            leaderboard_max: 1000,
            state: state_value,
            question: None,
            scores: IndexMap::new(),
            leaderboard: Vec::new(),
        }
    }

    #[tokio::test]
    async fn blank_and_duplicate_names_are_not_displayable() {
        let (state, store) = test_state().await;
        for name in ["Quiz", "  quiz ", "", "Solo"] {
            store
                .write_live_session(Uuid::new_v4(), live_doc(name, SessionState::NotStarted))
                .await
                .unwrap();
        }

        let listing = list_live_sessions(&state).await.unwrap();
        assert_eq!(listing.sessions.len(), 4);
        for session in &listing.sessions {
            let expected = session.name == "Solo";
            assert_eq!(session.displayable, expected, "name: {:?}", session.name);
        }
    }

    #[tokio::test]
    async fn countdown_is_only_reported_for_open_questions() {
        let (state, store) = test_state().await;
        let session_id = Uuid::new_v4();

        let mut doc = live_doc("Quiz", SessionState::QuestionOpen);
        let now = store.server_time_ms().await.unwrap();
        doc.question = Some(QuestionRound {
            index: 0,
            id: Uuid::new_v4(),
            text: "Q".into(),
            options: ["A".into(), "B".into(), "C".into(), "D".into()],
            total_seconds: 30,
            // Opened five seconds ago.
            start_time: Some(now - 5_000),
            correct_index: None,
            guesses: None,
            total_guesses: None,
        });
        store.write_live_session(session_id, doc).await.unwrap();

        let response = get_live_session(&state, session_id).await.unwrap();
        let seconds_left = response.seconds_left.unwrap();
        assert!((24..=26).contains(&seconds_left), "got {seconds_left}");

        store
            .write_live_session(session_id, live_doc("Quiz", SessionState::QuestionClosed))
            .await
            .unwrap();
        let response = get_live_session(&state, session_id).await.unwrap();
        assert_eq!(response.seconds_left, None);
    }

    #[tokio::test]
    async fn expired_countdown_clamps_to_zero() {
        let (state, store) = test_state().await;
        let session_id = Uuid::new_v4();

        let mut doc = live_doc("Quiz", SessionState::QuestionOpen);
        doc.question = Some(QuestionRound {
            index: 0,
            id: Uuid::new_v4(),
            text: "Q".into(),
            options: ["A".into(), "B".into(), "C".into(), "D".into()],
            total_seconds: 5,
            start_time: Some(0),
            correct_index: None,
            guesses: None,
            total_guesses: None,
        });
        store.write_live_session(session_id, doc).await.unwrap();

        let response = get_live_session(&state, session_id).await.unwrap();
        assert_eq!(response.seconds_left, Some(0));
    }

    #[tokio::test]
    async fn roster_only_contains_members_of_the_session() {
        let (state, store) = test_state().await;
        let session_id = Uuid::new_v4();
        store
            .write_live_session(session_id, live_doc("Quiz", SessionState::NotStarted))
            .await
            .unwrap();

        let member = PlayerEntity {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Tester".into(),
            email: "ada@example.com".into(),
            image: String::new(),
            session_id: Some(session_id),
        };
        let outsider = PlayerEntity {
            id: Uuid::new_v4(),
            first_name: "Bob".into(),
            last_name: "Tester".into(),
            email: "bob@example.com".into(),
            image: String::new(),
            session_id: None,
        };
        store.save_player(member.clone()).await.unwrap();
        store.save_player(outsider).await.unwrap();

        let roster = session_players(&state, session_id).await.unwrap();
        assert_eq!(roster.players.len(), 1);
        assert_eq!(roster.players[0].id, member.id);
    }
}
