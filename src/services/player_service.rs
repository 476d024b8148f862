//! Player-facing operations: joining a session and submitting answers.

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, SessionState},
    dto::{
        common::ActionResponse,
        player::{JoinSessionRequest, JoinSessionResponse, SubmitAnswerRequest},
    },
    error::ServiceError,
    state::SharedState,
};

/// Join an initialized session, creating the player record on first contact.
///
/// A player belongs to at most one session; joining moves any existing record
/// over and refreshes the profile fields.
pub async fn join_session(
    state: &SharedState,
    session_id: Uuid,
    request: JoinSessionRequest,
) -> Result<JoinSessionResponse, ServiceError> {
    let store = state.require_session_store().await?;

    if store.read_live_session(session_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "session `{session_id}` is not open for joining"
        )));
    }

    let player = match request.player_id {
        Some(player_id) => {
            let mut player = store.find_player(player_id).await?.ok_or_else(|| {
                ServiceError::NotFound(format!("player `{player_id}` does not exist"))
            })?;
            player.first_name = request.first_name;
            player.last_name = request.last_name;
            player.email = request.email;
            player.image = request.image;
            player.session_id = Some(session_id);
            player
        }
        None => PlayerEntity {
            id: Uuid::new_v4(),
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            image: request.image,
            session_id: Some(session_id),
        },
    };

    let player_id = player.id;
    store.save_player(player).await?;
    info!(%session_id, %player_id, "player joined session");

    Ok(JoinSessionResponse { player_id })
}

/// Record a player's answer for the open round. Later submissions overwrite
/// earlier ones; the store stamps the submission time.
pub async fn submit_answer(
    state: &SharedState,
    session_id: Uuid,
    request: SubmitAnswerRequest,
) -> Result<ActionResponse, ServiceError> {
    let store = state.require_session_store().await?;

    let doc = store
        .read_live_session(session_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("session `{session_id}` is not initialized"))
        })?;
    if doc.state != SessionState::QuestionOpen {
        return Err(ServiceError::InvalidState(
            "no question is currently open".into(),
        ));
    }

    let player = store
        .find_player(request.player_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("player `{}` does not exist", request.player_id))
        })?;
    if player.session_id != Some(session_id) {
        return Err(ServiceError::InvalidState(
            "player has not joined this session".into(),
        ));
    }

    store
        .save_answer(request.player_id, session_id, request.answer)
        .await?;
    Ok(ActionResponse {
        message: "answer recorded".into(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::LiveSessionEntity,
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

    fn live_doc(state_value: SessionState) -> LiveSessionEntity {
        LiveSessionEntity {
            name: "Quiz".into(),
            seconds_per_question: 30,
            leaderboard_max: 1000,
            state: state_value,
            question: None,
            scores: IndexMap::new(),
            leaderboard: Vec::new(),
        }
    }

    fn join_request(first_name: &str) -> JoinSessionRequest {
        JoinSessionRequest {
            player_id: None,
            first_name: first_name.into(),
            last_name: "Tester".into(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            image: String::new(),
        }
    }

    #[tokio::test]
    async fn joining_an_uninitialized_session_is_not_found() {
        let (state, _store) = test_state().await;
        let result = join_session(&state, Uuid::new_v4(), join_request("Ada")).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn joining_creates_and_then_moves_the_player() {
        let (state, store) = test_state().await;
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        store
            .write_live_session(first, live_doc(SessionState::NotStarted))
            .await
            .unwrap();
        store
            .write_live_session(second, live_doc(SessionState::NotStarted))
            .await
            .unwrap();

        let joined = join_session(&state, first, join_request("Ada")).await.unwrap();
        let player = store.find_player(joined.player_id).await.unwrap().unwrap();
        assert_eq!(player.session_id, Some(first));

        // Rejoining with the known id moves the player to the other session.
        let mut request = join_request("Ada");
        request.player_id = Some(joined.player_id);
        let rejoined = join_session(&state, second, request).await.unwrap();
        assert_eq!(rejoined.player_id, joined.player_id);

        let player = store.find_player(joined.player_id).await.unwrap().unwrap();
        assert_eq!(player.session_id, Some(second));
        assert_eq!(store.list_players().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn answers_are_only_accepted_while_a_question_is_open() {
        let (state, store) = test_state().await;
        let session_id = Uuid::new_v4();
        store
            .write_live_session(session_id, live_doc(SessionState::NotStarted))
            .await
            .unwrap();
        let joined = join_session(&state, session_id, join_request("Ada")).await.unwrap();

        let request = SubmitAnswerRequest {
            player_id: joined.player_id,
            answer: 2,
        };
        let result = submit_answer(&state, session_id, request).await;
        assert!(matches!(result, Err(ServiceError::InvalidState(_))));

        store
            .write_live_session(session_id, live_doc(SessionState::QuestionOpen))
            .await
            .unwrap();
        let request = SubmitAnswerRequest {
            player_id: joined.player_id,
            answer: 2,
        };
        submit_answer(&state, session_id, request).await.unwrap();

        let answers = store.answers_for_session(session_id).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].1.answer, Some(2));
    }

    #[tokio::test]
    async fn answers_from_non_members_are_rejected() {
        let (state, store) = test_state().await;
        let session_id = Uuid::new_v4();
        let other = Uuid::new_v4();
        store
            .write_live_session(session_id, live_doc(SessionState::QuestionOpen))
            .await
            .unwrap();
        store
            .write_live_session(other, live_doc(SessionState::NotStarted))
            .await
            .unwrap();

        let joined = join_session(&state, other, join_request("Ada")).await.unwrap();
        let request = SubmitAnswerRequest {
            player_id: joined.player_id,
            answer: 0,
        };
        let result = submit_answer(&state, session_id, request).await;
        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
    }
}
