//! Admin CRUD over the question bank of a session.
//!
//! The bank is only editable while the session has no live document or has
//! not left `NOT_STARTED`; once the first round opens the order and content
//! are frozen until a reset.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{QuestionEntity, SessionState},
        session_store::SessionStore,
    },
    dto::{
        admin::{QuestionInput, QuestionSummary, ReorderQuestionsRequest},
        common::ActionResponse,
    },
    error::ServiceError,
    state::SharedState,
};

/// List the question bank of a session in presentation order.
pub async fn list_questions(
    state: &SharedState,
    session_id: Uuid,
) -> Result<Vec<QuestionSummary>, ServiceError> {
    let store = state.require_session_store().await?;
    ensure_session_exists(&store, session_id).await?;

    let questions = store.questions_for_session(session_id).await?;
    Ok(questions.into_iter().map(Into::into).collect())
}

/// Append or insert a question into the bank.
pub async fn create_question(
    state: &SharedState,
    session_id: Uuid,
    input: QuestionInput,
) -> Result<QuestionSummary, ServiceError> {
    let store = state.require_session_store().await?;
    ensure_session_exists(&store, session_id).await?;
    ensure_bank_editable(&store, session_id).await?;

    let existing = store.questions_for_session(session_id).await?;
    let order = input.order.unwrap_or_else(|| {
        existing
            .last()
            .map(|question| question.order + 1)
            .unwrap_or(0)
    });

    let question = QuestionEntity {
        id: Uuid::new_v4(),
        session_id,
        order,
        text: input.text,
        options: options_array(input.options)?,
        correct_index: input.correct_index,
    };
    store.save_question(question.clone()).await?;
    info!(%session_id, question_id = %question.id, order, "question added");

    Ok(question.into())
}

/// Replace the content of an existing question.
pub async fn update_question(
    state: &SharedState,
    question_id: Uuid,
    input: QuestionInput,
) -> Result<QuestionSummary, ServiceError> {
    let store = state.require_session_store().await?;
    let mut question = store
        .find_question(question_id)
        .await?
        .ok_or_else(|| question_not_found(question_id))?;
    ensure_bank_editable(&store, question.session_id).await?;

    question.text = input.text;
    question.options = options_array(input.options)?;
    question.correct_index = input.correct_index;
    if let Some(order) = input.order {
        question.order = order;
    }
    store.save_question(question.clone()).await?;

    Ok(question.into())
}

/// Remove a question from the bank.
pub async fn delete_question(
    state: &SharedState,
    question_id: Uuid,
) -> Result<ActionResponse, ServiceError> {
    let store = state.require_session_store().await?;
    let question = store
        .find_question(question_id)
        .await?
        .ok_or_else(|| question_not_found(question_id))?;
    ensure_bank_editable(&store, question.session_id).await?;

    store.remove_question(question_id).await?;
    Ok(ActionResponse {
        message: "question deleted".into(),
    })
}

/// Reorder the whole bank. The request must list every question of the
/// session exactly once; positions in the list become the new order.
pub async fn reorder_questions(
    state: &SharedState,
    session_id: Uuid,
    request: ReorderQuestionsRequest,
) -> Result<Vec<QuestionSummary>, ServiceError> {
    let store = state.require_session_store().await?;
    ensure_session_exists(&store, session_id).await?;
    ensure_bank_editable(&store, session_id).await?;

    let mut bank = store.questions_for_session(session_id).await?;
    if request.question_ids.len() != bank.len() {
        return Err(ServiceError::InvalidInput(format!(
            "reorder must list all {} questions of the session",
            bank.len()
        )));
    }

    let mut reordered = Vec::with_capacity(bank.len());
    for (position, question_id) in request.question_ids.iter().enumerate() {
        let index = bank
            .iter()
            .position(|question| question.id == *question_id)
            .ok_or_else(|| {
                ServiceError::InvalidInput(format!(
                    "question `{question_id}` does not belong to this session"
                ))
            })?;
        let mut question = bank.swap_remove(index);
        question.order = position as u32;
        reordered.push(question);
    }

    for question in &reordered {
        store.save_question(question.clone()).await?;
    }
    info!(%session_id, count = reordered.len(), "question bank reordered");

    Ok(reordered.into_iter().map(Into::into).collect())
}

async fn ensure_session_exists(
    store: &Arc<dyn SessionStore>,
    session_id: Uuid,
) -> Result<(), ServiceError> {
    store
        .find_session(session_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` does not exist")))
}

async fn ensure_bank_editable(
    store: &Arc<dyn SessionStore>,
    session_id: Uuid,
) -> Result<(), ServiceError> {
    match store.read_live_session(session_id).await? {
        None => Ok(()),
        Some(doc) if doc.state == SessionState::NotStarted => Ok(()),
        Some(doc) => Err(ServiceError::InvalidState(format!(
            "question bank is frozen while the session is {:?}",
            doc.state
        ))),
    }
}

fn question_not_found(question_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("question `{question_id}` does not exist"))
}

fn options_array(options: Vec<String>) -> Result<[String; 4], ServiceError> {
    options
        .try_into()
        .map_err(|_| ServiceError::InvalidInput("questions carry exactly four option slots".into()))
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use indexmap::IndexMap;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{LiveSessionEntity, SessionEntity},
            session_store::memory::MemorySessionStore,
        },
        state::AppState,
    };

    async fn test_state() -> (SharedState, Arc<dyn SessionStore>) {
        let state = AppState::new(AppConfig::for_tests(std::time::Duration::from_millis(10)));
        let store = MemorySessionStore::connect().await.unwrap();
        state.install_session_store(store.clone()).await;
        (state, store)
    }

    async fn seed_definition(store: &Arc<dyn SessionStore>) -> Uuid {
        let definition = SessionEntity {
            id: Uuid::new_v4(),
            name: "Quiz".into(),
            seconds_per_question: 30,
            leaderboard_max: 1000,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        };
        let id = definition.id;
        store.save_session(definition).await.unwrap();
        id
    }

    fn input(text: &str, order: Option<u32>) -> QuestionInput {
        QuestionInput {
            text: text.into(),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_index: 0,
            order,
        }
    }

    #[tokio::test]
    async fn created_questions_append_after_the_last_order() {
        let (state, store) = test_state().await;
        let session_id = seed_definition(&store).await;

        let first = create_question(&state, session_id, input("First", None))
            .await
            .unwrap();
        let second = create_question(&state, session_id, input("Second", None))
            .await
            .unwrap();
        assert_eq!(first.order, 0);
        assert_eq!(second.order, 1);

        let listed = list_questions(&state, session_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].text, "First");
    }

    #[tokio::test]
    async fn reorder_swaps_presentation_order() {
        let (state, store) = test_state().await;
        let session_id = seed_definition(&store).await;
        let first = create_question(&state, session_id, input("First", None))
            .await
            .unwrap();
        let second = create_question(&state, session_id, input("Second", None))
            .await
            .unwrap();

        let reordered = reorder_questions(
            &state,
            session_id,
            ReorderQuestionsRequest {
                question_ids: vec![second.id, first.id],
            },
        )
        .await
        .unwrap();
        assert_eq!(reordered[0].text, "Second");

        let listed = list_questions(&state, session_id).await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn reorder_rejects_incomplete_or_foreign_lists() {
        let (state, store) = test_state().await;
        let session_id = seed_definition(&store).await;
        let question = create_question(&state, session_id, input("Only", None))
            .await
            .unwrap();

        let missing = reorder_questions(
            &state,
            session_id,
            ReorderQuestionsRequest {
                question_ids: vec![],
            },
        )
        .await;
        assert!(matches!(missing, Err(ServiceError::InvalidInput(_))));

        let foreign = reorder_questions(
            &state,
            session_id,
            ReorderQuestionsRequest {
                question_ids: vec![Uuid::new_v4()],
            },
        )
        .await;
        assert!(matches!(foreign, Err(ServiceError::InvalidInput(_))));

        // The bank is untouched after rejected reorders.
        let listed = list_questions(&state, session_id).await.unwrap();
        assert_eq!(listed[0].id, question.id);
    }

    #[tokio::test]
    async fn bank_freezes_once_the_session_leaves_not_started() {
        let (state, store) = test_state().await;
        let session_id = seed_definition(&store).await;
        let question = create_question(&state, session_id, input("First", None))
            .await
            .unwrap();

        store
            .write_live_session(
                session_id,
                LiveSessionEntity {
                    name: "Quiz".into(),
                    seconds_per_question: 30,
                    leaderboard_max: 1000,
                    state: SessionState::QuestionOpen,
                    question: None,
                    scores: IndexMap::new(),
                    leaderboard: Vec::new(),
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            create_question(&state, session_id, input("Late", None)).await,
            Err(ServiceError::InvalidState(_))
        ));
        assert!(matches!(
            delete_question(&state, question.id).await,
            Err(ServiceError::InvalidState(_))
        ));
        assert!(matches!(
            update_question(&state, question.id, input("Edit", None)).await,
            Err(ServiceError::InvalidState(_))
        ));
    }
}
