//! Presenter-driven session lifecycle: initialization, opening and closing
//! rounds, leaderboard display, ending the game, and the full reset.
//!
//! All transitions funnel through the per-session [`SessionDriver`], which is
//! the single writer of the public session document. The countdown timer
//! spawned at round open and the manual close endpoint race for the same
//! timer slot, so exactly one of them scores the round.

use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{LiveSessionEntity, PlayerEntity, QuestionRound, SessionState},
    dto::common::{ActionResponse, LiveSessionView},
    error::ServiceError,
    services::sse_events,
    state::{
        SessionDriver, SharedState,
        driver::RoundTimer,
        leaderboard::rank_players,
        scoring::{apply_round_scores, normalize_answers, tally_guesses},
        session_machine::{SessionEvent, SessionPhase},
    },
};

/// Create the public document for a session and register its driver.
///
/// Requires a session definition, no existing live document, and a first
/// question that is actually presentable (non-empty text and first option).
pub async fn initialize_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<LiveSessionView, ServiceError> {
    let store = state.require_session_store().await?;

    let definition = store.find_session(session_id).await?.ok_or_else(|| {
        ServiceError::NotFound(format!("session `{session_id}` does not exist"))
    })?;

    if store.read_live_session(session_id).await?.is_some() {
        return Err(ServiceError::InvalidState(format!(
            "session `{session_id}` is already initialized"
        )));
    }

    let questions = store.questions_for_session(session_id).await?;
    let first = questions.first().ok_or_else(|| {
        ServiceError::InvalidState("session has no questions to present".into())
    })?;
    if first.text.trim().is_empty() || first.options[0].trim().is_empty() {
        return Err(ServiceError::InvalidState(
            "first question needs text and a first option before the session can start".into(),
        ));
    }

    let doc = LiveSessionEntity {
        name: definition.name,
        seconds_per_question: definition.seconds_per_question,
        leaderboard_max: definition.leaderboard_max,
        state: SessionState::NotStarted,
        question: None,
        scores: IndexMap::new(),
        leaderboard: Vec::new(),
    };
    store.write_live_session(session_id, doc.clone()).await?;

    state.drivers().insert(session_id, SessionDriver::new(session_id));
    sse_events::broadcast_phase_changed(state, session_id, SessionState::NotStarted);
    info!(%session_id, "session initialized");

    Ok(doc.into())
}

/// Open the next question of the session and start its countdown.
pub async fn start_next_question(
    state: &SharedState,
    session_id: Uuid,
) -> Result<LiveSessionView, ServiceError> {
    let store = state.require_session_store().await?;
    let driver = ensure_driver(state, session_id).await?;

    let work_store = store.clone();
    let (doc, next) = driver
        .run_transition(SessionEvent::OpenQuestion, move || async move {
            let mut doc = work_store
                .read_live_session(session_id)
                .await?
                .ok_or_else(|| not_initialized(session_id))?;

            let next_index = doc
                .question
                .as_ref()
                .map(|round| round.index + 1)
                .unwrap_or(0);
            let questions = work_store.questions_for_session(session_id).await?;
            let Some(question) = questions.get(next_index as usize) else {
                return Err(ServiceError::InvalidState(
                    "session has no more questions".into(),
                ));
            };

            let start_time = work_store.server_time_ms().await?;
            doc.state = SessionState::QuestionOpen;
            doc.question = Some(QuestionRound {
                index: next_index,
                id: question.id,
                text: question.text.clone(),
                options: question.options.clone(),
                total_seconds: doc.seconds_per_question,
                start_time: Some(start_time),
                correct_index: None,
                guesses: None,
                total_guesses: None,
            });
            work_store.write_live_session(session_id, doc.clone()).await?;
            Ok(doc)
        })
        .await?;

    sse_events::broadcast_phase_changed(state, session_id, next.into());
    spawn_round_timer(state, &driver, doc.seconds_per_question, 0).await;
    info!(%session_id, index = doc.question.as_ref().map(|q| q.index), "question opened");

    Ok(doc.into())
}

/// Close the open question manually, scoring the round.
///
/// Closing an already closed round is a no-op acknowledgement rather than an
/// error, since the countdown may have fired a moment earlier.
pub async fn close_question(
    state: &SharedState,
    session_id: Uuid,
) -> Result<ActionResponse, ServiceError> {
    let driver = ensure_driver(state, session_id).await?;

    if let Some(timer) = driver.claim_round_timer().await {
        timer.abort();
    }

    match close_round(state, &driver).await {
        Ok(_) => Ok(ActionResponse {
            message: "question closed".into(),
        }),
        Err(ServiceError::InvalidState(message)) => {
            if driver.phase().await == SessionPhase::QuestionClosed {
                Ok(ActionResponse {
                    message: "question already closed".into(),
                })
            } else {
                Err(ServiceError::InvalidState(message))
            }
        }
        Err(err) => Err(err),
    }
}

/// Publish the ranked leaderboard after a closed round.
pub async fn show_leaderboard(
    state: &SharedState,
    session_id: Uuid,
) -> Result<ActionResponse, ServiceError> {
    let driver = ensure_driver(state, session_id).await?;
    set_session_state(
        state,
        &driver,
        SessionEvent::ShowLeaderboard,
        SessionState::Leaderboard,
    )
    .await?;
    Ok(ActionResponse {
        message: "leaderboard displayed".into(),
    })
}

/// Move the session to its terminal state.
pub async fn end_game(
    state: &SharedState,
    session_id: Uuid,
) -> Result<ActionResponse, ServiceError> {
    let driver = ensure_driver(state, session_id).await?;
    set_session_state(state, &driver, SessionEvent::EndGame, SessionState::Ended).await?;
    info!(%session_id, "game ended");
    Ok(ActionResponse {
        message: "game ended".into(),
    })
}

/// Tear a session back down to its definition: stop the countdown, drop the
/// driver, delete the public document and pending answers, and remove every
/// player record bound to the session. Valid from any state; the question
/// bank and the definition survive.
pub async fn reset_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<ActionResponse, ServiceError> {
    let store = state.require_session_store().await?;

    if let Some((_, driver)) = state.drivers().remove(&session_id) {
        if let Some(timer) = driver.claim_round_timer().await {
            timer.abort();
        }
    }

    store.remove_live_session(session_id).await?;
    store.remove_answers_for_session(session_id).await?;

    for player in store.list_players().await? {
        if player.session_id == Some(session_id) {
            store.remove_player(player.id).await?;
        }
    }

    info!(%session_id, "session reset");
    Ok(ActionResponse {
        message: "session reset".into(),
    })
}

/// Fetch the driver for a session, re-attaching to a persisted live document
/// when this process holds no driver yet (e.g. after a restart). Re-attaching
/// to an open round restarts the countdown with the elapsed time carried over.
pub async fn ensure_driver(
    state: &SharedState,
    session_id: Uuid,
) -> Result<Arc<SessionDriver>, ServiceError> {
    if let Some(driver) = state.drivers().get(&session_id) {
        return Ok(driver.value().clone());
    }

    let store = state.require_session_store().await?;
    let doc = store
        .read_live_session(session_id)
        .await?
        .ok_or_else(|| not_initialized(session_id))?;

    let phase = SessionPhase::from(doc.state);
    let driver = state
        .drivers()
        .entry(session_id)
        .or_insert_with(|| SessionDriver::resume(session_id, phase))
        .value()
        .clone();
    info!(%session_id, ?phase, "re-attached driver to live session");

    if phase == SessionPhase::QuestionOpen {
        if let Some(round) = doc.question.as_ref() {
            if let Some(start_time) = round.start_time {
                let now = store.server_time_ms().await?;
                let elapsed_ms = now.saturating_sub(start_time);
                spawn_round_timer(state, &driver, round.total_seconds, elapsed_ms).await;
            }
        }
    }

    Ok(driver)
}

fn not_initialized(session_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("session `{session_id}` is not initialized"))
}

/// Score the open round and reveal its answer. Shared by the manual close
/// path and the countdown task; callers must have claimed the timer slot
/// first.
async fn close_round(
    state: &SharedState,
    driver: &Arc<SessionDriver>,
) -> Result<LiveSessionEntity, ServiceError> {
    let store = state.require_session_store().await?;
    let session_id = driver.session_id();

    let work_store = store.clone();
    let (doc, next) = driver
        .run_transition(SessionEvent::CloseQuestion, move || async move {
            let mut doc = work_store
                .read_live_session(session_id)
                .await?
                .ok_or_else(|| not_initialized(session_id))?;
            let Some(mut round) = doc.question.take() else {
                return Err(ServiceError::InvalidState(
                    "no open question to close".into(),
                ));
            };

            let question = work_store.find_question(round.id).await?.ok_or_else(|| {
                ServiceError::NotFound(format!("question `{}` does not exist", round.id))
            })?;

            let answers = normalize_answers(work_store.answers_for_session(session_id).await?);
            let (guesses, total_guesses) = tally_guesses(&answers);
            apply_round_scores(
                &mut doc.scores,
                &answers,
                question.correct_index,
                round.start_time.unwrap_or(0),
            );

            let directory: HashMap<Uuid, PlayerEntity> = work_store
                .list_players()
                .await?
                .into_iter()
                .map(|player| (player.id, player))
                .collect();
            doc.leaderboard = rank_players(&doc.scores, &directory, doc.leaderboard_max);

            round.correct_index = Some(question.correct_index);
            round.guesses = Some(guesses);
            round.total_guesses = Some(total_guesses);
            doc.question = Some(round);
            doc.state = SessionState::QuestionClosed;

            work_store.write_live_session(session_id, doc.clone()).await?;
            work_store.remove_answers_for_session(session_id).await?;
            Ok(doc)
        })
        .await?;

    sse_events::broadcast_phase_changed(state, session_id, next.into());
    info!(%session_id, "question closed and scored");
    Ok(doc)
}

/// State-only transition used for the leaderboard and end states.
async fn set_session_state(
    state: &SharedState,
    driver: &Arc<SessionDriver>,
    event: SessionEvent,
    target: SessionState,
) -> Result<(), ServiceError> {
    let store = state.require_session_store().await?;
    let session_id = driver.session_id();

    let work_store = store.clone();
    let (_, next) = driver
        .run_transition(event, move || async move {
            let mut doc = work_store
                .read_live_session(session_id)
                .await?
                .ok_or_else(|| not_initialized(session_id))?;
            doc.state = target;
            work_store.write_live_session(session_id, doc).await?;
            Ok(())
        })
        .await?;

    sse_events::broadcast_phase_changed(state, session_id, next.into());
    Ok(())
}

/// Spawn the authoritative countdown for an open round and install it in the
/// driver's timer slot. `elapsed_ms` carries time already spent when
/// re-attaching to a round opened by an earlier process.
async fn spawn_round_timer(
    state: &SharedState,
    driver: &Arc<SessionDriver>,
    total_seconds: u32,
    elapsed_ms: u64,
) {
    let tick = state.config().round_tick();
    let total_ms = u64::from(total_seconds) * 1_000;
    let task_state = state.clone();
    let task_driver = driver.clone();

    let handle = tokio::spawn(async move {
        let started = tokio::time::Instant::now();
        loop {
            tokio::time::sleep(tick).await;
            let elapsed = elapsed_ms + started.elapsed().as_millis() as u64;
            if elapsed > total_ms {
                // A manual close can land between the round opening and this
                // task being installed, leaving a countdown for a round that
                // is already closed. Such a stale countdown drops out here
                // instead of failing the close plan later.
                if task_driver.phase().await != SessionPhase::QuestionOpen {
                    break;
                }
                // Taking the slot decides who closes: a manual close that got
                // here first leaves nothing to claim. This task never aborts
                // itself; it just drops the claimed handle.
                if task_driver.claim_round_timer().await.is_none() {
                    break;
                }
                if let Err(err) = close_round(&task_state, &task_driver).await {
                    warn!(
                        session_id = %task_driver.session_id(),
                        error = %err,
                        "countdown round close failed"
                    );
                }
                break;
            }
        }
    });

    driver.install_round_timer(RoundTimer::new(handle)).await;
}
