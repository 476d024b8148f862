use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::SessionState;

/// Lifecycle phases of a driven session, matching the `state` field of the
/// public session document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Session document exists, no round opened yet.
    NotStarted,
    /// A question is open; players may answer.
    QuestionOpen,
    /// The round is closed; answers revealed and scored.
    QuestionClosed,
    /// The ranked leaderboard is on display.
    Leaderboard,
    /// Terminal phase; no further rounds may open.
    Ended,
}

impl From<SessionState> for SessionPhase {
    fn from(value: SessionState) -> Self {
        match value {
            SessionState::NotStarted => SessionPhase::NotStarted,
            SessionState::QuestionOpen => SessionPhase::QuestionOpen,
            SessionState::QuestionClosed => SessionPhase::QuestionClosed,
            SessionState::Leaderboard => SessionPhase::Leaderboard,
            SessionState::Ended => SessionPhase::Ended,
        }
    }
}

impl From<SessionPhase> for SessionState {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::NotStarted => SessionState::NotStarted,
            SessionPhase::QuestionOpen => SessionState::QuestionOpen,
            SessionPhase::QuestionClosed => SessionState::QuestionClosed,
            SessionPhase::Leaderboard => SessionState::Leaderboard,
            SessionPhase::Ended => SessionState::Ended,
        }
    }
}

/// Events that can be applied to the session state machine. Session reset is
/// deliberately not an event: it destroys the machine rather than moving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Open the next question (the first one from `NotStarted`).
    OpenQuestion,
    /// Close the open question, scoring the round.
    CloseQuestion,
    /// Move from the closed round to the leaderboard view.
    ShowLeaderboard,
    /// End the game from a closed round or the leaderboard.
    EndGame,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: SessionPhase,
    /// The event that cannot be applied from this phase.
    pub event: SessionEvent,
}

/// Errors that can occur when planning a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// State machine phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when plan was created.
        expected: SessionPhase,
        /// Current phase.
        actual: SessionPhase,
    },
    /// State machine version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A planned state machine transition that has been validated but not yet applied.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the state machine is currently in.
    pub from: SessionPhase,
    /// Phase the state machine will transition to.
    pub to: SessionPhase,
    /// Event that triggered this transition.
    pub event: SessionEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: SessionPhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
    /// Pending transition phase, if a transition is planned but not yet applied.
    pub pending: Option<SessionPhase>,
}

/// Strict linear session lifecycle with one branch point: a closed round may
/// advance to the next question, to the leaderboard, or end the game. The
/// only way backward is destroying the machine via session reset.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    phase: SessionPhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self {
            phase: SessionPhase::NotStarted,
            version: 0,
            pending: None,
        }
    }
}

impl SessionMachine {
    /// Create a new state machine in the `NotStarted` phase, as written by
    /// session initialization.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a machine from a persisted live session document, used when a
    /// driver re-attaches to a session it did not initialize in this process.
    pub fn resume(phase: SessionPhase) -> Self {
        Self {
            phase,
            version: 0,
            pending: None,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Plan a transition by validating that the event can be applied from the current phase.
    /// Returns a Plan that can later be applied or aborted.
    pub fn plan(&mut self, event: SessionEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the state machine to the next phase.
    /// Returns the new phase after the transition.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<SessionPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;
        self.pending = None;

        Ok(self.phase)
    }

    /// Abort a planned transition without applying it, returning the state machine to its previous state.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: SessionEvent) -> Result<SessionPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (SessionPhase::NotStarted, SessionEvent::OpenQuestion) => SessionPhase::QuestionOpen,
            (SessionPhase::QuestionOpen, SessionEvent::CloseQuestion) => {
                SessionPhase::QuestionClosed
            }
            (SessionPhase::QuestionClosed, SessionEvent::OpenQuestion) => {
                SessionPhase::QuestionOpen
            }
            (SessionPhase::QuestionClosed, SessionEvent::ShowLeaderboard) => {
                SessionPhase::Leaderboard
            }
            (SessionPhase::QuestionClosed, SessionEvent::EndGame) => SessionPhase::Ended,
            (SessionPhase::Leaderboard, SessionEvent::EndGame) => SessionPhase::Ended,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut SessionMachine, event: SessionEvent) -> SessionPhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    #[test]
    fn initial_state_is_not_started() {
        let sm = SessionMachine::new();
        assert_eq!(sm.phase(), SessionPhase::NotStarted);
    }

    #[test]
    fn full_round_loop_to_leaderboard_and_end() {
        let mut sm = SessionMachine::new();

        assert_eq!(
            apply(&mut sm, SessionEvent::OpenQuestion),
            SessionPhase::QuestionOpen
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::CloseQuestion),
            SessionPhase::QuestionClosed
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::OpenQuestion),
            SessionPhase::QuestionOpen
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::CloseQuestion),
            SessionPhase::QuestionClosed
        );
        assert_eq!(
            apply(&mut sm, SessionEvent::ShowLeaderboard),
            SessionPhase::Leaderboard
        );
        assert_eq!(apply(&mut sm, SessionEvent::EndGame), SessionPhase::Ended);
    }

    #[test]
    fn end_straight_from_closed_round() {
        let mut sm = SessionMachine::new();
        apply(&mut sm, SessionEvent::OpenQuestion);
        apply(&mut sm, SessionEvent::CloseQuestion);
        assert_eq!(apply(&mut sm, SessionEvent::EndGame), SessionPhase::Ended);
    }

    #[test]
    fn not_started_only_advances_to_open() {
        let mut sm = SessionMachine::new();
        for event in [
            SessionEvent::CloseQuestion,
            SessionEvent::ShowLeaderboard,
            SessionEvent::EndGame,
        ] {
            let err = sm.plan(event).unwrap_err();
            match err {
                PlanError::InvalidTransition(invalid) => {
                    assert_eq!(invalid.from, SessionPhase::NotStarted);
                    assert_eq!(invalid.event, event);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(
            apply(&mut sm, SessionEvent::OpenQuestion),
            SessionPhase::QuestionOpen
        );
    }

    #[test]
    fn ended_is_terminal() {
        let mut sm = SessionMachine::new();
        apply(&mut sm, SessionEvent::OpenQuestion);
        apply(&mut sm, SessionEvent::CloseQuestion);
        apply(&mut sm, SessionEvent::EndGame);

        for event in [
            SessionEvent::OpenQuestion,
            SessionEvent::CloseQuestion,
            SessionEvent::ShowLeaderboard,
            SessionEvent::EndGame,
        ] {
            assert!(sm.plan(event).is_err());
        }
    }

    #[test]
    fn leaderboard_cannot_reopen_questions() {
        let mut sm = SessionMachine::new();
        apply(&mut sm, SessionEvent::OpenQuestion);
        apply(&mut sm, SessionEvent::CloseQuestion);
        apply(&mut sm, SessionEvent::ShowLeaderboard);

        assert!(sm.plan(SessionEvent::OpenQuestion).is_err());
        assert_eq!(apply(&mut sm, SessionEvent::EndGame), SessionPhase::Ended);
    }

    #[test]
    fn resume_starts_at_persisted_phase() {
        let mut sm = SessionMachine::resume(SessionPhase::QuestionOpen);
        assert_eq!(sm.phase(), SessionPhase::QuestionOpen);
        assert_eq!(
            apply(&mut sm, SessionEvent::CloseQuestion),
            SessionPhase::QuestionClosed
        );
    }

    #[test]
    fn plan_while_pending_is_rejected() {
        let mut sm = SessionMachine::new();
        let _plan = sm.plan(SessionEvent::OpenQuestion).unwrap();
        assert_eq!(
            sm.plan(SessionEvent::OpenQuestion).unwrap_err(),
            PlanError::AlreadyPending
        );
    }

    #[test]
    fn abort_clears_pending() {
        let mut sm = SessionMachine::new();
        let plan = sm.plan(SessionEvent::OpenQuestion).unwrap();
        sm.abort(plan.id).unwrap();
        assert!(sm.pending.is_none());
        assert_eq!(sm.phase(), SessionPhase::NotStarted);
    }

    #[test]
    fn apply_with_wrong_plan_id_keeps_pending() {
        let mut sm = SessionMachine::new();
        let plan = sm.plan(SessionEvent::OpenQuestion).unwrap();
        let err = sm.apply(Uuid::new_v4()).unwrap_err();
        match err {
            ApplyError::IdMismatch { expected, .. } => assert_eq!(expected, plan.id),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(sm.pending.is_some());
    }
}
