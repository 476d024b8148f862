//! Per-session driver state: the transition gate, the session state machine,
//! and the authoritative round timer handle.

use std::{sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::state::session_machine::{
    AbortError, ApplyError, Plan, PlanError, PlanId, SessionEvent, SessionMachine, SessionPhase,
    Snapshot,
};

/// Upper bound on the store work performed inside a single transition.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the spawned countdown task of an open round.
///
/// Whoever takes this handle out of the driver's slot owns the round close:
/// the manual path aborts the task, the timer path is the task and simply
/// drops its own handle. Taking the slot happens synchronously before any
/// scoring work, which is what makes round close idempotent.
pub struct RoundTimer {
    handle: JoinHandle<()>,
}

impl RoundTimer {
    /// Wrap the countdown task handle.
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    /// Stop the countdown task. Used by the manual close path.
    pub fn abort(self) {
        self.handle.abort();
    }
}

/// Authoritative driver for one live session.
///
/// A single driver instance per session id exists in the process registry;
/// all lifecycle transitions for that session funnel through its gate, which
/// enforces the single-writer protocol on the public session document.
pub struct SessionDriver {
    session_id: Uuid,
    machine: RwLock<SessionMachine>,
    timer: Mutex<Option<RoundTimer>>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl SessionDriver {
    /// Create a driver for a freshly initialized session.
    pub fn new(session_id: Uuid) -> Arc<Self> {
        Self::with_machine(session_id, SessionMachine::new())
    }

    /// Re-attach a driver to a live session document persisted by an earlier
    /// process, resuming at the document's phase.
    pub fn resume(session_id: Uuid, phase: SessionPhase) -> Arc<Self> {
        Self::with_machine(session_id, SessionMachine::resume(phase))
    }

    fn with_machine(session_id: Uuid, machine: SessionMachine) -> Arc<Self> {
        Arc::new(Self {
            session_id,
            machine: RwLock::new(machine),
            timer: Mutex::new(None),
            transition_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Session this driver is bound to.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Snapshot the current phase.
    pub async fn phase(&self) -> SessionPhase {
        self.machine.read().await.phase()
    }

    /// Snapshot the full state machine state.
    pub async fn snapshot(&self) -> Snapshot {
        self.machine.read().await.snapshot()
    }

    /// Install the countdown timer for a newly opened round, aborting any
    /// stale timer still sitting in the slot.
    pub async fn install_round_timer(&self, timer: RoundTimer) {
        let mut slot = self.timer.lock().await;
        if let Some(stale) = slot.replace(timer) {
            stale.abort();
        }
    }

    /// Take the round timer out of its slot, claiming the right to close the
    /// current round. Returns `None` when another closer already claimed it.
    pub async fn claim_round_timer(&self) -> Option<RoundTimer> {
        self.timer.lock().await.take()
    }

    async fn plan_transition(&self, event: SessionEvent) -> Result<Plan, PlanError> {
        let mut machine = self.machine.write().await;
        machine.plan(event)
    }

    async fn apply_planned_transition(&self, plan_id: PlanId) -> Result<SessionPhase, ApplyError> {
        let mut machine = self.machine.write().await;
        machine.apply(plan_id)
    }

    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut machine = self.machine.write().await;
        machine.abort(plan_id)
    }

    /// Run a lifecycle transition transactionally: plan the phase change,
    /// perform the associated store work, then apply the plan. The work is
    /// bounded by the transition timeout; on failure or timeout the plan is
    /// aborted and the phase left untouched.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: SessionEvent,
        work: F,
    ) -> Result<(T, SessionPhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan { id: plan_id, .. } = self.plan_transition(event).await?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(plan_id).await {
                        warn!(
                            session_id = %self.session_id,
                            event = ?event,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        session_id = %self.session_id,
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transition_applies_after_successful_work() {
        let driver = SessionDriver::new(Uuid::new_v4());
        let (value, next) = driver
            .run_transition(SessionEvent::OpenQuestion, || async { Ok(7u32) })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(next, SessionPhase::QuestionOpen);
        assert_eq!(driver.phase().await, SessionPhase::QuestionOpen);
    }

    #[tokio::test]
    async fn transition_aborts_when_work_fails() {
        let driver = SessionDriver::new(Uuid::new_v4());
        let result = driver
            .run_transition(SessionEvent::OpenQuestion, || async {
                Err::<(), _>(ServiceError::InvalidInput("boom".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(driver.phase().await, SessionPhase::NotStarted);

        // The aborted plan must not block the next attempt.
        let (_, next) = driver
            .run_transition(SessionEvent::OpenQuestion, || async { Ok(()) })
            .await
            .unwrap();
        assert_eq!(next, SessionPhase::QuestionOpen);
    }

    #[tokio::test]
    async fn claiming_the_timer_twice_yields_none() {
        let driver = SessionDriver::new(Uuid::new_v4());
        let handle = tokio::spawn(async {});
        driver.install_round_timer(RoundTimer::new(handle)).await;

        assert!(driver.claim_round_timer().await.is_some());
        assert!(driver.claim_round_timer().await.is_none());
    }
}
