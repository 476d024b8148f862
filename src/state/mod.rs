pub mod driver;
pub mod leaderboard;
pub mod scoring;
pub mod session_machine;
mod sse;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use uuid::Uuid;

use crate::{config::AppConfig, dao::session_store::SessionStore, error::ServiceError};

pub use self::driver::SessionDriver;
pub use self::session_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
pub use self::sse::EventHub;
use self::sse::SseState;

/// Cheaply cloneable handle on the shared application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the store slot, SSE hubs, and the registry of
/// active session drivers.
pub struct AppState {
    config: AppConfig,
    session_store: RwLock<Option<Arc<dyn SessionStore>>>,
    sse: SseState,
    drivers: DashMap<Uuid, Arc<SessionDriver>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            session_store: RwLock::new(None),
            sse: SseState::new(16, 16),
            drivers: DashMap::new(),
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current session store, if one is installed.
    pub async fn session_store(&self) -> Option<Arc<dyn SessionStore>> {
        let guard = self.session_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the session store or fail with a degraded-mode error.
    pub async fn require_session_store(&self) -> Result<Arc<dyn SessionStore>, ServiceError> {
        self.session_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new session store implementation and leave degraded mode.
    pub async fn install_session_store(&self, store: Arc<dyn SessionStore>) {
        {
            let mut guard = self.session_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current session store and enter degraded mode.
    pub async fn clear_session_store(&self) {
        {
            let mut guard = self.session_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        if *self.degraded.borrow() == value {
            return;
        }

        let _ = self.degraded.send(value);
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &EventHub {
        self.sse.audience()
    }

    /// Broadcast hub used for the admin SSE stream.
    pub fn admin_sse(&self) -> &EventHub {
        self.sse.presenter().hub()
    }

    /// Token guard that ensures a single admin SSE subscriber at a time.
    pub fn admin_token(&self) -> &Mutex<Option<String>> {
        self.sse.presenter().token()
    }

    /// Registry of active session drivers keyed by session id.
    pub fn drivers(&self) -> &DashMap<Uuid, Arc<SessionDriver>> {
        &self.drivers
    }
}
