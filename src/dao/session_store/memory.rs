//! In-process store backend used for development, tests, and single-node
//! deployments. Implements the same change fan-out a networked backend would
//! provide through its subscription API.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use futures::future::BoxFuture;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::dao::{
    models::{AnswerEntity, LiveSessionEntity, PlayerEntity, QuestionEntity, SessionEntity},
    session_store::{LiveSessionChange, PlayerChange, SessionStore},
    storage::{StorageError, StorageResult},
};

const EVENT_CAPACITY: usize = 32;

/// Memory-backed [`SessionStore`] with broadcast change feeds.
pub struct MemorySessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    sessions: RwLock<HashMap<Uuid, SessionEntity>>,
    questions: RwLock<HashMap<Uuid, QuestionEntity>>,
    live: RwLock<HashMap<Uuid, LiveSessionEntity>>,
    players: RwLock<HashMap<Uuid, PlayerEntity>>,
    // Keyed by (player id, session id), mirroring the per-player answer paths.
    answers: RwLock<HashMap<(Uuid, Uuid), AnswerEntity>>,
    live_events: broadcast::Sender<LiveSessionChange>,
    player_events: broadcast::Sender<PlayerChange>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (live_events, _) = broadcast::channel(EVENT_CAPACITY);
        let (player_events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                sessions: RwLock::new(HashMap::new()),
                questions: RwLock::new(HashMap::new()),
                live: RwLock::new(HashMap::new()),
                players: RwLock::new(HashMap::new()),
                answers: RwLock::new(HashMap::new()),
                live_events,
                player_events,
            }),
        }
    }

    /// Connection entry point matching the supervisor's connect contract.
    /// Never fails for the in-memory backend.
    pub async fn connect() -> Result<Arc<dyn SessionStore>, StorageError> {
        Ok(Arc::new(Self::new()))
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

impl SessionStore for MemorySessionStore {
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.sessions.write().await.insert(session.id, session);
            Ok(())
        })
    }

    fn find_session(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.sessions.read().await.get(&id).cloned()) })
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut sessions: Vec<_> = inner.sessions.read().await.values().cloned().collect();
            sessions.sort_by_key(|session| session.created_at);
            Ok(sessions)
        })
    }

    fn remove_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.sessions.write().await.remove(&id).is_some()) })
    }

    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.questions.write().await.insert(question.id, question);
            Ok(())
        })
    }

    fn find_question(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.questions.read().await.get(&id).cloned()) })
    }

    fn questions_for_session(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut questions: Vec<_> = inner
                .questions
                .read()
                .await
                .values()
                .filter(|question| question.session_id == session_id)
                .cloned()
                .collect();
            questions.sort_by_key(|question| question.order);
            Ok(questions)
        })
    }

    fn remove_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.questions.write().await.remove(&id).is_some()) })
    }

    fn write_live_session(
        &self,
        id: Uuid,
        doc: LiveSessionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.live.write().await.insert(id, doc.clone());
            let _ = inner.live_events.send(LiveSessionChange::Written { id, doc });
            Ok(())
        })
    }

    fn read_live_session(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<LiveSessionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.live.read().await.get(&id).cloned()) })
    }

    fn remove_live_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let removed = inner.live.write().await.remove(&id).is_some();
            if removed {
                let _ = inner.live_events.send(LiveSessionChange::Removed { id });
            }
            Ok(removed)
        })
    }

    fn list_live_sessions(
        &self,
    ) -> BoxFuture<'static, StorageResult<Vec<(Uuid, LiveSessionEntity)>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .live
                .read()
                .await
                .iter()
                .map(|(id, doc)| (*id, doc.clone()))
                .collect())
        })
    }

    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let previous = inner
                .players
                .write()
                .await
                .insert(player.id, player.clone());
            let change = if previous.is_some() {
                PlayerChange::Changed(player)
            } else {
                PlayerChange::Added(player)
            };
            let _ = inner.player_events.send(change);
            Ok(())
        })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.players.read().await.get(&id).cloned()) })
    }

    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.players.read().await.values().cloned().collect()) })
    }

    fn remove_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let removed = inner.players.write().await.remove(&id).is_some();
            if removed {
                let _ = inner.player_events.send(PlayerChange::Removed { id });
            }
            Ok(removed)
        })
    }

    fn save_answer(
        &self,
        player_id: Uuid,
        session_id: Uuid,
        answer: u8,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let record = AnswerEntity {
                answer: Some(answer),
                time: Some(now_ms()),
            };
            inner
                .answers
                .write()
                .await
                .insert((player_id, session_id), record);
            Ok(())
        })
    }

    fn answers_for_session(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<(Uuid, AnswerEntity)>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .answers
                .read()
                .await
                .iter()
                .filter(|((_, owner), _)| *owner == session_id)
                .map(|((player_id, _), record)| (*player_id, record.clone()))
                .collect())
        })
    }

    fn remove_answers_for_session(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner
                .answers
                .write()
                .await
                .retain(|(_, owner), _| *owner != session_id);
            Ok(())
        })
    }

    fn server_time_ms(&self) -> BoxFuture<'static, StorageResult<u64>> {
        Box::pin(async move { Ok(now_ms()) })
    }

    fn watch_live_sessions(&self) -> broadcast::Receiver<LiveSessionChange> {
        self.inner.live_events.subscribe()
    }

    fn watch_players(&self) -> broadcast::Receiver<PlayerChange> {
        self.inner.player_events.subscribe()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }
}
