pub mod memory;

use futures::future::BoxFuture;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dao::models::{
    AnswerEntity, LiveSessionEntity, PlayerEntity, QuestionEntity, SessionEntity,
};
use crate::dao::storage::StorageResult;

/// Change notification emitted whenever a live session document is written or
/// removed. Mirrors the value-level subscription clients hold on the public
/// partition.
#[derive(Debug, Clone)]
pub enum LiveSessionChange {
    /// The document was created or fully replaced.
    Written {
        /// Session whose document changed.
        id: Uuid,
        /// The new document value.
        doc: LiveSessionEntity,
    },
    /// The document was deleted.
    Removed {
        /// Session whose document was removed.
        id: Uuid,
    },
}

/// Child-level change notification for the player collection.
#[derive(Debug, Clone)]
pub enum PlayerChange {
    /// A new player record appeared.
    Added(PlayerEntity),
    /// An existing player record was rewritten.
    Changed(PlayerEntity),
    /// A player record was deleted.
    Removed {
        /// Identifier of the removed player.
        id: Uuid,
    },
}

/// Abstraction over the realtime store backing sessions, questions, players
/// and answer records.
///
/// The store is split into a public partition (live session documents, player
/// records) and a private one (definitions, question bank, raw answers).
/// Writes to the public partition fan out through the watch channels so SSE
/// subscribers observe every change. `save_answer` stamps the record with the
/// store's own clock so scoring never trusts client time.
pub trait SessionStore: Send + Sync {
    /// Persist a session definition (create or replace).
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a session definition by id.
    fn find_session(&self, id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// List every session definition.
    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>>;
    /// Delete a session definition. Returns whether it existed.
    fn remove_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Persist a question bank entry (create or replace).
    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a question bank entry by id.
    fn find_question(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    /// Question bank for a session, sorted by `order` ascending.
    fn questions_for_session(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    /// Delete a question bank entry. Returns whether it existed.
    fn remove_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Create or fully replace the public document of a session.
    fn write_live_session(
        &self,
        id: Uuid,
        doc: LiveSessionEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch the public document of a session, if the session is initialized.
    fn read_live_session(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<LiveSessionEntity>>>;
    /// Delete the public document of a session. Returns whether it existed.
    fn remove_live_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// All live session documents keyed by session id.
    fn list_live_sessions(
        &self,
    ) -> BoxFuture<'static, StorageResult<Vec<(Uuid, LiveSessionEntity)>>>;

    /// Persist a player record (create or replace).
    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a player record by id.
    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// List every player record.
    fn list_players(&self) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    /// Delete a player record. Returns whether it existed.
    fn remove_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Write a player's answer for the given session, stamping the record
    /// with the store clock. Overwrites any earlier answer for the round.
    fn save_answer(
        &self,
        player_id: Uuid,
        session_id: Uuid,
        answer: u8,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// All pending answer records for a session, keyed by player id.
    fn answers_for_session(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<(Uuid, AnswerEntity)>>>;
    /// Delete every pending answer record for a session.
    fn remove_answers_for_session(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Current store clock in milliseconds since the epoch.
    fn server_time_ms(&self) -> BoxFuture<'static, StorageResult<u64>>;

    /// Subscribe to live session document changes.
    fn watch_live_sessions(&self) -> broadcast::Receiver<LiveSessionChange>;
    /// Subscribe to player record changes.
    fn watch_players(&self) -> broadcast::Receiver<PlayerChange>;

    /// Probe backend connectivity.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a lost backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
