use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Session definition owned by the presenter, stored in the private partition.
///
/// This is the configuration record; the public document players observe is
/// [`LiveSessionEntity`], created when the presenter initializes the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionEntity {
    /// Stable identifier for the session.
    pub id: Uuid,
    /// Display name. Must be non-empty and unique (trimmed, case-insensitive)
    /// for the session to be listed as joinable.
    pub name: String,
    /// Countdown duration applied to every question of the session.
    pub seconds_per_question: u32,
    /// Maximum number of ranked players retained in the published leaderboard.
    pub leaderboard_max: u32,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time this definition was updated.
    pub updated_at: SystemTime,
}

/// Question bank entry, private to the presenter until opened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Owning session.
    pub session_id: Uuid,
    /// Presentation order, unique within the session.
    pub order: u32,
    /// Question text shown to players.
    pub text: String,
    /// Fixed four option slots; an empty string marks an unused slot.
    pub options: [String; 4],
    /// Index of the correct option (0-3).
    pub correct_index: u8,
}

/// Player record stored in the public partition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
    /// Avatar URL, empty when the player has none.
    pub image: String,
    /// Session the player currently belongs to, at most one at a time.
    pub session_id: Option<Uuid>,
}

/// Transient answer record living in the private partition between round open
/// and round close. Fields are optional because a partially written record
/// must still score defensively (answer defaults to 0, time to 0).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntity {
    /// Chosen option index.
    pub answer: Option<u8>,
    /// Store-stamped submission time in milliseconds since the epoch.
    pub time: Option<u64>,
}

/// Lifecycle state of a live session document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
pub enum SessionState {
    /// Document exists but no round has been opened yet.
    #[serde(rename = "NOT_STARTED")]
    NotStarted,
    /// A question is open and players may answer.
    #[serde(rename = "QUESTION_OPEN")]
    QuestionOpen,
    /// The round is closed and the correct answer revealed.
    #[serde(rename = "QUESTION_CLOSED")]
    QuestionClosed,
    /// The ranked leaderboard is on display.
    #[serde(rename = "LEADERBOARD")]
    Leaderboard,
    /// The game is over; no further rounds may open.
    #[serde(rename = "ENDED")]
    Ended,
}

/// Snapshot of the active question embedded in the live session document.
///
/// `start_time` is set when the round opens; `correct_index`, `guesses` and
/// `total_guesses` only appear once the round closes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionRound {
    /// Zero-based position of this question within the session.
    pub index: u32,
    /// Identifier of the question bank entry this round was built from.
    pub id: Uuid,
    /// Question text.
    pub text: String,
    /// The four option slots.
    pub options: [String; 4],
    /// Countdown duration for this round, in seconds.
    pub total_seconds: u32,
    /// Store-stamped round open time in milliseconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    /// Correct option index, revealed at round close.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<u8>,
    /// Per-option answer tally, revealed at round close.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guesses: Option<[u32; 4]>,
    /// Total number of answers received, revealed at round close.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_guesses: Option<u32>,
}

/// Cumulative score record for one player within a session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerScoreEntity {
    /// Number of correct answers across all closed rounds.
    pub score: u32,
    /// Milliseconds accumulated over correct answers only
    /// (answer time minus round start time, summed).
    pub time: u64,
}

/// One ranked row of the published leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntryEntity {
    /// Cumulative score at ranking time.
    pub score: u32,
    /// Cumulative correct-answer time at ranking time.
    pub time: u64,
    /// Competition rank; adjacent entries tied on both score and time share it.
    pub place: u32,
    /// Profile of the ranked player.
    pub player: PlayerProfileEntity,
}

/// Player profile joined into leaderboard rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerProfileEntity {
    /// Stable identifier for the player.
    pub id: Uuid,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
    /// Avatar URL, empty when the player has none.
    pub image: String,
}

impl From<PlayerEntity> for PlayerProfileEntity {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            image: value.image,
        }
    }
}

/// Public session document observed by every player and big screen.
///
/// Written exclusively by the driving presenter; `scores` accumulates across
/// rounds and is never reset except by deleting the whole document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiveSessionEntity {
    /// Display name copied from the session definition at initialization.
    pub name: String,
    /// Countdown duration applied to every question.
    pub seconds_per_question: u32,
    /// Published leaderboard length cap.
    pub leaderboard_max: u32,
    /// Current lifecycle state.
    pub state: SessionState,
    /// Active question snapshot, present while a round is open or closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionRound>,
    /// Cumulative per-player scores, keyed by player id.
    #[serde(default)]
    pub scores: IndexMap<Uuid, PlayerScoreEntity>,
    /// Ranked leaderboard derived from `scores`, recomputed at every round close.
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntryEntity>,
}
