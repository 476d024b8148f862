//! Projections of the live session document shared by REST and SSE layers.

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{
        LeaderboardEntryEntity, LiveSessionEntity, PlayerEntity, PlayerProfileEntity,
        PlayerScoreEntity, QuestionRound, SessionState,
    },
    state::scoring::average_answer_seconds,
};

/// Generic action acknowledgement used by driver endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

/// Public projection of a player.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub image: String,
}

impl From<PlayerEntity> for PlayerSummary {
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

impl From<PlayerProfileEntity> for PlayerSummary {
    fn from(value: PlayerProfileEntity) -> Self {
        Self {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            image: value.image,
        }
    }
}

/// Snapshot of the active question as exposed to clients. The correct index
/// and tallies are absent until the round closes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionView {
    pub index: u32,
    pub id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    pub total_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guesses: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_guesses: Option<u32>,
}

impl From<QuestionRound> for QuestionView {
    fn from(value: QuestionRound) -> Self {
        Self {
            index: value.index,
            id: value.id,
            text: value.text,
            options: value.options.to_vec(),
            total_seconds: value.total_seconds,
            start_time: value.start_time,
            correct_index: value.correct_index,
            guesses: value.guesses.map(|slots| slots.to_vec()),
            total_guesses: value.total_guesses,
        }
    }
}

/// Cumulative score of one player, with the derived display average.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreView {
    pub score: u32,
    pub time: u64,
    /// Average response time over correct answers, seconds, one decimal.
    pub average_seconds: f64,
}

impl From<PlayerScoreEntity> for ScoreView {
    fn from(value: PlayerScoreEntity) -> Self {
        Self {
            score: value.score,
            time: value.time,
            average_seconds: average_answer_seconds(value.score, value.time),
        }
    }
}

/// One ranked leaderboard row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntryView {
    pub score: u32,
    pub time: u64,
    pub place: u32,
    /// Average response time over correct answers, seconds, one decimal.
    pub average_seconds: f64,
    pub player: PlayerSummary,
}

impl From<LeaderboardEntryEntity> for LeaderboardEntryView {
    fn from(value: LeaderboardEntryEntity) -> Self {
        Self {
            score: value.score,
            time: value.time,
            place: value.place,
            average_seconds: average_answer_seconds(value.score, value.time),
            player: value.player.into(),
        }
    }
}

/// Full projection of a live session document.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LiveSessionView {
    pub name: String,
    pub seconds_per_question: u32,
    pub leaderboard_max: u32,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    #[schema(value_type = Object)]
    pub scores: IndexMap<Uuid, ScoreView>,
    pub leaderboard: Vec<LeaderboardEntryView>,
}

impl From<LiveSessionEntity> for LiveSessionView {
    fn from(value: LiveSessionEntity) -> Self {
        Self {
            name: value.name,
            seconds_per_question: value.seconds_per_question,
            leaderboard_max: value.leaderboard_max,
            state: value.state,
            question: value.question.map(Into::into),
            scores: value
                .scores
                .into_iter()
                .map(|(player_id, score)| (player_id, score.into()))
                .collect(),
            leaderboard: value.leaderboard.into_iter().map(Into::into).collect(),
        }
    }
}
