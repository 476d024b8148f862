//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{QuestionEntity, SessionEntity},
    dto::{
        format_system_time,
        validation::{validate_correct_index, validate_options},
    },
};

/// Payload creating a new session definition. Every field is optional; a
/// definition starts unnamed and tuned with the configured defaults, like a
/// freshly pushed record.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub seconds_per_question: Option<u32>,
}

/// Partial update of a session definition.
///
/// `leaderboard_max` is accepted as any integer and coerced into [1, 1000]
/// with a fallback rather than rejected, favoring availability over strict
/// validation.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSessionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub seconds_per_question: Option<u32>,
    #[serde(default)]
    pub leaderboard_max: Option<i64>,
}

/// Admin projection of a session definition.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    pub id: Uuid,
    pub name: String,
    pub seconds_per_question: u32,
    pub leaderboard_max: u32,
    /// Whether the trimmed name is non-empty and unique among definitions.
    pub displayable: bool,
    /// Whether a live document currently exists for this session.
    pub initialized: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl SessionSummary {
    /// Build the projection, with the displayable/initialized flags computed
    /// by the service layer.
    pub fn from_entity(entity: SessionEntity, displayable: bool, initialized: bool) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            seconds_per_question: entity.seconds_per_question,
            leaderboard_max: entity.leaderboard_max,
            displayable,
            initialized,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// Payload creating or replacing a question bank entry.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuestionInput {
    pub text: String,
    /// Exactly four option slots; empty string marks an unused slot.
    pub options: Vec<String>,
    pub correct_index: u8,
    /// Presentation order; appended after the current last question when omitted.
    #[serde(default)]
    pub order: Option<u32>,
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.text.trim().is_empty() {
            let mut err = validator::ValidationError::new("text_empty");
            err.message = Some("question text must not be empty".into());
            errors.add("text", err);
        }

        if let Err(err) = validate_options(&self.options) {
            errors.add("options", err);
        }

        if let Err(err) = validate_correct_index(self.correct_index) {
            errors.add("correct_index", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Admin projection of a question bank entry, including the correct index.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionSummary {
    pub id: Uuid,
    pub session_id: Uuid,
    pub order: u32,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: u8,
}

impl From<QuestionEntity> for QuestionSummary {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            session_id: value.session_id,
            order: value.order,
            text: value.text,
            options: value.options.to_vec(),
            correct_index: value.correct_index,
        }
    }
}

/// New question order, listing every question id of the session.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderQuestionsRequest {
    pub question_ids: Vec<Uuid>,
}
