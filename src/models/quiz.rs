use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Quiz row. Questions live embedded on the row as a JSONB array; each
/// question carries a stable id assigned when the quiz is created.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quiz {
    pub id: Uuid,
    pub classroom_id: Uuid,
    pub title: String,
    pub questions: sqlx::types::Json<Vec<Question>>,
    pub time_limit_minutes: i32,
    pub is_published: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Quiz as the analytics and listing paths see it: no question bodies, just
/// the denominator needed to turn raw scores into percentages.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizDigest {
    pub id: Uuid,
    pub title: String,
    pub question_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    ShortAnswer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    /// Present for mcq only. The UI posts four options but nothing here
    /// depends on that arity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Index into `options`, mcq only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<i32>,
    /// short_answer only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

/// What a student may answer with: an option index for mcq, raw text for
/// short answers. Not validated against the question type until grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Choice(i32),
    Text(String),
}

impl AnswerValue {
    /// Stringified form stored on the answer row, mirroring what the
    /// submission records regardless of question type.
    pub fn as_stored(&self) -> String {
        match self {
            AnswerValue::Choice(idx) => idx.to_string(),
            AnswerValue::Text(text) => text.clone(),
        }
    }
}
