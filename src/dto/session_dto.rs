use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::session::Direction;
use crate::models::quiz::AnswerValue;

use super::quiz_dto::QuestionView;

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub quiz_id: Uuid,
    pub student_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RecordAnswerRequest {
    pub question_id: Uuid,
    pub answer: AnswerValue,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub direction: Direction,
}

/// Everything the client needs to render the quiz-taking screen.
#[derive(Debug, Serialize)]
pub struct SessionStartedResponse {
    pub session_id: Uuid,
    pub quiz_id: Uuid,
    pub title: String,
    pub time_limit_minutes: i32,
    pub remaining_seconds: u32,
    pub questions: Vec<QuestionView>,
}
