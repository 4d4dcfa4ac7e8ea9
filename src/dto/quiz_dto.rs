use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::quiz::{Question, QuestionType};

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestionPayload {
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Option<Vec<String>>,
    pub correct_option: Option<i32>,
    pub correct_answer: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub questions: Vec<NewQuestionPayload>,
    #[validate(range(min = 1, max = 600))]
    pub time_limit_minutes: i32,
    pub is_published: Option<bool>,
    pub teacher_id: Uuid,
}

/// A question as shown to a student taking the quiz. Grading keys stay
/// server-side.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Option<Vec<String>>,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text.clone(),
            question_type: q.question_type,
            options: q.options.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StudentQuery {
    pub student_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct TeacherQuery {
    pub teacher_id: Uuid,
}
