use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use sqlx::FromRow;

use crate::dto::quiz_dto::{CreateQuizRequest, NewQuestionPayload};
use crate::error::{Error, Result};
use crate::models::attempt::{QuizAnswer, QuizAttempt};
use crate::models::quiz::{Question, QuestionType, Quiz};

#[derive(Debug, Clone, FromRow)]
struct QuizListingRow {
    id: Uuid,
    title: String,
    time_limit_minutes: i32,
    question_count: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizListItem {
    pub id: Uuid,
    pub title: String,
    pub time_limit_minutes: i32,
    pub question_count: i32,
    /// "pending" until the student has an attempt, then "completed".
    pub status: &'static str,
    pub score: Option<i32>,
    pub percentage: Option<f64>,
}

/// A finished attempt with its per-question record, for the results screen.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptReview {
    pub attempt: QuizAttempt,
    pub total_questions: i32,
    pub percentage: f64,
    pub answers: Vec<QuizAnswer>,
}

#[derive(Clone)]
pub struct QuizService {
    pool: PgPool,
}

impl QuizService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_quiz(
        &self,
        classroom_id: Uuid,
        payload: CreateQuizRequest,
    ) -> Result<Quiz> {
        if payload.questions.is_empty() {
            return Err(Error::BadRequest(
                "A quiz needs at least one question".to_string(),
            ));
        }
        let questions = payload
            .questions
            .iter()
            .map(build_question)
            .collect::<Result<Vec<Question>>>()?;

        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (classroom_id, title, questions, time_limit_minutes, is_published, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, classroom_id, title, questions, time_limit_minutes,
                      is_published, created_by, created_at
            "#,
        )
        .bind(classroom_id)
        .bind(&payload.title)
        .bind(sqlx::types::Json(&questions))
        .bind(payload.time_limit_minutes)
        .bind(payload.is_published.unwrap_or(true))
        .bind(payload.teacher_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(quiz_id = %quiz.id, %classroom_id, "Quiz created");
        Ok(quiz)
    }

    pub async fn get_quiz(&self, quiz_id: Uuid) -> Result<Quiz> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"SELECT id, classroom_id, title, questions, time_limit_minutes,
                      is_published, created_by, created_at
               FROM quizzes WHERE id = $1"#,
        )
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(quiz)
    }

    pub async fn attempt_review(&self, quiz_id: Uuid, student_id: Uuid) -> Result<AttemptReview> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(
            r#"SELECT id, quiz_id, student_id, score, completed_at
               FROM quiz_attempts WHERE quiz_id = $1 AND student_id = $2"#,
        )
        .bind(quiz_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("No attempt for this quiz".to_string()))?;

        let answers = sqlx::query_as::<_, QuizAnswer>(
            r#"SELECT id, attempt_id, question_id, answer, is_correct
               FROM quiz_answers WHERE attempt_id = $1"#,
        )
        .bind(attempt.id)
        .fetch_all(&self.pool)
        .await?;

        let total_questions: i32 =
            sqlx::query_scalar("SELECT jsonb_array_length(questions)::int FROM quizzes WHERE id = $1")
                .bind(quiz_id)
                .fetch_one(&self.pool)
                .await?;
        let percentage = if total_questions > 0 {
            attempt.score as f64 / total_questions as f64 * 100.0
        } else {
            0.0
        };
        Ok(AttemptReview {
            attempt,
            total_questions,
            percentage,
            answers,
        })
    }

    /// The published quizzes of a classroom from one student's perspective,
    /// each classified against that student's attempt (if any). Percentage
    /// is derived from the raw score here, never read back from storage.
    pub async fn list_for_student(
        &self,
        classroom_id: Uuid,
        student_id: Uuid,
    ) -> Result<Vec<QuizListItem>> {
        let rows = sqlx::query_as::<_, QuizListingRow>(
            r#"SELECT id, title, time_limit_minutes,
                      jsonb_array_length(questions)::int AS question_count
               FROM quizzes
               WHERE classroom_id = $1 AND is_published = TRUE
               ORDER BY created_at DESC"#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;

        let attempts: Vec<(Uuid, i32)> = sqlx::query_as(
            r#"SELECT a.quiz_id, a.score
               FROM quiz_attempts a
               JOIN quizzes q ON q.id = a.quiz_id
               WHERE q.classroom_id = $1 AND a.student_id = $2"#,
        )
        .bind(classroom_id)
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(classify_quizzes(rows, &attempts))
    }
}

/// Pair each listed quiz with the student's attempt (if any) and derive the
/// completion status and percentage from it.
fn classify_quizzes(rows: Vec<QuizListingRow>, attempts: &[(Uuid, i32)]) -> Vec<QuizListItem> {
    rows.into_iter()
        .map(|row| {
            let attempt = attempts.iter().find(|(quiz_id, _)| *quiz_id == row.id);
            let (status, score, percentage) = match attempt {
                Some((_, score)) => {
                    let pct = if row.question_count > 0 {
                        *score as f64 / row.question_count as f64 * 100.0
                    } else {
                        0.0
                    };
                    ("completed", Some(*score), Some(pct))
                }
                None => ("pending", None, None),
            };
            QuizListItem {
                id: row.id,
                title: row.title,
                time_limit_minutes: row.time_limit_minutes,
                question_count: row.question_count,
                status,
                score,
                percentage,
            }
        })
        .collect()
}

/// Shape-check one authored question and assign its stable id.
fn build_question(payload: &NewQuestionPayload) -> Result<Question> {
    if payload.question_text.trim().is_empty() {
        return Err(Error::BadRequest("Question text cannot be empty".to_string()));
    }
    match payload.question_type {
        QuestionType::Mcq => {
            let options = payload
                .options
                .as_ref()
                .filter(|opts| opts.len() >= 2)
                .ok_or_else(|| {
                    Error::BadRequest(
                        "Multiple choice questions need at least two options".to_string(),
                    )
                })?;
            let correct = payload.correct_option.ok_or_else(|| {
                Error::BadRequest("Multiple choice questions need a correct option".to_string())
            })?;
            if correct < 0 || correct as usize >= options.len() {
                return Err(Error::BadRequest(
                    "Correct option must index into the options".to_string(),
                ));
            }
        }
        QuestionType::ShortAnswer => {
            let valid = payload
                .correct_answer
                .as_deref()
                .is_some_and(|a| !a.trim().is_empty());
            if !valid {
                return Err(Error::BadRequest(
                    "Short answer questions need a non-empty correct answer".to_string(),
                ));
            }
        }
    }
    Ok(Question {
        id: Uuid::new_v4(),
        question_text: payload.question_text.clone(),
        question_type: payload.question_type,
        options: payload.options.clone(),
        correct_option: payload.correct_option,
        correct_answer: payload.correct_answer.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq_payload(correct: i32, options: usize) -> NewQuestionPayload {
        NewQuestionPayload {
            question_text: "pick".into(),
            question_type: QuestionType::Mcq,
            options: Some((0..options).map(|i| format!("opt {}", i)).collect()),
            correct_option: Some(correct),
            correct_answer: None,
        }
    }

    #[test]
    fn mcq_requires_index_in_range() {
        assert!(build_question(&mcq_payload(3, 4)).is_ok());
        assert!(build_question(&mcq_payload(4, 4)).is_err());
        assert!(build_question(&mcq_payload(-1, 4)).is_err());
    }

    #[test]
    fn mcq_requires_options() {
        let mut payload = mcq_payload(0, 4);
        payload.options = None;
        assert!(build_question(&payload).is_err());
    }

    #[test]
    fn short_answer_requires_non_blank_key() {
        let payload = NewQuestionPayload {
            question_text: "capital of France".into(),
            question_type: QuestionType::ShortAnswer,
            options: None,
            correct_option: None,
            correct_answer: Some("  ".into()),
        };
        assert!(build_question(&payload).is_err());
    }

    #[test]
    fn questions_get_distinct_ids() {
        let a = build_question(&mcq_payload(0, 4)).unwrap();
        let b = build_question(&mcq_payload(0, 4)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn listing_classifies_against_attempts_and_derives_percentage() {
        let taken = QuizListingRow {
            id: Uuid::new_v4(),
            title: "taken".into(),
            time_limit_minutes: 15,
            question_count: 4,
        };
        let open = QuizListingRow {
            id: Uuid::new_v4(),
            title: "open".into(),
            time_limit_minutes: 10,
            question_count: 2,
        };
        let attempts = vec![(taken.id, 3)];

        let items = classify_quizzes(vec![taken.clone(), open], &attempts);
        assert_eq!(items[0].status, "completed");
        assert_eq!(items[0].score, Some(3));
        assert_eq!(items[0].time_limit_minutes, 15);
        assert!((items[0].percentage.unwrap() - 75.0).abs() < f64::EPSILON);
        assert_eq!(items[1].status, "pending");
        assert_eq!(items[1].score, None);
        assert_eq!(items[1].percentage, None);
    }
}
