use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, Error, Result};
use crate::models::attempt::{NewAnswer, NewAttempt, QuizAttempt};
use crate::models::classroom::RosterEntry;
use crate::models::material::{Material, ViewRecord};
use crate::models::quiz::{Question, Quiz, QuizDigest};
use crate::store::{EngagementStore, QuizStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn fetch_quiz(&self, quiz_id: Uuid) -> Result<Option<Quiz>> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"SELECT id, classroom_id, title, questions, time_limit_minutes,
                      is_published, created_by, created_at
               FROM quizzes WHERE id = $1"#,
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quiz)
    }

    async fn fetch_questions(&self, quiz_id: Uuid) -> Result<Vec<Question>> {
        let questions = sqlx::query_scalar::<_, sqlx::types::Json<Vec<Question>>>(
            r#"SELECT questions FROM quizzes WHERE id = $1"#,
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(questions.map(|json| json.0).unwrap_or_default())
    }

    async fn find_attempt(&self, quiz_id: Uuid, student_id: Uuid) -> Result<Option<QuizAttempt>> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(
            r#"SELECT id, quiz_id, student_id, score, completed_at
               FROM quiz_attempts WHERE quiz_id = $1 AND student_id = $2"#,
        )
        .bind(quiz_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempt)
    }

    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<QuizAttempt> {
        let inserted = sqlx::query_as::<_, QuizAttempt>(
            r#"
            INSERT INTO quiz_attempts (quiz_id, student_id, score, completed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, quiz_id, student_id, score, completed_at
            "#,
        )
        .bind(attempt.quiz_id)
        .bind(attempt.student_id)
        .bind(attempt.score)
        .bind(attempt.completed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Conflict("This quiz has already been attempted".to_string())
            } else {
                e.into()
            }
        })?;
        Ok(inserted)
    }

    async fn insert_answers(&self, attempt_id: Uuid, answers: Vec<NewAnswer>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for answer in &answers {
            sqlx::query(
                r#"INSERT INTO quiz_answers (attempt_id, question_id, answer, is_correct)
                   VALUES ($1, $2, $3, $4)"#,
            )
            .bind(attempt_id)
            .bind(answer.question_id)
            .bind(&answer.answer)
            .bind(answer.is_correct)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_attempt(&self, attempt_id: Uuid) -> Result<()> {
        // Answer rows cascade with the attempt.
        sqlx::query(r#"DELETE FROM quiz_attempts WHERE id = $1"#)
            .bind(attempt_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EngagementStore for PgStore {
    async fn fetch_roster(&self, classroom_id: Uuid) -> Result<Vec<RosterEntry>> {
        let roster = sqlx::query_as::<_, RosterEntry>(
            r#"
            SELECT cs.student_id, p.full_name, p.email, cs.joined_at
            FROM classroom_students cs
            JOIN profiles p ON p.id = cs.student_id
            WHERE cs.classroom_id = $1
            ORDER BY cs.joined_at
            "#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roster)
    }

    async fn fetch_materials(&self, classroom_id: Uuid) -> Result<Vec<Material>> {
        let materials = sqlx::query_as::<_, Material>(
            r#"SELECT id, classroom_id, title, kind, url, created_by, created_at
               FROM materials WHERE classroom_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(materials)
    }

    async fn fetch_material_views(&self, classroom_id: Uuid) -> Result<Vec<ViewRecord>> {
        let views = sqlx::query_as::<_, ViewRecord>(
            r#"SELECT student_id, material_id, classroom_id, viewed_at
               FROM material_views WHERE classroom_id = $1"#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(views)
    }

    async fn fetch_video_views(&self, classroom_id: Uuid) -> Result<Vec<ViewRecord>> {
        let views = sqlx::query_as::<_, ViewRecord>(
            r#"SELECT student_id, material_id, classroom_id, viewed_at
               FROM video_views WHERE classroom_id = $1"#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(views)
    }

    async fn fetch_quizzes(&self, classroom_id: Uuid) -> Result<Vec<QuizDigest>> {
        let quizzes = sqlx::query_as::<_, QuizDigest>(
            r#"SELECT id, title, jsonb_array_length(questions)::int AS question_count
               FROM quizzes WHERE classroom_id = $1"#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(quizzes)
    }

    async fn fetch_attempts_for_quizzes(&self, quiz_ids: Vec<Uuid>) -> Result<Vec<QuizAttempt>> {
        if quiz_ids.is_empty() {
            return Ok(Vec::new());
        }
        let attempts = sqlx::query_as::<_, QuizAttempt>(
            r#"SELECT id, quiz_id, student_id, score, completed_at
               FROM quiz_attempts WHERE quiz_id = ANY($1)"#,
        )
        .bind(&quiz_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(attempts)
    }
}
