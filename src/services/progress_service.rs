use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct ClassroomProgress {
    pub classroom_id: Uuid,
    pub classroom_name: String,
    pub quizzes_taken: i64,
    pub quizzes_pending: i64,
    /// Mean of per-attempt percentages in this classroom, None when the
    /// student has not taken anything yet.
    pub average_percentage: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentProgress {
    pub student_id: Uuid,
    pub classrooms: Vec<ClassroomProgress>,
}

#[derive(Clone)]
pub struct ProgressService {
    pool: PgPool,
}

struct ClassroomRow {
    classroom_id: Uuid,
    classroom_name: String,
}

struct AttemptRow {
    classroom_id: Uuid,
    score: i32,
    question_count: i32,
}

impl ProgressService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One summary line per enrolled classroom. Percentages are derived
    /// from raw scores against the current question count.
    pub async fn student_progress(&self, student_id: Uuid) -> Result<StudentProgress> {
        let classrooms: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT c.id, c.name
            FROM classrooms c
            JOIN classroom_students cs ON cs.classroom_id = c.id
            WHERE cs.student_id = $1
            ORDER BY cs.joined_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        let classrooms: Vec<ClassroomRow> = classrooms
            .into_iter()
            .map(|(classroom_id, classroom_name)| ClassroomRow {
                classroom_id,
                classroom_name,
            })
            .collect();

        let attempts: Vec<(Uuid, i32, i32)> = sqlx::query_as(
            r#"
            SELECT q.classroom_id, a.score, jsonb_array_length(q.questions)::int
            FROM quiz_attempts a
            JOIN quizzes q ON q.id = a.quiz_id
            WHERE a.student_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        let attempts: Vec<AttemptRow> = attempts
            .into_iter()
            .map(|(classroom_id, score, question_count)| AttemptRow {
                classroom_id,
                score,
                question_count,
            })
            .collect();

        let published: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT q.classroom_id, COUNT(*)
            FROM quizzes q
            JOIN classroom_students cs ON cs.classroom_id = q.classroom_id
            WHERE cs.student_id = $1 AND q.is_published = TRUE
            GROUP BY q.classroom_id
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let classrooms = classrooms
            .into_iter()
            .map(|room| {
                let taken: Vec<&AttemptRow> = attempts
                    .iter()
                    .filter(|a| a.classroom_id == room.classroom_id)
                    .collect();
                let quizzes_taken = taken.len() as i64;
                let total_published = published
                    .iter()
                    .find(|(id, _)| *id == room.classroom_id)
                    .map(|(_, count)| *count)
                    .unwrap_or_default();
                let average_percentage = if taken.is_empty() {
                    None
                } else {
                    let sum: f64 = taken
                        .iter()
                        .map(|a| {
                            if a.question_count > 0 {
                                a.score as f64 / a.question_count as f64 * 100.0
                            } else {
                                0.0
                            }
                        })
                        .sum();
                    Some(sum / taken.len() as f64)
                };
                ClassroomProgress {
                    classroom_id: room.classroom_id,
                    classroom_name: room.classroom_name,
                    quizzes_taken,
                    quizzes_pending: (total_published - quizzes_taken).max(0),
                    average_percentage,
                }
            })
            .collect();

        Ok(StudentProgress {
            student_id,
            classrooms,
        })
    }
}
