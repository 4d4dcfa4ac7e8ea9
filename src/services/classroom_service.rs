use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{is_unique_violation, Error, Result};
use crate::models::classroom::{Classroom, RosterEntry};
use crate::utils::invite_code::generate_invite_code;

const CODE_RETRIES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ClassroomSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub code: String,
    pub student_count: i64,
}

#[derive(Clone)]
pub struct ClassroomService {
    pool: PgPool,
}

impl ClassroomService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a classroom with a fresh invite code, regenerating on the
    /// rare code collision.
    pub async fn create_classroom(
        &self,
        name: String,
        description: Option<String>,
        created_by: Uuid,
    ) -> Result<Classroom> {
        for _ in 0..CODE_RETRIES {
            let code = generate_invite_code();
            let inserted = sqlx::query_as::<_, Classroom>(
                r#"
                INSERT INTO classrooms (name, description, code, created_by)
                VALUES ($1, $2, $3, $4)
                RETURNING id, name, description, code, created_by, created_at
                "#,
            )
            .bind(&name)
            .bind(&description)
            .bind(&code)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await;

            match inserted {
                Ok(classroom) => {
                    tracing::info!(classroom_id = %classroom.id, code = %classroom.code, "Classroom created");
                    return Ok(classroom);
                }
                Err(err) if is_unique_violation(&err) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(Error::Internal(
            "Could not allocate a unique classroom code".to_string(),
        ))
    }

    /// Enrolls a student via invite code. Joining twice is a conflict,
    /// enforced by the UNIQUE constraint on the membership row.
    pub async fn join_by_code(&self, code: &str, student_id: Uuid) -> Result<Classroom> {
        let normalized = code.trim().to_uppercase();
        let classroom = sqlx::query_as::<_, Classroom>(
            r#"SELECT id, name, description, code, created_by, created_at
               FROM classrooms WHERE code = $1"#,
        )
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("No classroom with that code".to_string()))?;

        let joined = sqlx::query(
            "INSERT INTO classroom_students (classroom_id, student_id) VALUES ($1, $2)",
        )
        .bind(classroom.id)
        .bind(student_id)
        .execute(&self.pool)
        .await;

        match joined {
            Ok(_) => {
                tracing::info!(classroom_id = %classroom.id, %student_id, "Student joined classroom");
                Ok(classroom)
            }
            Err(err) if is_unique_violation(&err) => Err(Error::Conflict(
                "You have already joined this classroom".to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_classroom(&self, classroom_id: Uuid) -> Result<Classroom> {
        let classroom = sqlx::query_as::<_, Classroom>(
            r#"SELECT id, name, description, code, created_by, created_at
               FROM classrooms WHERE id = $1"#,
        )
        .bind(classroom_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(classroom)
    }

    /// Classrooms owned by a teacher, each with its enrollment count.
    pub async fn list_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<ClassroomSummary>> {
        let rows: Vec<(Uuid, String, Option<String>, String, i64)> = sqlx::query_as(
            r#"
            SELECT c.id, c.name, c.description, c.code,
                   COUNT(cs.student_id) AS student_count
            FROM classrooms c
            LEFT JOIN classroom_students cs ON cs.classroom_id = c.id
            WHERE c.created_by = $1
            GROUP BY c.id
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, description, code, student_count)| ClassroomSummary {
                id,
                name,
                description,
                code,
                student_count,
            })
            .collect())
    }

    /// Classrooms a student is enrolled in.
    pub async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<Classroom>> {
        let classrooms = sqlx::query_as::<_, Classroom>(
            r#"
            SELECT c.id, c.name, c.description, c.code, c.created_by, c.created_at
            FROM classrooms c
            JOIN classroom_students cs ON cs.classroom_id = c.id
            WHERE cs.student_id = $1
            ORDER BY cs.joined_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(classrooms)
    }

    pub async fn roster(&self, classroom_id: Uuid) -> Result<Vec<RosterEntry>> {
        let roster = sqlx::query_as::<_, RosterEntry>(
            r#"
            SELECT p.id AS student_id, p.full_name, p.email, cs.joined_at
            FROM classroom_students cs
            JOIN profiles p ON p.id = cs.student_id
            WHERE cs.classroom_id = $1
            ORDER BY LOWER(p.full_name)
            "#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roster)
    }
}
