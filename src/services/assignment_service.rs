use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::assignment_dto::CreateAssignmentRequest;
use crate::error::Result;
use crate::models::assignment::Assignment;

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentView {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub overdue: bool,
}

/// A student's assignments for one enrolled classroom, due soonest first.
#[derive(Debug, Clone, Serialize)]
pub struct ClassroomAssignments {
    pub classroom_id: Uuid,
    pub classroom_name: String,
    pub assignments: Vec<AssignmentView>,
}

#[derive(Clone)]
pub struct AssignmentService {
    pool: PgPool,
}

impl AssignmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_assignment(
        &self,
        classroom_id: Uuid,
        payload: CreateAssignmentRequest,
    ) -> Result<Assignment> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            INSERT INTO assignments (classroom_id, title, content, due_date, file_url, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, classroom_id, title, content, due_date, file_url,
                      created_by, created_at
            "#,
        )
        .bind(classroom_id)
        .bind(&payload.title)
        .bind(&payload.content)
        .bind(payload.due_date)
        .bind(&payload.file_url)
        .bind(payload.teacher_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(assignment_id = %assignment.id, %classroom_id, "Assignment posted");
        Ok(assignment)
    }

    pub async fn list_assignments(&self, classroom_id: Uuid) -> Result<Vec<Assignment>> {
        let assignments = sqlx::query_as::<_, Assignment>(
            r#"SELECT id, classroom_id, title, content, due_date, file_url,
                      created_by, created_at
               FROM assignments
               WHERE classroom_id = $1
               ORDER BY due_date ASC NULLS LAST, created_at DESC"#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(assignments)
    }

    /// Assignments across every classroom the student is enrolled in,
    /// grouped per classroom.
    pub async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<ClassroomAssignments>> {
        let classrooms: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT c.id, c.name
            FROM classrooms c
            JOIN classroom_students cs ON cs.classroom_id = c.id
            WHERE cs.student_id = $1
            ORDER BY c.name
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let assignments = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT a.id, a.classroom_id, a.title, a.content, a.due_date,
                   a.file_url, a.created_by, a.created_at
            FROM assignments a
            JOIN classroom_students cs ON cs.classroom_id = a.classroom_id
            WHERE cs.student_id = $1
            ORDER BY a.due_date ASC NULLS LAST, a.created_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_by_classroom(&classrooms, assignments))
    }
}

/// Fold the flat assignment list into per-classroom groups, flagging
/// overdue entries against the current clock. Classrooms with nothing
/// posted are omitted.
fn group_by_classroom(
    classrooms: &[(Uuid, String)],
    assignments: Vec<Assignment>,
) -> Vec<ClassroomAssignments> {
    let now = Utc::now();
    classrooms
        .iter()
        .filter_map(|(classroom_id, name)| {
            let own: Vec<AssignmentView> = assignments
                .iter()
                .filter(|a| a.classroom_id == *classroom_id)
                .map(|a| AssignmentView {
                    overdue: a.is_overdue(now),
                    assignment: a.clone(),
                })
                .collect();
            if own.is_empty() {
                None
            } else {
                Some(ClassroomAssignments {
                    classroom_id: *classroom_id,
                    classroom_name: name.clone(),
                    assignments: own,
                })
            }
        })
        .collect()
}
