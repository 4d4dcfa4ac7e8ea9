use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Classroom {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Invite code students join with, e.g. "X7K2PQ".
    pub code: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// An enrolled student as the analytics and roster queries see them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RosterEntry {
    pub student_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub joined_at: DateTime<Utc>,
}
