use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const MATERIAL_KIND_DOCUMENT: &str = "document";
pub const MATERIAL_KIND_VIDEO: &str = "video";
pub const MATERIAL_KIND_LINK: &str = "link";

pub const MATERIAL_KINDS: &[&str] = &[
    MATERIAL_KIND_DOCUMENT,
    MATERIAL_KIND_VIDEO,
    MATERIAL_KIND_LINK,
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Material {
    pub id: Uuid,
    pub classroom_id: Uuid,
    pub title: String,
    pub kind: String,
    pub url: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Material {
    pub fn is_video(&self) -> bool {
        self.kind == MATERIAL_KIND_VIDEO
    }
}

/// Engagement event: one row per (student, resource), duplicates dropped at
/// insert time. The aggregator still dedupes on read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ViewRecord {
    pub student_id: Uuid,
    pub material_id: Uuid,
    pub classroom_id: Uuid,
    pub viewed_at: DateTime<Utc>,
}
