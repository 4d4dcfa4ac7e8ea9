use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaterialRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// One of "document", "video" or "link".
    pub kind: String,
    #[validate(url)]
    pub url: Option<String>,
    pub teacher_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RecordViewRequest {
    pub student_id: Uuid,
}
