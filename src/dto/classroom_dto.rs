use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassroomRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub teacher_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct JoinClassroomRequest {
    #[validate(length(min = 4, max = 12))]
    pub code: String,
    pub student_id: Uuid,
}
