use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::assignment_dto::CreateAssignmentRequest,
    dto::quiz_dto::StudentQuery,
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn create_assignment(
    State(state): State<AppState>,
    Path(classroom_id): Path<Uuid>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let assignment = state
        .assignment_service
        .create_assignment(classroom_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

#[axum::debug_handler]
pub async fn list_assignments(
    State(state): State<AppState>,
    Path(classroom_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let assignments = state
        .assignment_service
        .list_assignments(classroom_id)
        .await?;
    Ok(Json(assignments))
}

#[axum::debug_handler]
pub async fn list_student_assignments(
    State(state): State<AppState>,
    Query(query): Query<StudentQuery>,
) -> Result<impl IntoResponse> {
    let groups = state
        .assignment_service
        .list_for_student(query.student_id)
        .await?;
    Ok(Json(groups))
}
