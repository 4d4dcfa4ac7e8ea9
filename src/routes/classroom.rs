use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::classroom_dto::{CreateClassroomRequest, JoinClassroomRequest},
    dto::quiz_dto::{StudentQuery, TeacherQuery},
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn create_classroom(
    State(state): State<AppState>,
    Json(payload): Json<CreateClassroomRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let classroom = state
        .classroom_service
        .create_classroom(payload.name, payload.description, payload.teacher_id)
        .await?;
    Ok((StatusCode::CREATED, Json(classroom)))
}

#[axum::debug_handler]
pub async fn join_classroom(
    State(state): State<AppState>,
    Json(payload): Json<JoinClassroomRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let classroom = state
        .classroom_service
        .join_by_code(&payload.code, payload.student_id)
        .await?;
    Ok((StatusCode::CREATED, Json(classroom)))
}

#[axum::debug_handler]
pub async fn get_classroom(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let classroom = state.classroom_service.get_classroom(id).await?;
    Ok(Json(classroom))
}

#[axum::debug_handler]
pub async fn list_teacher_classrooms(
    State(state): State<AppState>,
    Query(query): Query<TeacherQuery>,
) -> Result<impl IntoResponse> {
    let classrooms = state
        .classroom_service
        .list_for_teacher(query.teacher_id)
        .await?;
    Ok(Json(classrooms))
}

#[axum::debug_handler]
pub async fn list_student_classrooms(
    State(state): State<AppState>,
    Query(query): Query<StudentQuery>,
) -> Result<impl IntoResponse> {
    let classrooms = state
        .classroom_service
        .list_for_student(query.student_id)
        .await?;
    Ok(Json(classrooms))
}

#[axum::debug_handler]
pub async fn get_roster(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let roster = state.classroom_service.roster(id).await?;
    Ok(Json(roster))
}
