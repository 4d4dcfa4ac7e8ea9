use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::quiz_dto::{CreateQuizRequest, StudentQuery},
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn create_quiz(
    State(state): State<AppState>,
    Path(classroom_id): Path<Uuid>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let quiz = state.quiz_service.create_quiz(classroom_id, payload).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

#[axum::debug_handler]
pub async fn attempt_review(
    State(state): State<AppState>,
    Path(quiz_id): Path<Uuid>,
    Query(query): Query<StudentQuery>,
) -> Result<impl IntoResponse> {
    let review = state
        .quiz_service
        .attempt_review(quiz_id, query.student_id)
        .await?;
    Ok(Json(review))
}

#[axum::debug_handler]
pub async fn list_quizzes(
    State(state): State<AppState>,
    Path(classroom_id): Path<Uuid>,
    Query(query): Query<StudentQuery>,
) -> Result<impl IntoResponse> {
    let quizzes = state
        .quiz_service
        .list_for_student(classroom_id, query.student_id)
        .await?;
    Ok(Json(quizzes))
}
