use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{dto::quiz_dto::StudentQuery, error::Result, AppState};

#[axum::debug_handler]
pub async fn classroom_report(
    State(state): State<AppState>,
    Path(classroom_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let report = state.analytics_service.classroom_report(classroom_id).await?;
    Ok(Json(report))
}

#[axum::debug_handler]
pub async fn student_progress(
    State(state): State<AppState>,
    Query(query): Query<StudentQuery>,
) -> Result<impl IntoResponse> {
    let progress = state.progress_service.student_progress(query.student_id).await?;
    Ok(Json(progress))
}
