use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::material_dto::{CreateMaterialRequest, RecordViewRequest},
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn create_material(
    State(state): State<AppState>,
    Path(classroom_id): Path<Uuid>,
    Json(payload): Json<CreateMaterialRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let material = state
        .material_service
        .create_material(classroom_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(material)))
}

#[axum::debug_handler]
pub async fn list_materials(
    State(state): State<AppState>,
    Path(classroom_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let materials = state.material_service.list_materials(classroom_id).await?;
    Ok(Json(materials))
}

#[axum::debug_handler]
pub async fn record_view(
    State(state): State<AppState>,
    Path(material_id): Path<Uuid>,
    Json(payload): Json<RecordViewRequest>,
) -> Result<impl IntoResponse> {
    state
        .material_service
        .record_view(material_id, payload.student_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
