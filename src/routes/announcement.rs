use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::announcement_dto::{CreateAnnouncementRequest, CreateCommentRequest},
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn post_announcement(
    State(state): State<AppState>,
    Path(classroom_id): Path<Uuid>,
    Json(payload): Json<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let announcement = state
        .announcement_service
        .post_announcement(classroom_id, payload.author_id, payload.title, payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

#[axum::debug_handler]
pub async fn list_announcements(
    State(state): State<AppState>,
    Path(classroom_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let announcements = state
        .announcement_service
        .list_with_comments(classroom_id)
        .await?;
    Ok(Json(announcements))
}

#[axum::debug_handler]
pub async fn add_comment(
    State(state): State<AppState>,
    Path(announcement_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse> {
    let comment = state
        .announcement_service
        .add_comment(announcement_id, payload.author_id, payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
