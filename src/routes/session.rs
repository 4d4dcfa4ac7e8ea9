use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    dto::quiz_dto::QuestionView,
    dto::session_dto::{
        NavigateRequest, RecordAnswerRequest, SessionStartedResponse, StartSessionRequest,
    },
    error::Result,
    AppState,
};

#[axum::debug_handler]
pub async fn start_session(
    State(state): State<AppState>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<impl IntoResponse> {
    let started = state
        .session_service
        .start_session(payload.quiz_id, payload.student_id)
        .await?;
    let response = SessionStartedResponse {
        session_id: started.session_id,
        quiz_id: started.quiz.id,
        title: started.quiz.title.clone(),
        time_limit_minutes: started.quiz.time_limit_minutes,
        remaining_seconds: started.remaining_seconds,
        questions: started.questions.iter().map(QuestionView::from).collect(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[axum::debug_handler]
pub async fn record_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<RecordAnswerRequest>,
) -> Result<impl IntoResponse> {
    state
        .session_service
        .record_answer(session_id, payload.question_id, payload.answer)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn navigate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<NavigateRequest>,
) -> Result<impl IntoResponse> {
    let current_index = state
        .session_service
        .navigate(session_id, payload.direction)
        .await?;
    Ok(Json(json!({ "current_index": current_index })))
}

#[axum::debug_handler]
pub async fn submit_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let result = state.session_service.submit_session(session_id).await?;
    Ok(Json(result))
}

#[axum::debug_handler]
pub async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let status = state.session_service.status(session_id).await?;
    Ok(Json(status))
}
