//! Route functions. Each one validates the request body and delegates to a handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::debug;

use super::{API_VERSION, AppState};
use crate::api::{
    ApiError, ApiResult, ChatRequest, DiffResponse, FileRequest, FileResponse, FilesResponse,
    HealthResponse, HistoryResponse, StatusResponse,
};
use crate::coder::ChatReply;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: API_VERSION.to_string(),
    })
}

pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatReply>> {
    let Json(request) = payload?;
    let message = request.message.unwrap_or_default();
    let role = request.role.unwrap_or_default();
    let mut reply = state.chat.send_message(&message, role).await?;
    reply.provider = request.provider;
    Ok(Json(reply))
}

pub async fn get_chat_history(State(state): State<AppState>) -> ApiResult<Json<HistoryResponse>> {
    let messages = state.chat.get_history().await?;
    Ok(Json(HistoryResponse { messages }))
}

pub async fn clear_chat(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    state.chat.clear_history().await?;
    Ok(Json(StatusResponse::ok()))
}

pub async fn get_files(State(state): State<AppState>) -> ApiResult<Json<FilesResponse>> {
    let files = state.files.get_files().await?;
    Ok(Json(FilesResponse { files }))
}

pub async fn add_file(
    State(state): State<AppState>,
    payload: Result<Json<FileRequest>, JsonRejection>,
) -> ApiResult<Json<FileResponse>> {
    let Json(request) = payload?;
    let file = request.file.unwrap_or_default();
    state.files.add_file(&file).await?;
    Ok(Json(FileResponse {
        status: "ok".to_string(),
        file,
    }))
}

pub async fn remove_file(
    State(state): State<AppState>,
    payload: Result<Json<FileRequest>, JsonRejection>,
) -> ApiResult<Json<FileResponse>> {
    let Json(request) = payload?;
    let file = request.file.unwrap_or_default();
    state.files.remove_file(&file).await?;
    Ok(Json(FileResponse {
        status: "ok".to_string(),
        file,
    }))
}

pub async fn undo(State(state): State<AppState>) -> ApiResult<Json<StatusResponse>> {
    state.undo.undo_last_commit().await?;
    Ok(Json(StatusResponse::ok()))
}

pub async fn get_diff(State(state): State<AppState>) -> ApiResult<Json<DiffResponse>> {
    let diff = state.diff.get_diff().await?;
    Ok(Json(DiffResponse { diff }))
}

/// Edits are applied by the engine when it commits, so this only acknowledges
pub async fn apply_changes() -> Json<StatusResponse> {
    debug!("Apply requested; engine edits are already applied");
    Json(StatusResponse::ok())
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
