use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::types::{ChatRequest, ChatResponse};

use super::error::ApiError;
use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;

    let request_id = Uuid::new_v4();
    let span = info_span!(
        "chat",
        %request_id,
        user_id = request.user_id.as_deref().unwrap_or("-")
    );

    async move {
        let reply = state
            .router
            .handle(&request.message, request.user_id.as_deref())
            .await?;

        info!(route = ?reply.route, chars = reply.text.len(), "已回复");
        Ok::<_, ApiError>(Json(ChatResponse::bot(reply.text)))
    }
    .instrument(span)
    .await
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "GATE/NET Exam Assistant is running",
    })
}
