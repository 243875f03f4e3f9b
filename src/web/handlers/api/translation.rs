//! 翻译API处理器

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json as ExtractJson, State},
    http::StatusCode,
    response::Json,
};

use crate::error::{GatewayError, GatewayResult};
use crate::web::types::{AppState, TranslateRequest, TranslateResponse};

/// 批量翻译处理器
///
/// 客户端断开时 axum 会丢弃该 future，排队中的分句随之撤回。
pub async fn translate(
    State(state): State<Arc<AppState>>,
    request: Result<ExtractJson<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, (StatusCode, Json<serde_json::Value>)> {
    match handle_translate(&state, request).await {
        Ok(translations) => Ok(Json(translations)),
        Err(e) => {
            if e.status_code().is_client_error() {
                tracing::warn!("拒绝翻译请求: {}", e);
            } else {
                tracing::error!("翻译请求处理失败: {}", e);
            }
            let message = if e.is_internal() {
                "调度器内部错误".to_string()
            } else {
                e.to_string()
            };
            Err((
                e.status_code(),
                Json(serde_json::json!({
                    "error": true,
                    "message": message,
                })),
            ))
        }
    }
}

async fn handle_translate(
    state: &AppState,
    request: Result<ExtractJson<TranslateRequest>, JsonRejection>,
) -> GatewayResult<TranslateResponse> {
    let ExtractJson(request) = request.map_err(GatewayError::from)?;
    let translations = state
        .orchestrator
        .translate(request.texts, request.priority)
        .await?;
    Ok(TranslateResponse { translations })
}
