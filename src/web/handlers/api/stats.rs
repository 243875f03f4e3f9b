//! 调度统计API处理器

use std::sync::Arc;

use axum::{extract::State, response::Json};

use crate::web::types::{AppState, StatsResponse};

/// 调度统计处理器
pub async fn scheduler_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let scheduler = state.orchestrator.scheduler();
    let stats = scheduler.stats();
    let config = scheduler.config();

    Json(StatsResponse {
        average_engine_millis: stats.average_engine_millis(),
        stats,
        queued_units: scheduler.queued_units(),
        processing_batches: scheduler.processing_batches(),
        max_concurrent_batches: config.max_concurrent_batches,
        max_segments_per_batch: config.max_segments_per_batch,
    })
}

/// 健康检查
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
