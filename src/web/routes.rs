//! Web 路由定义

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::web::{handlers::*, types::AppState};

/// 创建路由结构
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/ui-init", get(ui_init))
        .route("/translate", post(translate))
        .route("/api/stats", get(scheduler_stats))
        .route("/health", get(health))
}
