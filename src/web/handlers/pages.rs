//! 页面处理器

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};

use crate::config::EngineKind;
use crate::web::types::{AppState, UiInitResponse};

/// 主页处理器，重定向到界面入口
pub async fn index() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/ui/index.html")])
}

/// 界面初始化信息处理器
pub async fn ui_init(State(state): State<Arc<AppState>>) -> Json<UiInitResponse> {
    let engine = &state.config.engine;
    let engine_name = match engine.kind {
        EngineKind::Fake => "fake",
        EngineKind::Deeplx => "deeplx",
    };

    Json(UiInitResponse {
        src_lang: engine.src_lang.clone(),
        tgt_lang: engine.tgt_lang.clone(),
        engine: engine_name.to_string(),
    })
}
