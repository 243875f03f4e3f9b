//! Web 模块的数据类型定义

use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;
use crate::orchestrator::{Orchestrator, TranslatedText};
use crate::scheduler::StatsSnapshot;

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub config: GatewayConfig,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, config: GatewayConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }
}

/// 翻译请求
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub texts: Vec<String>,
    /// 缺省时使用引擎配置的默认优先级
    #[serde(default)]
    pub priority: Option<i32>,
}

/// 翻译响应
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translations: Vec<TranslatedText>,
}

/// 界面初始化信息
#[derive(Debug, Serialize, Deserialize)]
pub struct UiInitResponse {
    pub src_lang: String,
    pub tgt_lang: String,
    pub engine: String,
}

/// 调度统计响应
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub queued_units: usize,
    pub processing_batches: usize,
    pub max_concurrent_batches: usize,
    pub max_segments_per_batch: usize,
    pub average_engine_millis: f64,
}
