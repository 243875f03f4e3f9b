//! 外部协作方适配
//!
//! 翻译引擎与分句服务都以 trait 对象的形式注入，
//! 这里按配置构造具体实现。

pub mod engine;
pub mod mask;
pub mod segmenter;

use std::sync::Arc;

use crate::config::{EngineKind, GatewayConfig, SegmenterKind};
use crate::error::GatewayResult;

pub use engine::{DeeplxEngine, FakeTranslationEngine, TranslationEngine};
pub use segmenter::{PragmaticSegmenterClient, SegmentedText, TextSegmenter, WholeTextSegmenter};

/// 按配置创建翻译引擎
pub fn build_engine(config: &GatewayConfig) -> GatewayResult<Arc<dyn TranslationEngine>> {
    let engine: Arc<dyn TranslationEngine> = match config.engine.kind {
        EngineKind::Fake => Arc::new(FakeTranslationEngine::new()),
        EngineKind::Deeplx => Arc::new(DeeplxEngine::new(&config.engine)?),
    };

    tracing::info!("使用翻译引擎: {}", engine.name());
    Ok(engine)
}

/// 按配置创建分句服务客户端，分句语言取引擎源语言
pub fn build_segmenter(config: &GatewayConfig) -> GatewayResult<Arc<dyn TextSegmenter>> {
    match config.segmenter.kind {
        SegmenterKind::Pragmatic => {
            let client = PragmaticSegmenterClient::new(&config.segmenter, &config.engine.src_lang)?;
            tracing::info!("使用分句服务: {}", client.endpoint());
            Ok(Arc::new(client))
        }
        SegmenterKind::Whole => {
            tracing::info!("不使用分句服务，整段翻译");
            Ok(Arc::new(WholeTextSegmenter))
        }
    }
}
