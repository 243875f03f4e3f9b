//! 网关配置管理模块
//!
//! 提供简化的配置管理，支持配置文件、环境变量和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{
    ConfigManager, EngineConfig, EngineKind, GatewayConfig, SegmenterConfig, SegmenterKind,
    ServerConfig,
};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 调度相关
    pub const DEFAULT_MAX_SEGMENTS_PER_BATCH: usize = 32;
    pub const DEFAULT_MAX_CONCURRENT_BATCHES: usize = 4;
    pub const DEFAULT_PRIORITY: i32 = 0;
    pub const DEFAULT_FEED_INTERVAL: Duration = Duration::from_millis(100);

    // 协作服务
    pub const DEFAULT_SEGMENTER_HOST: &str = "127.0.0.1";
    pub const DEFAULT_SEGMENTER_PORT: u16 = 5000;
    pub const DEFAULT_SEGMENTER_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_ENGINE_API_URL: &str = "http://localhost:1188/translate";
    pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_SRC_LANG: &str = "en";
    pub const DEFAULT_TGT_LANG: &str = "es";

    // Web服务
    pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_STATIC_DIR: &str = "ui";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "gateway.toml",
        "config.toml",
        "config.json",
        "~/.config/translation-gateway/gateway.toml",
        "/etc/translation-gateway/gateway.toml",
    ];
}
