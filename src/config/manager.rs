//! 配置管理器
//!
//! 加载顺序：`.env` 文件 → 配置文件（TOML/JSON）→ `GATEWAY_*` 环境变量 → 校验

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::env::{self, EnvVar};
use crate::error::{GatewayError, GatewayResult};

/// 分句服务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmenterKind {
    /// 远程 pragmatic segmenter 服务
    Pragmatic,
    /// 不分句，每个输入文本即一个分句
    Whole,
}

/// 翻译引擎类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// 在原文后追加 " fake" 的测试引擎
    Fake,
    /// DeepLX 兼容的 HTTP 接口
    Deeplx,
}

/// Web 服务配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 挂载到 `/ui` 的静态目录，空字符串表示不提供界面
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: constants::DEFAULT_BIND_ADDRESS.to_string(),
            port: constants::DEFAULT_PORT,
            static_dir: constants::DEFAULT_STATIC_DIR.to_string(),
        }
    }
}

/// 分句服务配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SegmenterConfig {
    pub kind: SegmenterKind,
    pub host: String,
    pub port: u16,
    pub use_white_segmenter: bool,
    pub timeout_secs: u64,
}

impl SegmenterConfig {
    /// 分句接口地址
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/segment", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            kind: SegmenterKind::Pragmatic,
            host: constants::DEFAULT_SEGMENTER_HOST.to_string(),
            port: constants::DEFAULT_SEGMENTER_PORT,
            use_white_segmenter: false,
            timeout_secs: constants::DEFAULT_SEGMENTER_TIMEOUT.as_secs(),
        }
    }
}

/// 翻译引擎与调度配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub kind: EngineKind,
    pub api_url: String,
    pub src_lang: String,
    pub tgt_lang: String,

    // 调度参数
    pub max_segments_per_batch: usize,
    pub max_concurrent_batches: usize,
    pub default_priority: i32,
    pub feed_interval_ms: u64,
    pub timeout_secs: u64,
}

impl EngineConfig {
    pub fn feed_interval(&self) -> Duration {
        Duration::from_millis(self.feed_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Fake,
            api_url: constants::DEFAULT_ENGINE_API_URL.to_string(),
            src_lang: constants::DEFAULT_SRC_LANG.to_string(),
            tgt_lang: constants::DEFAULT_TGT_LANG.to_string(),
            max_segments_per_batch: constants::DEFAULT_MAX_SEGMENTS_PER_BATCH,
            max_concurrent_batches: constants::DEFAULT_MAX_CONCURRENT_BATCHES,
            default_priority: constants::DEFAULT_PRIORITY,
            feed_interval_ms: constants::DEFAULT_FEED_INTERVAL.as_millis() as u64,
            timeout_secs: constants::DEFAULT_ENGINE_TIMEOUT.as_secs(),
        }
    }
}

/// 网关完整配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub segmenter: SegmenterConfig,
    pub engine: EngineConfig,
}

impl GatewayConfig {
    /// 验证配置
    pub fn validate(&self) -> GatewayResult<()> {
        if self.engine.max_segments_per_batch == 0 {
            return Err(GatewayError::Config("每批最大分句数不能为0".to_string()));
        }

        if self.engine.max_concurrent_batches == 0 {
            return Err(GatewayError::Config("最大并发批次数不能为0".to_string()));
        }

        if self.engine.feed_interval_ms == 0 {
            return Err(GatewayError::Config("投喂间隔不能为0".to_string()));
        }

        if self.server.port == 0 {
            return Err(GatewayError::Config("端口不能为0".to_string()));
        }

        if self.segmenter.kind == SegmenterKind::Pragmatic && self.segmenter.port == 0 {
            return Err(GatewayError::Config("分句服务端口不能为0".to_string()));
        }

        if self.engine.kind == EngineKind::Deeplx {
            let url = url::Url::parse(&self.engine.api_url).map_err(|e| {
                GatewayError::Config(format!("无效的引擎地址 '{}': {}", self.engine.api_url, e))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(GatewayError::Config(format!(
                    "引擎地址必须是 http(s): {}",
                    self.engine.api_url
                )));
            }
        }

        Ok(())
    }

    /// 应用环境变量覆盖，只覆盖显式设置过的变量
    pub fn apply_env_overrides(&mut self) -> GatewayResult<()> {
        if let Some(host) = env::server::BindAddress::get_set()? {
            self.server.host = host;
        }
        if let Some(port) = env::server::Port::get_set()? {
            self.server.port = port;
        }
        if let Some(dir) = env::server::StaticDir::get_set()? {
            self.server.static_dir = dir;
        }

        if let Some(kind) = env::segmenter::Kind::get_set()? {
            self.segmenter.kind = kind;
        }
        if let Some(host) = env::segmenter::Host::get_set()? {
            self.segmenter.host = host;
        }
        if let Some(port) = env::segmenter::Port::get_set()? {
            self.segmenter.port = port;
        }
        if let Some(white) = env::segmenter::UseWhiteSegmenter::get_set()? {
            self.segmenter.use_white_segmenter = white;
        }

        if let Some(kind) = env::engine::Kind::get_set()? {
            self.engine.kind = kind;
        }
        if let Some(api_url) = env::engine::ApiUrl::get_set()? {
            tracing::info!("环境变量覆盖引擎地址: {}", api_url);
            self.engine.api_url = api_url;
        }
        if let Some(lang) = env::engine::SrcLang::get_set()? {
            self.engine.src_lang = lang;
        }
        if let Some(lang) = env::engine::TgtLang::get_set()? {
            self.engine.tgt_lang = lang;
        }
        if let Some(size) = env::engine::MaxSegmentsPerBatch::get_set()? {
            self.engine.max_segments_per_batch = size;
        }
        if let Some(batches) = env::engine::MaxConcurrentBatches::get_set()? {
            self.engine.max_concurrent_batches = batches;
        }
        if let Some(priority) = env::engine::DefaultPriority::get_set()? {
            self.engine.default_priority = priority;
        }
        if let Some(interval) = env::engine::FeedInterval::get_set()? {
            self.engine.feed_interval_ms = interval.as_millis() as u64;
        }

        Ok(())
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: GatewayConfig,
}

impl ConfigManager {
    /// 从指定路径或默认搜索路径加载配置
    ///
    /// 不读取 `.env`，需要时调用方先执行 [`ConfigManager::load_dotenv`]。
    pub fn load(path: Option<&Path>) -> GatewayResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_config()?,
        };
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(Self { config })
    }

    /// 直接使用给定配置（跳过文件和环境变量）
    pub fn from_config(config: GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn into_config(self) -> GatewayConfig {
        self.config
    }

    fn load_config() -> GatewayResult<GatewayConfig> {
        if let Some(path) = env::core::ConfigPath::get_set()? {
            return Self::load_from_file(Path::new(&path));
        }

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            let candidate = Path::new(expanded_path.as_ref());
            if candidate.exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(candidate);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(GatewayConfig::default())
    }

    /// 从指定文件加载配置
    pub fn load_from_file(path: &Path) -> GatewayResult<GatewayConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Config(format!("读取配置文件失败 {}: {}", path.display(), e))
        })?;

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> GatewayResult<GatewayConfig> {
        let is_toml = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Ok(toml::from_str(content)?)
        } else {
            serde_json::from_str(content)
                .map_err(|e| GatewayError::Config(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件，已存在的环境变量不会被覆盖
    pub fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &Path) -> GatewayResult<()> {
        let config = GatewayConfig::default();
        let content = toml::to_string_pretty(&config)?;

        std::fs::write(path, content)
            .map_err(|e| GatewayError::Config(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.feed_interval(), Duration::from_millis(100));
        assert_eq!(config.segmenter.endpoint(), "http://127.0.0.1:5000/segment");
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        let mut config = GatewayConfig::default();
        config.engine.max_segments_per_batch = 0;
        assert!(matches!(config.validate(), Err(GatewayError::Config(_))));

        let mut config = GatewayConfig::default();
        config.engine.max_concurrent_batches = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deeplx_requires_http_url() {
        let mut config = GatewayConfig::default();
        config.engine.kind = EngineKind::Deeplx;
        config.engine.api_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.engine.api_url = "ftp://example.com/translate".to_string();
        assert!(config.validate().is_err());

        config.engine.api_url = "http://localhost:1188/translate".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let content = r#"
            [engine]
            max_segments_per_batch = 8
            kind = "deeplx"

            [segmenter]
            kind = "whole"
        "#;
        let config = ConfigManager::parse(content, Path::new("gateway.toml")).unwrap();
        assert_eq!(config.engine.max_segments_per_batch, 8);
        assert_eq!(config.engine.kind, EngineKind::Deeplx);
        assert_eq!(config.engine.max_concurrent_batches, 4);
        assert_eq!(config.segmenter.kind, SegmenterKind::Whole);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_json_config() {
        let content = r#"{"engine": {"default_priority": 5}, "server": {"port": 9000}}"#;
        let config = ConfigManager::parse(content, Path::new("config.json")).unwrap();
        assert_eq!(config.engine.default_priority, 5);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = ConfigManager::parse("[engine\nkind=", Path::new("gateway.toml"));
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }
}
