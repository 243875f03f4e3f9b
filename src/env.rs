//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问。所有变量都以 `GATEWAY_` 为前缀，
//! 在配置文件之后应用，用于覆盖单个字段。

use std::env;
use std::fmt;
use std::time::Duration;

use crate::config::{EngineKind, SegmenterKind};

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅当变量被显式设置时返回值；未设置时返回 `Ok(None)`
    fn get_set() -> EnvResult<Option<T>> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value).map(Some),
            Err(_) => Ok(None),
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "GATEWAY_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 配置文件路径
    pub struct ConfigPath;
    impl EnvVar<String> for ConfigPath {
        const NAME: &'static str = "GATEWAY_CONFIG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Explicit path of the gateway config file (.toml or .json)";

        fn parse(value: &str) -> EnvResult<String> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Path cannot be empty".to_string(),
                });
            }
            Ok(path.to_string())
        }
    }
}

/// Web服务器相关环境变量
pub mod server {
    use super::*;

    /// 绑定地址
    pub struct BindAddress;
    impl EnvVar<String> for BindAddress {
        const NAME: &'static str = "GATEWAY_BIND_ADDRESS";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Web server bind address";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// 端口
    pub struct Port;
    impl EnvVar<u16> for Port {
        const NAME: &'static str = "GATEWAY_PORT";
        const DEFAULT: Option<u16> = Some(8080);
        const DESCRIPTION: &'static str = "Web server port";

        fn parse(value: &str) -> EnvResult<u16> {
            parse_port(value, Self::NAME)
        }
    }

    /// 静态文件目录
    pub struct StaticDir;
    impl EnvVar<String> for StaticDir {
        const NAME: &'static str = "GATEWAY_STATIC_DIR";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Directory served under /ui";

        fn parse(value: &str) -> EnvResult<String> {
            Ok(value.trim().to_string())
        }
    }
}

/// 分句服务相关环境变量
pub mod segmenter {
    use super::*;

    /// 分句器类型
    pub struct Kind;
    impl EnvVar<SegmenterKind> for Kind {
        const NAME: &'static str = "GATEWAY_SEGMENTER_KIND";
        const DEFAULT: Option<SegmenterKind> = Some(SegmenterKind::Pragmatic);
        const DESCRIPTION: &'static str = "Segmenter collaborator: pragmatic, whole";

        fn parse(value: &str) -> EnvResult<SegmenterKind> {
            match value.trim().to_lowercase().as_str() {
                "pragmatic" => Ok(SegmenterKind::Pragmatic),
                "whole" | "none" => Ok(SegmenterKind::Whole),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid segmenter '{}'. Use: pragmatic, whole", value),
                }),
            }
        }
    }

    /// 分句服务主机
    pub struct Host;
    impl EnvVar<String> for Host {
        const NAME: &'static str = "GATEWAY_SEGMENTER_HOST";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Segmenter service host";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// 分句服务端口
    pub struct Port;
    impl EnvVar<u16> for Port {
        const NAME: &'static str = "GATEWAY_SEGMENTER_PORT";
        const DEFAULT: Option<u16> = Some(5000);
        const DESCRIPTION: &'static str = "Segmenter service port";

        fn parse(value: &str) -> EnvResult<u16> {
            parse_port(value, Self::NAME)
        }
    }

    /// 是否使用空白分句器
    pub struct UseWhiteSegmenter;
    impl EnvVar<bool> for UseWhiteSegmenter {
        const NAME: &'static str = "GATEWAY_SEGMENTER_USE_WHITE";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Ask the segmenter to use its whitespace segmenter";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }
}

/// 翻译引擎与调度器相关环境变量
pub mod engine {
    use super::*;

    /// 引擎类型
    pub struct Kind;
    impl EnvVar<EngineKind> for Kind {
        const NAME: &'static str = "GATEWAY_ENGINE_KIND";
        const DEFAULT: Option<EngineKind> = Some(EngineKind::Fake);
        const DESCRIPTION: &'static str = "Translation engine: fake, deeplx";

        fn parse(value: &str) -> EnvResult<EngineKind> {
            match value.trim().to_lowercase().as_str() {
                "fake" => Ok(EngineKind::Fake),
                "deeplx" => Ok(EngineKind::Deeplx),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid engine '{}'. Use: fake, deeplx", value),
                }),
            }
        }
    }

    /// API URL
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "GATEWAY_ENGINE_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Translation engine endpoint URL";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 源语言
    pub struct SrcLang;
    impl EnvVar<String> for SrcLang {
        const NAME: &'static str = "GATEWAY_ENGINE_SRC_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Source language (ISO 639-1 code)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_lang(value, Self::NAME)
        }
    }

    /// 目标语言
    pub struct TgtLang;
    impl EnvVar<String> for TgtLang {
        const NAME: &'static str = "GATEWAY_ENGINE_TGT_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Target language (ISO 639-1 code)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_lang(value, Self::NAME)
        }
    }

    /// 每批最大分句数
    pub struct MaxSegmentsPerBatch;
    impl EnvVar<usize> for MaxSegmentsPerBatch {
        const NAME: &'static str = "GATEWAY_MAX_SEGMENTS_PER_BATCH";
        const DEFAULT: Option<usize> = Some(32);
        const DESCRIPTION: &'static str = "Maximum segments sent to the engine in one batch";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 10_000)
        }
    }

    /// 最大并发批次数
    pub struct MaxConcurrentBatches;
    impl EnvVar<usize> for MaxConcurrentBatches {
        const NAME: &'static str = "GATEWAY_MAX_CONCURRENT_BATCHES";
        const DEFAULT: Option<usize> = Some(4);
        const DESCRIPTION: &'static str = "Maximum batches in flight against the engine";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 1_000)
        }
    }

    /// 默认优先级
    pub struct DefaultPriority;
    impl EnvVar<i32> for DefaultPriority {
        const NAME: &'static str = "GATEWAY_DEFAULT_PRIORITY";
        const DEFAULT: Option<i32> = Some(0);
        const DESCRIPTION: &'static str = "Priority used when a request omits one (lower runs first)";

        fn parse(value: &str) -> EnvResult<i32> {
            value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid integer".to_string(),
            })
        }
    }

    /// 投喂循环间隔
    pub struct FeedInterval;
    impl EnvVar<Duration> for FeedInterval {
        const NAME: &'static str = "GATEWAY_FEED_INTERVAL_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(100));
        const DESCRIPTION: &'static str = "Feeder polling interval in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let millis: u64 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of milliseconds".to_string(),
            })?;

            if millis == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Interval must be greater than 0".to_string(),
                });
            }

            if millis > 60_000 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Interval too long (max 60000 ms)".to_string(),
                });
            }

            Ok(Duration::from_millis(millis))
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_port(value: &str, var_name: &str) -> EnvResult<u16> {
    let port: u16 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid port number (1-65535)".to_string(),
    })?;

    if port == 0 {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "Port cannot be 0".to_string(),
        });
    }

    Ok(port)
}

fn parse_non_empty(value: &str, var_name: &str) -> EnvResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "Value cannot be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_lang(value: &str, var_name: &str) -> EnvResult<String> {
    let lang = value.trim().to_lowercase();
    if lang.len() != 2 {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "Language code must be 2 characters (ISO 639-1)".to_string(),
        });
    }
    Ok(lang)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    push_doc::<core::LogLevel, _>(&mut docs);
    push_doc::<core::ConfigPath, _>(&mut docs);

    docs.push_str("\n## Web Server Configuration\n\n");
    push_doc::<server::BindAddress, _>(&mut docs);
    push_doc::<server::Port, _>(&mut docs);
    push_doc::<server::StaticDir, _>(&mut docs);

    docs.push_str("\n## Segmenter Configuration\n\n");
    push_doc::<segmenter::Kind, _>(&mut docs);
    push_doc::<segmenter::Host, _>(&mut docs);
    push_doc::<segmenter::Port, _>(&mut docs);
    push_doc::<segmenter::UseWhiteSegmenter, _>(&mut docs);

    docs.push_str("\n## Engine & Scheduler Configuration\n\n");
    push_doc::<engine::Kind, _>(&mut docs);
    push_doc::<engine::ApiUrl, _>(&mut docs);
    push_doc::<engine::SrcLang, _>(&mut docs);
    push_doc::<engine::TgtLang, _>(&mut docs);
    push_doc::<engine::MaxSegmentsPerBatch, _>(&mut docs);
    push_doc::<engine::MaxConcurrentBatches, _>(&mut docs);
    push_doc::<engine::DefaultPriority, _>(&mut docs);
    push_doc::<engine::FeedInterval, _>(&mut docs);

    docs
}

fn push_doc<V: EnvVar<T>, T: fmt::Debug>(docs: &mut String) {
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        V::NAME,
        V::DESCRIPTION,
        V::DEFAULT
    ));
}
