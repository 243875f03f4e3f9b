//! 网关统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::fmt;

use thiserror::Error;

/// 网关错误类型
///
/// 必须是 `Clone`：一次批次失败会被原样复制到批次中的每个翻译单元上。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// 分句服务不可达或返回了无效响应
    #[error("分句服务错误: {0}")]
    Segmentation(String),

    /// 翻译引擎对整个批次处理失败
    #[error("翻译引擎批次失败: {0}")]
    EngineBatch(String),

    /// 队列中没有待处理的单元（内部信号）
    #[error("队列为空")]
    EmptyQueue,

    /// 单元已不在队列中（内部信号）
    #[error("未找到: {0}")]
    NotFound(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 重组模板错误
    #[error("重组模板错误: {0}")]
    Mask(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Segmentation,
    Engine,
    Scheduling,
    Configuration,
    Network,
    Input,
    Serialization,
    Internal,
}

impl GatewayError {
    /// 是否只是调度器内部信号（不会暴露给调用方）
    pub fn is_internal(&self) -> bool {
        matches!(self, GatewayError::EmptyQueue | GatewayError::NotFound(_))
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            GatewayError::Segmentation(_) => ErrorCategory::Segmentation,
            GatewayError::EngineBatch(_) => ErrorCategory::Engine,
            GatewayError::EmptyQueue | GatewayError::NotFound(_) => ErrorCategory::Scheduling,
            GatewayError::Config(_) => ErrorCategory::Configuration,
            GatewayError::Network(_) => ErrorCategory::Network,
            GatewayError::InvalidInput(_) | GatewayError::Mask(_) => ErrorCategory::Input,
            GatewayError::Serialization(_) => ErrorCategory::Serialization,
            GatewayError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        let new_msg = match &self {
            GatewayError::EmptyQueue => return self,
            other => format!("{} (上下文: {})", message_of(other), context),
        };

        match &mut self {
            GatewayError::Segmentation(msg)
            | GatewayError::EngineBatch(msg)
            | GatewayError::NotFound(msg)
            | GatewayError::Config(msg)
            | GatewayError::Network(msg)
            | GatewayError::InvalidInput(msg)
            | GatewayError::Serialization(msg)
            | GatewayError::Mask(msg)
            | GatewayError::Internal(msg) => *msg = new_msg,
            GatewayError::EmptyQueue => {}
        }

        self
    }

    /// 对应的 HTTP 状态码
    #[cfg(feature = "web")]
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn message_of(error: &GatewayError) -> &str {
    match error {
        GatewayError::Segmentation(msg)
        | GatewayError::EngineBatch(msg)
        | GatewayError::NotFound(msg)
        | GatewayError::Config(msg)
        | GatewayError::Network(msg)
        | GatewayError::InvalidInput(msg)
        | GatewayError::Serialization(msg)
        | GatewayError::Mask(msg)
        | GatewayError::Internal(msg) => msg,
        GatewayError::EmptyQueue => "",
    }
}

/// 标准错误转换
impl From<std::io::Error> for GatewayError {
    fn from(error: std::io::Error) -> Self {
        GatewayError::Network(format!("IO错误: {}", error))
    }
}

impl From<toml::de::Error> for GatewayError {
    fn from(error: toml::de::Error) -> Self {
        GatewayError::Config(format!("TOML解析错误: {}", error))
    }
}

impl From<toml::ser::Error> for GatewayError {
    fn from(error: toml::ser::Error) -> Self {
        GatewayError::Serialization(format!("TOML序列化错误: {}", error))
    }
}

#[cfg(feature = "web")]
impl From<axum::extract::rejection::JsonRejection> for GatewayError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        GatewayError::InvalidInput(rejection.body_text())
    }
}

impl From<crate::env::EnvError> for GatewayError {
    fn from(error: crate::env::EnvError) -> Self {
        GatewayError::Config(error.to_string())
    }
}

/// 错误结果类型别名
pub type GatewayResult<T> = Result<T, GatewayError>;
