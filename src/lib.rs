//! # Translation Gateway
//!
//! 位于翻译引擎之前的请求合批网关：把多个并发请求的分句放进同一个优先级队列，
//! 在固定的并发预算内合并成批次调用引擎，再把译文按原文结构拼回各自的请求。
//!
//! ## 模块组织
//!
//! - `scheduler` - 单元、优先级队列、并发预算、投喂循环与批次派发
//! - `orchestrator` - 请求编排：分句、入队、等待、重组
//! - `adapters` - 翻译引擎与分句服务适配、掩码填充
//! - `config` - 配置文件加载与验证
//! - `env` - 类型安全的环境变量
//! - `error` - 统一错误类型
//! - `web` - HTTP 接口（可选）

pub mod adapters;
pub mod config;
pub mod env;
pub mod error;
pub mod orchestrator;
pub mod scheduler;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used items for convenience
pub use error::{GatewayError, GatewayResult};
pub use orchestrator::{Orchestrator, TranslatedText};
pub use scheduler::{Scheduler, SchedulerConfig, Unit};
