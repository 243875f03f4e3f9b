//! Web 服务器配置

use std::path::Path;

use crate::config::ServerConfig;

/// Web 服务器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    /// 绑定地址
    pub bind_addr: String,
    /// 端口
    pub port: u16,
    /// 界面静态文件目录，挂载在 `/ui`
    pub static_dir: Option<String>,
}

impl WebConfig {
    /// 获取完整的监听地址
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// 静态目录不存在时只给出警告，接口仍可用
    pub fn check_static_dir(&self) {
        if let Some(ref static_dir) = self.static_dir {
            if !Path::new(static_dir).exists() {
                tracing::warn!("静态文件目录 '{}' 不存在，/ui 将返回 404", static_dir);
            }
        }
    }
}

impl From<&ServerConfig> for WebConfig {
    fn from(config: &ServerConfig) -> Self {
        let static_dir = if config.static_dir.trim().is_empty() {
            None
        } else {
            Some(config.static_dir.clone())
        };

        Self {
            bind_addr: config.host.clone(),
            port: config.port,
            static_dir,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}
