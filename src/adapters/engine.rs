//! 翻译引擎适配
//!
//! 调度器只依赖 [`TranslationEngine`]：输入一批分句，按相同顺序返回同样数量的译文。
//! 任何失败都会使整个批次失败。
//!
//! - [`FakeTranslationEngine`]：在每个分句后追加 `" fake"`，用于开发与测试
//! - [`DeeplxEngine`]：通过 DeepLX 兼容接口翻译，使用索引标记合并成单次调用

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{GatewayError, GatewayResult};

/// 翻译引擎接口
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// 批量翻译，返回与输入等长、顺序一致的译文
    async fn translate(&self, texts: Vec<String>) -> GatewayResult<Vec<String>>;

    /// 引擎名称，用于日志
    fn name(&self) -> &str {
        "engine"
    }
}

/// 假引擎
#[derive(Debug, Clone)]
pub struct FakeTranslationEngine {
    suffix: String,
}

impl FakeTranslationEngine {
    pub fn new() -> Self {
        Self {
            suffix: " fake".to_string(),
        }
    }
}

impl Default for FakeTranslationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranslationEngine for FakeTranslationEngine {
    async fn translate(&self, texts: Vec<String>) -> GatewayResult<Vec<String>> {
        Ok(texts
            .into_iter()
            .map(|text| format!("{}{}", text, self.suffix))
            .collect())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[derive(Debug, Serialize)]
struct DeeplxRequest<'a> {
    text: String,
    source_lang: &'a str,
    target_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct DeeplxResponse {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// DeepLX 兼容接口引擎
///
/// 每个分句加上 `[i]` 前缀后以空行拼接为一次请求，返回后按行首索引标记拆回，
/// 两个标记之间的全部内容属于前一个索引，分句内部的空行得以保留。
/// 索引缺失、重复或越界都视为整批失败。
#[derive(Debug, Clone)]
pub struct DeeplxEngine {
    client: Client,
    api_url: String,
    source_lang: String,
    target_lang: String,
    index_pattern: Regex,
}

impl DeeplxEngine {
    pub fn new(config: &EngineConfig) -> GatewayResult<Self> {
        Self::with_endpoint(
            &config.api_url,
            &config.src_lang,
            &config.tgt_lang,
            config.timeout(),
        )
    }

    pub fn with_endpoint(
        api_url: &str,
        source_lang: &str,
        target_lang: &str,
        timeout: Duration,
    ) -> GatewayResult<Self> {
        url::Url::parse(api_url)
            .map_err(|e| GatewayError::Config(format!("无效的引擎地址 {}: {}", api_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("创建HTTP客户端失败: {}", e)))?;

        let index_pattern = Regex::new(r"(?m)^\[(\d+)\]")
            .map_err(|e| GatewayError::Internal(format!("索引正则编译失败: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            source_lang: source_lang.to_uppercase(),
            target_lang: target_lang.to_uppercase(),
            index_pattern,
        })
    }

    /// 添加索引标记并合并为单个请求文本
    fn combine(texts: &[String]) -> String {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| format!("[{}]{}", i, text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// 按行首索引标记拆分返回文本
    fn split_indexed(&self, response: &str, expected: usize) -> GatewayResult<Vec<String>> {
        let mut markers = Vec::new();
        for captures in self.index_pattern.captures_iter(response) {
            let (Some(whole), Some(index)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let index = index
                .as_str()
                .parse::<usize>()
                .ok()
                .filter(|index| *index < expected)
                .ok_or_else(|| {
                    GatewayError::EngineBatch(format!(
                        "引擎结果含有越界索引 [{}]（共 {} 条）",
                        index.as_str(),
                        expected
                    ))
                })?;
            markers.push((index, whole.start(), whole.end()));
        }

        let leading = &response[..markers.first().map_or(response.len(), |m| m.1)];
        if !leading.trim().is_empty() {
            return Err(GatewayError::EngineBatch(format!(
                "引擎结果在首个索引前含有无法归属的内容: {}",
                leading.trim()
            )));
        }

        let mut indexed: Vec<Option<String>> = vec![None; expected];
        for (position, &(index, _, body_start)) in markers.iter().enumerate() {
            let body_end = markers
                .get(position + 1)
                .map_or(response.len(), |next| next.1);
            let slot = &mut indexed[index];
            if slot.is_some() {
                return Err(GatewayError::EngineBatch(format!(
                    "引擎结果中索引 [{}] 重复出现",
                    index
                )));
            }
            *slot = Some(response[body_start..body_end].trim().to_string());
        }

        let missing: Vec<usize> = indexed
            .iter()
            .enumerate()
            .filter(|(_, text)| text.is_none())
            .map(|(i, _)| i)
            .collect();
        if !missing.is_empty() {
            return Err(GatewayError::EngineBatch(format!(
                "引擎结果缺少索引 {:?}（共 {} 条）",
                missing, expected
            )));
        }

        Ok(indexed.into_iter().flatten().collect())
    }
}

#[async_trait]
impl TranslationEngine for DeeplxEngine {
    async fn translate(&self, texts: Vec<String>) -> GatewayResult<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = DeeplxRequest {
            text: Self::combine(&texts),
            source_lang: &self.source_lang,
            target_lang: &self.target_lang,
        };

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::EngineBatch(format!("请求翻译引擎失败: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::EngineBatch(format!(
                "翻译引擎返回状态 {}: {}",
                status, body
            )));
        }

        let body: DeeplxResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::EngineBatch(format!("解析引擎响应失败: {}", e)))?;

        if let Some(code) = body.code {
            if code != 200 {
                return Err(GatewayError::EngineBatch(format!(
                    "翻译引擎返回错误码 {}: {}",
                    code,
                    body.message.unwrap_or_default()
                )));
            }
        }

        let data = body
            .data
            .ok_or_else(|| GatewayError::EngineBatch("引擎响应缺少 data 字段".to_string()))?;

        self.split_indexed(&data, texts.len())
    }

    fn name(&self) -> &str {
        "deeplx"
    }
}
