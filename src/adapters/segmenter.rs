//! 分句服务适配
//!
//! [`TextSegmenter`] 把每段原文拆成分句序列和对应的掩码模板，
//! 返回结果与输入一一对应。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::SegmenterConfig;
use crate::error::{GatewayError, GatewayResult};

/// 单段原文的分句结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentedText {
    pub segments: Vec<String>,
    pub mask: String,
}

impl SegmentedText {
    pub fn new(segments: Vec<String>, mask: impl Into<String>) -> Self {
        Self {
            segments,
            mask: mask.into(),
        }
    }
}

/// 分句接口
#[async_trait]
pub trait TextSegmenter: Send + Sync {
    /// 对每段原文分句，返回与输入等长的结果
    async fn segment(&self, texts: &[String]) -> GatewayResult<Vec<SegmentedText>>;
}

/// 不分句：整段原文作为一个分句
#[derive(Debug, Clone, Default)]
pub struct WholeTextSegmenter;

#[async_trait]
impl TextSegmenter for WholeTextSegmenter {
    async fn segment(&self, texts: &[String]) -> GatewayResult<Vec<SegmentedText>> {
        Ok(texts
            .iter()
            .map(|text| SegmentedText::new(vec![text.clone()], "{}"))
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct SegmentRequest<'a> {
    lang: &'a str,
    texts: &'a [String],
    use_white_segmenter: bool,
}

/// 远程分句服务客户端
///
/// 向 `http://host:port/segment` 提交 `{lang, texts, use_white_segmenter}`，
/// 期望返回 `[{segments, mask}, ...]`。
#[derive(Debug, Clone)]
pub struct PragmaticSegmenterClient {
    client: Client,
    endpoint: String,
    lang: String,
    use_white_segmenter: bool,
}

impl PragmaticSegmenterClient {
    pub fn new(config: &SegmenterConfig, lang: &str) -> GatewayResult<Self> {
        Self::with_endpoint(
            &config.endpoint(),
            lang,
            config.use_white_segmenter,
            config.timeout(),
        )
    }

    pub fn with_endpoint(
        endpoint: &str,
        lang: &str,
        use_white_segmenter: bool,
        timeout: Duration,
    ) -> GatewayResult<Self> {
        url::Url::parse(endpoint)
            .map_err(|e| GatewayError::Config(format!("无效的分句服务地址 {}: {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            lang: lang.to_string(),
            use_white_segmenter,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextSegmenter for PragmaticSegmenterClient {
    async fn segment(&self, texts: &[String]) -> GatewayResult<Vec<SegmentedText>> {
        let request = SegmentRequest {
            lang: &self.lang,
            texts,
            use_white_segmenter: self.use_white_segmenter,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Segmentation(format!("请求分句服务失败: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Segmentation(format!(
                "分句服务返回状态 {}: {}",
                status, body
            )));
        }

        response
            .json::<Vec<SegmentedText>>()
            .await
            .map_err(|e| GatewayError::Segmentation(format!("解析分句结果失败: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_whole_text_segmenter() {
        let texts = vec!["Hello. World.".to_string(), String::new()];
        let segmented = WholeTextSegmenter.segment(&texts).await.unwrap();

        assert_eq!(segmented.len(), 2);
        assert_eq!(segmented[0].segments, ["Hello. World."]);
        assert_eq!(segmented[0].mask, "{}");
        assert_eq!(segmented[1].segments, [""]);
    }

    #[test]
    fn test_segmented_text_wire_format() {
        let parsed: Vec<SegmentedText> =
            serde_json::from_str(r#"[{"segments":["A.","B."],"mask":"{} {}"}]"#).unwrap();
        assert_eq!(parsed[0], SegmentedText::new(vec!["A.".into(), "B.".into()], "{} {}"));
    }

    #[test]
    fn test_request_wire_format() {
        let texts = vec!["x".to_string()];
        let request = SegmentRequest {
            lang: "en",
            texts: &texts,
            use_white_segmenter: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"lang": "en", "texts": ["x"], "use_white_segmenter": true})
        );
    }

    #[test]
    fn test_client_rejects_invalid_endpoint() {
        let result = PragmaticSegmenterClient::with_endpoint("::", "en", false, Duration::from_secs(1));
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }
}
