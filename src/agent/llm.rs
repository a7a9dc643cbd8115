use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::CompletionConfig;
use crate::error::{Error, ProviderError};
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, Message};

/// 对话补全服务
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, ProviderError>;
}

/// OpenAI 兼容的 `/chat/completions` 客户端，每次请求只尝试一次
pub struct LlmClient {
    client: Client,
    config: CompletionConfig,
    api_key: String,
}

impl LlmClient {
    /// 没有可用的 API key 时返回 None，调用方应走离线模板
    pub fn from_config(config: &CompletionConfig, timeout: Duration) -> Result<Option<Self>, Error> {
        let Some(api_key) = config.credential() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("创建 HTTP 客户端失败：{}", e)))?;

        Ok(Some(LlmClient {
            client,
            api_key: api_key.to_string(),
            config: config.clone(),
        }))
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.to_vec(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(model = %request.model, messages = request.messages.len(), "调用补全接口");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "补全接口返回错误");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::Malformed(format!("解析补全响应失败：{}", e)))?;

        parsed
            .into_content()
            .ok_or_else(|| ProviderError::Malformed("响应中没有 choices[0].message.content".to_string()))
    }
}
