use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, ProviderError, Result};
use crate::types::Turn;

use super::context::Context;
use super::llm::{CompletionProvider, LlmClient};
use super::session::SessionStore;
use super::templates::TemplateSelector;
use super::weather::{self, WeatherClient, WeatherProvider};

/// 回复来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Weather,
    Completion,
    Template,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub route: Route,
}

/// 消息路由 - 判断意图，调用天气服务、补全服务或离线模板，
/// 并在补全成功后写回会话历史。本身不保存任何状态。
pub struct MessageRouter {
    store: Arc<SessionStore>,
    completion: Option<Arc<dyn CompletionProvider>>,
    weather: Arc<dyn WeatherProvider>,
    templates: TemplateSelector,
    system_prompt: String,
    timeout: Duration,
}

impl MessageRouter {
    pub fn new(
        store: Arc<SessionStore>,
        completion: Option<Arc<dyn CompletionProvider>>,
        weather: Arc<dyn WeatherProvider>,
        templates: TemplateSelector,
        system_prompt: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        MessageRouter {
            store,
            completion,
            weather,
            templates,
            system_prompt: system_prompt.into(),
            timeout,
        }
    }

    /// 按配置创建真实的 HTTP 客户端
    pub fn from_config(config: &Config, store: Arc<SessionStore>) -> Result<Self> {
        let timeout = config.request_timeout();

        let completion = LlmClient::from_config(&config.completion, timeout)?
            .map(|client| Arc::new(client) as Arc<dyn CompletionProvider>);
        if completion.is_none() {
            info!("未配置 OpenAI API key，使用离线模板回复");
        }

        let weather = Arc::new(WeatherClient::from_config(&config.weather, timeout)?);

        Ok(Self::new(
            store,
            completion,
            weather,
            TemplateSelector::from_config(&config.templates),
            config.completion.system_prompt.clone(),
            timeout,
        ))
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// 处理一条消息。只有消息为空时返回错误，外部服务失败一律转为兜底回复。
    pub async fn handle(&self, message: &str, user_id: Option<&str>) -> Result<Reply> {
        if message.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }

        if weather::is_weather_query(message) {
            return Ok(self.handle_weather(message).await);
        }

        Ok(self.handle_exam_help(message, user_id).await)
    }

    async fn handle_weather(&self, message: &str) -> Reply {
        let city = weather::extract_city(message);
        debug!(%city, "天气查询");

        let text = match self.bounded(self.weather.current(&city)).await {
            Ok(report) => weather::format_report(&report),
            Err(e) => {
                warn!(%city, error = %e, "天气查询失败");
                weather::format_failure(&e)
            }
        };

        Reply {
            text,
            route: Route::Weather,
        }
    }

    async fn handle_exam_help(&self, message: &str, user_id: Option<&str>) -> Reply {
        let Some(provider) = &self.completion else {
            return self.fallback(message);
        };

        let history = user_id
            .map(|id| self.store.get_context(id))
            .unwrap_or_default();

        let mut context = Context::with_history(self.system_prompt.as_str(), &history);
        context.add_user(message);

        match self.bounded(provider.complete(&context.messages())).await {
            Ok(text) => {
                if let Some(id) = user_id {
                    self.store
                        .append(id, Turn::user(message), Turn::assistant(text.as_str()));
                }
                debug!(history = history.len(), "补全成功");
                Reply {
                    text,
                    route: Route::Completion,
                }
            }
            Err(e) => {
                warn!(error = %e, "补全服务调用失败，使用离线模板");
                self.fallback(message)
            }
        }
    }

    fn fallback(&self, message: &str) -> Reply {
        Reply {
            text: self.templates.select(message),
            route: Route::Template,
        }
    }

    /// 给外部调用加超时，超时与其他失败同等处理
    async fn bounded<T, F>(&self, call: F) -> std::result::Result<T, ProviderError>
    where
        F: Future<Output = std::result::Result<T, ProviderError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or(Err(ProviderError::Timeout))
    }
}
