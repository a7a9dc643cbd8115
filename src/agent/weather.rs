use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::WeatherConfig;
use crate::error::{Error, ProviderError};
use crate::types::{OpenWeatherResponse, WeatherReport};

pub const DEFAULT_CITY: &str = "London";

/// 预编译正则表达式（匹配独立单词 "in"）
static IN_WORD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bin\b").expect("valid regex"));

/// 天气服务
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherReport, ProviderError>;
}

/// 是否为天气查询
pub fn is_weather_query(message: &str) -> bool {
    message.to_lowercase().contains("weather")
}

/// 从消息中提取城市：取第一个 "in" 之后的第一个词并首字母大写，
/// 找不到时使用默认城市。多词城市名只保留第一个词。
pub fn extract_city(message: &str) -> String {
    IN_WORD_REGEX
        .find(message)
        .and_then(|m| message[m.end()..].split_whitespace().next())
        .map(title_case)
        .unwrap_or_else(|| DEFAULT_CITY.to_string())
}

/// 每个字母段首字母大写，其余小写
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut boundary = true;
    for ch in word.chars() {
        if ch.is_alphabetic() {
            if boundary {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            boundary = false;
        } else {
            out.push(ch);
            boundary = true;
        }
    }
    out
}

/// 格式化天气回复
pub fn format_report(report: &WeatherReport) -> String {
    format!(
        "Weather in {}, {}:\nTemperature: {}°C\nDescription: {}\nHumidity: {}%\nWind Speed: {} m/s",
        report.city,
        report.country,
        report.temperature,
        report.description,
        report.humidity,
        report.wind_speed
    )
}

/// 查询失败时的道歉回复
pub fn format_failure(err: &ProviderError) -> String {
    let reason = match err {
        ProviderError::Status { .. } => "Weather data not available".to_string(),
        other => format!("Weather API error: {}", other),
    };
    format!("Sorry, I couldn't fetch weather data. {}", reason)
}

/// OpenWeatherMap 当前天气客户端
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn from_config(config: &WeatherConfig, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("创建 HTTP 客户端失败：{}", e)))?;

        Ok(WeatherClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.credential().map(str::to_string),
        })
    }
}

#[async_trait]
impl WeatherProvider for WeatherClient {
    async fn current(&self, city: &str) -> Result<WeatherReport, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;

        debug!(city, "查询天气");

        let response = self
            .client
            .get(format!("{}/weather", self.base_url))
            .query(&[("q", city), ("appid", api_key), ("units", "metric")])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: OpenWeatherResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::Malformed(format!("解析天气响应失败：{}", e)))?;

        payload
            .into_report()
            .map_err(|field| ProviderError::Malformed(format!("缺少字段 {}", field)))
    }
}
