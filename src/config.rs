use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 未配置密钥时的占位符，与未设置等价
pub const OPENAI_KEY_PLACEHOLDER: &str = "your-openai-api-key-here";
pub const WEATHER_KEY_PLACEHOLDER: &str = "your-weather-api-key-here";

const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert GATE and NET exam preparation assistant for engineering students.
You help students with:
1. Subject-specific questions (CS, IT, EC, EE, ME, CE, CH, BT, MA, PH)
2. Problem-solving techniques
3. Important formulas and concepts
4. Previous year question analysis
5. Study strategies and tips
6. Time management advice
7. Mock test preparation

Always provide:
- Clear, step-by-step explanations
- Relevant formulas when applicable
- Tips for exam preparation
- Encouragement and motivation

Keep responses concise but comprehensive, suitable for exam preparation.";

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
            static_dir: PathBuf::from("static"),
        }
    }
}

/// 对话补全服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub system_prompt: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        CompletionConfig {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl CompletionConfig {
    /// 有效的 API key；未设置、空串或占位符都返回 None
    pub fn credential(&self) -> Option<&str> {
        usable_key(self.api_key.as_deref(), OPENAI_KEY_PLACEHOLDER)
    }
}

/// 天气服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        WeatherConfig {
            api_key: None,
            base_url: "http://api.openweathermap.org/data/2.5".to_string(),
        }
    }
}

impl WeatherConfig {
    pub fn credential(&self) -> Option<&str> {
        usable_key(self.api_key.as_deref(), WEATHER_KEY_PLACEHOLDER)
    }
}

/// Session 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 每个用户保留的最近消息条数
    pub context_window: usize,
    /// 内存中最多保留的会话数，超出后淘汰最久未写入的会话
    pub max_sessions: usize,
    /// 会话空闲多久后被清理，0 表示不清理
    pub idle_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            context_window: 10,
            max_sessions: 10_000,
            idle_ttl_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

impl SessionConfig {
    pub fn idle_ttl(&self) -> Option<Duration> {
        (self.idle_ttl_secs > 0).then(|| Duration::from_secs(self.idle_ttl_secs))
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "text" 或 "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// 单个关键词分类
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub keywords: Vec<String>,
    pub response: String,
}

/// 离线模板表；categories 为空时使用内置表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryConfig>,
    /// 兜底模板，`{message}` 会被替换为用户原文
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_response: Option<String>,
}

/// 统一配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 外部调用超时（秒）
    pub request_timeout_secs: u64,
    pub server: ServerConfig,
    pub completion: CompletionConfig,
    pub weather: WeatherConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    pub templates: TemplatesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            request_timeout_secs: 30,
            server: ServerConfig::default(),
            completion: CompletionConfig::default(),
            weather: WeatherConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
            templates: TemplatesConfig::default(),
        }
    }
}

impl Config {
    /// 从文件加载配置，文件不存在时使用默认值
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败：{}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("解析配置文件失败：{}", path.display()))?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 默认配置文件位置
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".exam-assistant")
            .join("config.toml")
    }

    /// 用环境变量覆盖文件中的值
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var("OPENAI_API_KEY") {
            self.completion.api_key = Some(key);
        }
        if let Some(url) = var("OPENAI_BASE_URL") {
            self.completion.base_url = url;
        }
        if let Some(model) = var("OPENAI_MODEL") {
            self.completion.model = model;
        }
        if let Some(key) = var("WEATHER_API_KEY") {
            self.weather.api_key = Some(key);
        }
        if let Some(host) = var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn usable_key<'a>(key: Option<&'a str>, placeholder: &str) -> Option<&'a str> {
    key.map(str::trim)
        .filter(|k| !k.is_empty() && *k != placeholder)
}
