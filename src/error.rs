//! 错误类型

use thiserror::Error;

/// 请求处理中会返回给调用方的错误
#[derive(Error, Debug)]
pub enum Error {
    /// `message` 缺失或为空白
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 是否属于客户端输入错误
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::EmptyMessage)
    }
}

/// 外部服务（对话补全、天气）调用失败
///
/// 不会传给 HTTP 调用方，路由层会把每种情况转换为兜底回复。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("API key is not configured")]
    NotConfigured,

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Transport(String),

    #[error("unexpected response payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// Result 别名
pub type Result<T> = std::result::Result<T, Error>;
