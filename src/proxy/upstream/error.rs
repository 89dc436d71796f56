// 上游错误 - 将底层错误转换为可读的消息
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream target: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    #[error("{0}")]
    Request(#[from] reqwest::Error),
}

impl UpstreamError {
    /// 错误分类，用于日志字段
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::InvalidUrl(_) => "invalid_url",
            UpstreamError::RequestBody(_) => "request_body_error",
            UpstreamError::Request(e) if e.is_timeout() => "timeout_error",
            UpstreamError::Request(e) if e.is_connect() => "connection_error",
            UpstreamError::Request(e) if e.is_decode() => "decode_error",
            UpstreamError::Request(e) if e.is_body() => "stream_error",
            UpstreamError::Request(_) => "unknown_error",
        }
    }
}
