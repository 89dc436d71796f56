use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::common::error_response;
use crate::proxy::upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// 登录类型或账号缺失/无效
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

// No 4xx distinction: every failure is reported through the 500 envelope.
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            ProxyError::Validation(msg) => tracing::warn!("Rejected login request: {}", msg),
            ProxyError::Upstream(e) => tracing::error!("Upstream failure ({}): {}", e.kind(), e),
        }
        error_response(&self.to_string())
    }
}
