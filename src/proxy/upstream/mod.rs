// Upstream 模块 - 上游 BI 服务客户端

pub mod client;
pub mod error;

pub use client::UpstreamClient;
pub use error::UpstreamError;

use async_trait::async_trait;
use axum::http::Method;

use crate::core::models::LoginResponse;

/// 转发给上游的登录请求
/// body / query 是否存在在解析入站请求时就已确定
#[derive(Debug, Clone)]
pub struct LoginForward {
    pub method: Method,
    pub query: Option<String>,
    pub body: Option<serde_json::Value>,
}

/// 登录缓存需要的上游能力
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// 向 `{base}/Api/LogOn` 发起登录
    async fn login(&self, request: LoginForward) -> Result<LoginResponse, UpstreamError>;

    /// `DELETE {base}/Api/Session/Current?sessionId=<id>`
    async fn delete_session(&self, session_id: &str) -> Result<LoginResponse, UpstreamError>;
}
