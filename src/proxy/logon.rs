//! 登录请求处理
//! 校验 -> 查缓存 -> (命中 | 过期刷新 | 新登录) -> 写缓存 -> 返回响应

use axum::http::Method;
use std::sync::Arc;

use crate::core::models::{LoginKind, LoginResponse};
use crate::core::Clock;
use crate::error::ProxyError;
use crate::proxy::refresh::RefreshController;
use crate::proxy::session_cache::SessionCache;
use crate::proxy::upstream::{LoginForward, UpstreamApi};

/// 选择缓存分区的请求头
pub const LOGIN_TYPE_HEADER: &str = "login-type";

/// 已在边界解析过的登录请求
#[derive(Debug, Clone)]
pub struct LogonRequest {
    pub method: Method,
    pub query: Option<String>,
    /// `login-type` 头; None 表示请求未携带
    pub login_type: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl LogonRequest {
    fn account_name(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.get("accountName"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// 解析登录类型: 缺省为 DASHBOARD, 空值或未知值为校验错误
pub fn resolve_login_kind(header: Option<&str>) -> Result<LoginKind, ProxyError> {
    match header {
        None => Ok(LoginKind::DEFAULT),
        Some(value) if value.trim().is_empty() => Err(ProxyError::Validation(
            "Missing header login-type:API|DASHBOARD".to_string(),
        )),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ProxyError::Validation(format!("Unknown login-type: {}.", value))),
    }
}

pub struct LogonService {
    cache: Arc<SessionCache>,
    refresher: RefreshController,
    upstream: Arc<dyn UpstreamApi>,
}

impl LogonService {
    pub fn new(
        cache: Arc<SessionCache>,
        upstream: Arc<dyn UpstreamApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let refresher = RefreshController::new(cache.clone(), upstream.clone(), clock);
        Self {
            cache,
            refresher,
            upstream,
        }
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    pub async fn handle(&self, request: LogonRequest) -> Result<LoginResponse, ProxyError> {
        let kind = resolve_login_kind(request.login_type.as_deref())?;
        let account = request
            .account_name()
            .ok_or_else(|| {
                ProxyError::Validation("Missing accountName in login body object".to_string())
            })?
            .to_string();

        if let Some(cached) = self.refresher.resolve(kind, &account).await {
            tracing::info!(
                "Cached {} login found for {} (session {})",
                kind,
                account,
                cached.response().session_id().unwrap_or("-")
            );
            return Ok(cached.response().clone());
        }

        tracing::info!("Retrieving new {} login for {} from upstream", kind, account);
        let fresh = self
            .upstream
            .login(LoginForward {
                method: request.method,
                query: request.query,
                body: request.body,
            })
            .await?;

        if self.cache.put(kind, &account, fresh.clone()) {
            tracing::info!("Cached {} login for {}", kind, account);
        } else {
            tracing::warn!(
                "Upstream login for {} returned {}, not cached",
                account,
                fresh.status_code()
            );
        }

        Ok(fresh)
    }
}
