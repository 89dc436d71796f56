//! 会话刷新控制
//! 命中缓存时判断是否过期; 过期条目先在上游注销会话，再视为未命中

use std::sync::Arc;

use crate::core::models::{CachedLogin, LoginKind};
use crate::core::Clock;
use crate::proxy::session_cache::SessionCache;
use crate::proxy::upstream::UpstreamApi;

/// 缓存登录的有效期: 36 小时
pub const EXPIRATION_WINDOW_MILLIS: i64 = 36 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// 已过期，附带需要在上游注销的会话 ID
    Stale { session_id: Option<String> },
}

/// 超过 `capturedAt + 36h` (不含边界) 即过期
pub fn freshness(entry: &CachedLogin, now_millis: i64) -> Freshness {
    if now_millis - entry.captured_at_millis() > EXPIRATION_WINDOW_MILLIS {
        Freshness::Stale {
            session_id: entry.response().session_id().map(|s| s.to_string()),
        }
    } else {
        Freshness::Fresh
    }
}

pub struct RefreshController {
    cache: Arc<SessionCache>,
    upstream: Arc<dyn UpstreamApi>,
    clock: Arc<dyn Clock>,
}

impl RefreshController {
    pub fn new(
        cache: Arc<SessionCache>,
        upstream: Arc<dyn UpstreamApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache,
            upstream,
            clock,
        }
    }

    /// 返回仍然有效的缓存条目; 不存在或已过期时返回 None
    pub async fn resolve(&self, kind: LoginKind, account: &str) -> Option<Arc<CachedLogin>> {
        let entry = self.cache.get(kind, account)?;

        match freshness(&entry, self.clock.now_millis()) {
            Freshness::Fresh => Some(entry),
            Freshness::Stale { session_id } => {
                tracing::info!(
                    "Cached {} login for {} expired (captured at {})",
                    kind,
                    account,
                    entry.captured_at_millis()
                );
                if let Some(session_id) = session_id {
                    self.revoke(&session_id).await;
                }
                None
            }
        }
    }

    /// 尽力在上游注销会话，失败只记录日志
    pub async fn revoke(&self, session_id: &str) {
        tracing::info!("Session {} expired. Removing from upstream...", session_id);
        match self.upstream.delete_session(session_id).await {
            Ok(resp) if resp.status_code().is_success() => {
                tracing::debug!("Session {} removed upstream", session_id);
            }
            Ok(resp) => {
                tracing::warn!(
                    "Upstream answered {} while removing session {}",
                    resp.status_code(),
                    session_id
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Error while removing session {} ({}): {}",
                    session_id,
                    e.kind(),
                    e
                );
            }
        }
    }
}
