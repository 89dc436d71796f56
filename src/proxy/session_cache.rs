use dashmap::DashMap;
use std::sync::Arc;

use crate::core::models::{CachedLogin, LoginKind, LoginResponse};
use crate::core::Clock;

/// 登录会话缓存
/// 每种登录类型一个分区 (account -> CachedLogin)，整个进程生命周期内存在
pub struct SessionCache {
    api: DashMap<String, Arc<CachedLogin>>,
    dashboard: DashMap<String, Arc<CachedLogin>>,
    clock: Arc<dyn Clock>,
}

impl SessionCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            api: DashMap::new(),
            dashboard: DashMap::new(),
            clock,
        }
    }

    fn partition(&self, kind: LoginKind) -> &DashMap<String, Arc<CachedLogin>> {
        match kind {
            LoginKind::Api => &self.api,
            LoginKind::Dashboard => &self.dashboard,
        }
    }

    pub fn get(&self, kind: LoginKind, account: &str) -> Option<Arc<CachedLogin>> {
        self.partition(kind)
            .get(account)
            .map(|entry| entry.value().clone())
    }

    /// 缓存登录响应，仅当状态码为 200 且响应体带有 sessionId 时写入
    /// 同一账号的旧条目被整体替换
    pub fn put(&self, kind: LoginKind, account: &str, response: LoginResponse) -> bool {
        if !response.is_cacheable() {
            tracing::debug!(
                "Login response for {}/{} not cached (status {}, session id present: {})",
                kind,
                account,
                response.status_code(),
                response.session_id().is_some()
            );
            return false;
        }

        let entry = CachedLogin::new(response, self.clock.now_millis());
        self.partition(kind)
            .insert(account.to_string(), Arc::new(entry));
        true
    }

    /// 分区快照，按账号排序
    pub fn snapshot(&self, kind: LoginKind) -> Vec<(String, Arc<CachedLogin>)> {
        let mut entries: Vec<(String, Arc<CachedLogin>)> = self
            .partition(kind)
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// 两个分区的全部条目: 先 DASHBOARD 后 API
    pub fn list(&self) -> Vec<(LoginKind, String, Arc<CachedLogin>)> {
        [LoginKind::Dashboard, LoginKind::Api]
            .into_iter()
            .flat_map(|kind| {
                self.snapshot(kind)
                    .into_iter()
                    .map(move |(account, entry)| (kind, account, entry))
            })
            .collect()
    }

    pub fn len(&self, kind: LoginKind) -> usize {
        self.partition(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        self.api.is_empty() && self.dashboard.is_empty()
    }
}
