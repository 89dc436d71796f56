use crate::core::models::ProxyConfig;
use crate::core::{Clock, SystemClock};
use crate::proxy::{LogonService, SessionCache, UpstreamClient, UpstreamError};
use std::sync::Arc;

/// Web 应用状态
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub logon: LogonService,
    pub upstream: Arc<UpstreamClient>,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Result<Self, UpstreamError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ProxyConfig, clock: Arc<dyn Clock>) -> Result<Self, UpstreamError> {
        let config = Arc::new(config);
        let upstream = Arc::new(UpstreamClient::new(config.clone())?);

        // Both partitions start empty and live as long as the process.
        let sessions = Arc::new(SessionCache::new(clock.clone()));
        let logon = LogonService::new(sessions, upstream.clone(), clock);

        Ok(Self {
            config,
            logon,
            upstream,
        })
    }

    pub fn sessions(&self) -> &Arc<SessionCache> {
        self.logon.cache()
    }
}
