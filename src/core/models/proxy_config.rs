//! 代理服务配置

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// 上游登录接口相对于 base path 的路径
pub const LOGON_SUFFIX: &str = "/Api/LogOn";

/// 上游注销当前会话的接口
pub const SESSION_CURRENT_SUFFIX: &str = "/Api/Session/Current";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid upstream url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported upstream scheme '{0}', expected http or https")]
    UnsupportedScheme(String),
    #[error("upstream url '{0}' has no host")]
    MissingHost(String),
    #[error("upstream base path '{0}' cannot be routed (contains ':' or '*')")]
    UnroutableBasePath(String),
}

/// 反代服务配置
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// 上游 BI 服务地址 (path 部分作为 base path)
    upstream: Url,

    /// 不带末尾斜杠的 base path, 根路径时为空串
    base_path: String,

    /// 监听地址
    pub bind: IpAddr,

    /// 监听端口
    pub port: u16,

    /// 上游请求超时, None 表示不设超时
    pub upstream_timeout: Option<Duration>,

    /// 仅做透明转发，不拦截登录
    pub passthrough_only: bool,
}

impl ProxyConfig {
    pub fn new(upstream: &str, port: u16) -> Result<Self, ConfigError> {
        let url = Url::parse(upstream).map_err(|source| ConfigError::InvalidUrl {
            url: upstream.to_string(),
            source,
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
        if url.host_str().is_none() {
            return Err(ConfigError::MissingHost(upstream.to_string()));
        }

        let base_path = url.path().trim_end_matches('/').to_string();
        if base_path.contains(':') || base_path.contains('*') {
            return Err(ConfigError::UnroutableBasePath(base_path));
        }

        Ok(Self {
            upstream: url,
            base_path,
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port,
            upstream_timeout: None,
            passthrough_only: false,
        })
    }

    pub fn with_bind(mut self, bind: IpAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn with_passthrough_only(mut self, passthrough_only: bool) -> Self {
        self.passthrough_only = passthrough_only;
        self
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn upstream(&self) -> &Url {
        &self.upstream
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// 本地拦截的登录路径: `{base_path}/Api/LogOn`
    pub fn login_path(&self) -> String {
        format!("{}{}", self.base_path, LOGON_SUFFIX)
    }

    /// `scheme://host[:port]`，透明转发时拼接原始 path 与 query
    pub fn origin(&self) -> String {
        self.upstream.origin().ascii_serialization()
    }

    pub fn login_url(&self, query: Option<&str>) -> Url {
        let mut url = self.upstream.clone();
        url.set_path(&self.login_path());
        url.set_query(query.filter(|q| !q.is_empty()));
        url.set_fragment(None);
        url
    }

    pub fn delete_session_url(&self, session_id: &str) -> Url {
        let mut url = self.upstream.clone();
        url.set_path(&format!("{}{}", self.base_path, SESSION_CURRENT_SUFFIX));
        url.set_fragment(None);
        url.query_pairs_mut()
            .clear()
            .append_pair("sessionId", session_id);
        url
    }

    /// 透明转发目标地址
    pub fn forward_url(&self, path_and_query: &str) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}{}", self.origin(), path_and_query))
    }
}
