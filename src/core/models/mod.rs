//! 核心数据模型
//! 不依赖 HTTP 框架状态的数据结构定义

mod login;
mod proxy_config;

pub use login::{CachedLogin, LoginKind, LoginResponse, UnknownLoginKind};
pub use proxy_config::{ConfigError, ProxyConfig, LOGON_SUFFIX, SESSION_CURRENT_SUFFIX};
