// proxy 模块 - 登录缓存与反向代理

pub mod handlers; // 代理端点处理器
pub mod logon;
pub mod refresh;
pub mod session_cache;
pub mod upstream; // 上游客户端

pub use logon::{LogonRequest, LogonService, LOGIN_TYPE_HEADER};
pub use refresh::{RefreshController, EXPIRATION_WINDOW_MILLIS};
pub use session_cache::SessionCache;
pub use upstream::{UpstreamApi, UpstreamClient, UpstreamError};
