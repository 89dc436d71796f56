// Handlers 模块 - 代理端点处理器

pub mod logon;
pub mod passthrough;

pub use logon::handle_logon;
pub use passthrough::forward;
