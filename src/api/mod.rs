use crate::proxy::handlers;
use crate::state::AppState;
use axum::{routing::any, Router};
use std::sync::Arc;

pub mod common;
mod sessions;

/// 诊断接口路径
pub const SESSIONS_PATH: &str = "/sessions";

pub fn build_routes(state: Arc<AppState>) -> Router {
    if state.config.passthrough_only {
        return Router::new()
            .fallback(handlers::forward)
            .with_state(state);
    }

    Router::new()
        // Login interception
        .route(&state.config.login_path(), any(handlers::handle_logon))
        // Diagnostics
        .route(SESSIONS_PATH, any(sessions::list_sessions))
        // Everything else goes straight upstream
        .fallback(handlers::forward)
        .with_state(state)
}
