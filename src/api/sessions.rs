use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
};
use std::sync::Arc;

use super::common::{error_response, pretty_json};
use crate::core::models::{CachedLogin, LoginKind};
use crate::state::AppState;

/// 诊断接口: `[[dashboard 条目], [api 条目]]`，每个条目为 `[account, entry]`
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Response {
    let cache = state.logon.cache();
    let dashboard = cache.snapshot(LoginKind::Dashboard);
    let api = cache.snapshot(LoginKind::Api);
    tracing::debug!(
        "Listing cached sessions: {} dashboard, {} api",
        dashboard.len(),
        api.len()
    );

    let listing = [pairs(&dashboard), pairs(&api)];
    match serde_json::to_string_pretty(&listing) {
        Ok(body) => pretty_json(StatusCode::OK, body),
        Err(e) => error_response(&e.to_string()),
    }
}

fn pairs(entries: &[(String, Arc<CachedLogin>)]) -> Vec<(&str, &CachedLogin)> {
    entries
        .iter()
        .map(|(account, entry)| (account.as_str(), entry.as_ref()))
        .collect()
}
