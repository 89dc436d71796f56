// 透明转发 - 所有非登录流量原样发往上游，不经过缓存
use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::ProxyError;
use crate::state::AppState;

pub async fn forward(State(state): State<Arc<AppState>>, request: Request) -> Response {
    match state.upstream.forward(request).await {
        Ok(response) => response,
        Err(e) => ProxyError::from(e).into_response(),
    }
}
