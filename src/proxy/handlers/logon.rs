// Logon Handler
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use std::sync::Arc;

use crate::core::models::LoginResponse;
use crate::error::ProxyError;
use crate::proxy::logon::{LogonRequest, LOGIN_TYPE_HEADER};
use crate::proxy::upstream::client::strip_hop_by_hop;
use crate::state::AppState;

pub async fn handle_logon(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match parse_request(method, &uri, &headers, &body) {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };

    match state.logon.handle(request).await {
        Ok(response) => response.into_response(),
        Err(e) => e.into_response(),
    }
}

/// 在边界上确定 header / query / body 是否存在
fn parse_request(
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<LogonRequest, ProxyError> {
    let login_type = headers
        .get(LOGIN_TYPE_HEADER)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

    let body = if body.iter().all(|b| b.is_ascii_whitespace()) {
        None
    } else {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| ProxyError::Validation(format!("Invalid JSON login body: {}", e)))?;
        Some(value)
    };

    Ok(LogonRequest {
        method,
        query: uri.query().filter(|q| !q.is_empty()).map(|q| q.to_string()),
        login_type,
        body,
    })
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        let mut headers = self.headers().clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(header::CONTENT_LENGTH);

        let mut response = Response::new(Body::from(self.body().clone()));
        *response.status_mut() = self.status_code();
        *response.headers_mut() = headers;
        response
    }
}
