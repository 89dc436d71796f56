use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// 错误响应包装: `{"error": "<message>"}`
#[derive(Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
}

/// 统一错误响应: 500 + 格式化 JSON
pub fn error_response(message: &str) -> Response {
    let body = serde_json::to_string_pretty(&ErrorBody { error: message })
        .unwrap_or_else(|_| String::from(r#"{"error": "internal error"}"#));
    pretty_json(StatusCode::INTERNAL_SERVER_ERROR, body)
}

pub fn pretty_json(status: StatusCode, body: String) -> Response {
    (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )],
        body,
    )
        .into_response()
}

pub async fn request_logger(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = std::time::Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed();
    tracing::info!(
        "{} {} - status: {}, latency: {}ms",
        method,
        uri,
        response.status(),
        duration.as_millis()
    );
    response
}
