// Upstream 客户端 - 登录、注销会话与透明转发
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderName, Method};
use axum::response::Response;
use std::sync::Arc;

use super::{LoginForward, UpstreamApi, UpstreamError};
use crate::core::models::{LoginResponse, ProxyConfig};

/// 逐跳头, 不在代理两侧之间传递
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

pub struct UpstreamClient {
    http: reqwest::Client,
    config: Arc<ProxyConfig>,
}

impl UpstreamClient {
    pub fn new(config: Arc<ProxyConfig>) -> Result<Self, UpstreamError> {
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = config.upstream_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    /// 发送请求并完整读取响应
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<LoginResponse, UpstreamError> {
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(LoginResponse::new(status, headers, body))
    }

    /// 透明转发: 保留方法、路径、查询串和请求体, 响应体以流的形式返回
    pub async fn forward(&self, request: Request) -> Result<Response, UpstreamError> {
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = self.config.forward_url(path_and_query)?;

        let body = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(UpstreamError::RequestBody)?;

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);

        tracing::debug!("Forwarding {} {}", parts.method, url);

        let upstream = self
            .http
            .request(parts.method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

#[async_trait]
impl UpstreamApi for UpstreamClient {
    async fn login(&self, request: LoginForward) -> Result<LoginResponse, UpstreamError> {
        let url = self.config.login_url(request.query.as_deref());
        let mut builder = self.http.request(request.method, url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        self.send(builder).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<LoginResponse, UpstreamError> {
        let url = self.config.delete_session_url(session_id);
        self.send(self.http.request(Method::DELETE, url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::CONTENT_TYPE));
    }

    #[test]
    fn test_client_builds_with_timeout() {
        let config = ProxyConfig::new("http://127.0.0.1:9", 0)
            .unwrap()
            .with_upstream_timeout(Some(std::time::Duration::from_secs(5)));
        assert!(UpstreamClient::new(Arc::new(config)).is_ok());
    }
}
