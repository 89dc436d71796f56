//! 登录相关数据模型
//! 登录类型、上游登录响应与缓存条目

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 登录类型，决定使用哪一个缓存分区
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoginKind {
    Api,
    Dashboard,
}

impl LoginKind {
    /// 请求未携带 `login-type` 头时使用的类型
    pub const DEFAULT: LoginKind = LoginKind::Dashboard;

    pub fn as_str(&self) -> &'static str {
        match self {
            LoginKind::Api => "API",
            LoginKind::Dashboard => "DASHBOARD",
        }
    }
}

impl fmt::Display for LoginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 无法识别的登录类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLoginKind(pub String);

impl FromStr for LoginKind {
    type Err = UnknownLoginKind;

    // Existing clients send lowercase values, so matching ignores case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("api") {
            Ok(LoginKind::Api)
        } else if s.eq_ignore_ascii_case("dashboard") {
            Ok(LoginKind::Dashboard)
        } else {
            Err(UnknownLoginKind(s.to_string()))
        }
    }
}

/// 上游登录响应 (构造后不可变)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(serialize_with = "serialize_status")]
    status_code: StatusCode,
    #[serde(serialize_with = "serialize_body")]
    body: Bytes,
    #[serde(serialize_with = "serialize_headers")]
    headers: HeaderMap,
    #[serde(skip)]
    session_id: Option<String>,
}

impl LoginResponse {
    pub fn new(status_code: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        let session_id = extract_session_id(&body);
        Self {
            status_code,
            body,
            headers,
            session_id,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// 响应体中的 `sessionId` (仅非空字符串)
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// 只有状态码 200 且带有会话 ID 的响应才允许进入缓存
    pub fn is_cacheable(&self) -> bool {
        self.status_code == StatusCode::OK && self.session_id.is_some()
    }
}

fn extract_session_id(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("sessionId")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// 缓存条目: 登录响应 + 捕获时间 (毫秒)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedLogin {
    login_response: LoginResponse,
    captured_at_millis: i64,
}

impl CachedLogin {
    pub fn new(login_response: LoginResponse, captured_at_millis: i64) -> Self {
        Self {
            login_response,
            captured_at_millis,
        }
    }

    pub fn response(&self) -> &LoginResponse {
        &self.login_response
    }

    pub fn captured_at_millis(&self) -> i64 {
        self.captured_at_millis
    }
}

fn serialize_status<S: Serializer>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

// Bodies are shown as JSON when they parse, otherwise as text.
fn serialize_body<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => value.serialize(serializer),
        Err(_) => serializer.serialize_str(&String::from_utf8_lossy(body)),
    }
}

fn serialize_headers<S: Serializer>(
    headers: &HeaderMap,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map: BTreeMap<&str, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.entry(name.as_str())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    map.serialize(serializer)
}
