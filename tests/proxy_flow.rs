use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{delete, post},
    Json, Router,
};
use logon_cache_proxy::api::build_routes;
use logon_cache_proxy::core::models::{LoginKind, ProxyConfig};
use logon_cache_proxy::core::ManualClock;
use logon_cache_proxy::proxy::EXPIRATION_WINDOW_MILLIS;
use logon_cache_proxy::state::AppState;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const T0: i64 = 1_700_000_000_000;

/// 上游 BI 服务替身
#[derive(Default)]
struct Recorder {
    logins: AtomicUsize,
    login_queries: Mutex<Vec<Option<String>>>,
    deleted: Mutex<Vec<String>>,
}

impl Recorder {
    fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

async fn fake_login(
    State(rec): State<Arc<Recorder>>,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    let n = rec.logins.fetch_add(1, Ordering::SeqCst) + 1;
    rec.login_queries
        .lock()
        .unwrap()
        .push(uri.query().map(|q| q.to_string()));

    if body["accountName"] == "denied" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "bad credentials"})),
        )
            .into_response();
    }
    Json(json!({"sessionId": format!("s{}", n), "accountName": body["accountName"]}))
        .into_response()
}

async fn fake_delete_session(
    State(rec): State<Arc<Recorder>>,
    Query(params): Query<HashMap<String, String>>,
) -> StatusCode {
    if let Some(id) = params.get("sessionId") {
        rec.deleted.lock().unwrap().push(id.clone());
    }
    StatusCode::NO_CONTENT
}

async fn fake_echo(method: Method, uri: Uri, body: Bytes) -> Response {
    (
        StatusCode::CREATED,
        [("x-upstream", "echo")],
        Json(json!({
            "method": method.as_str(),
            "uri": uri.to_string(),
            "body": String::from_utf8_lossy(&body),
        })),
    )
        .into_response()
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn start_upstream() -> (SocketAddr, Arc<Recorder>) {
    let rec = Arc::new(Recorder::default());
    let app = Router::new()
        .route("/dundas/Api/LogOn", post(fake_login))
        .route("/dundas/Api/Session/Current", delete(fake_delete_session))
        .fallback(fake_echo)
        .with_state(rec.clone());
    (spawn(app).await, rec)
}

struct Harness {
    base: String,
    recorder: Arc<Recorder>,
    clock: Arc<ManualClock>,
    state: Arc<AppState>,
    client: reqwest::Client,
}

impl Harness {
    async fn start() -> Self {
        Self::start_with(|config| config).await
    }

    async fn start_with(configure: impl FnOnce(ProxyConfig) -> ProxyConfig) -> Self {
        let (upstream_addr, recorder) = start_upstream().await;
        let config = configure(
            ProxyConfig::new(&format!("http://{}/dundas", upstream_addr), 0).unwrap(),
        );
        let clock = Arc::new(ManualClock::new(T0));
        let state = Arc::new(AppState::with_clock(config, clock.clone()).unwrap());
        let addr = spawn(build_routes(state.clone())).await;

        Self {
            base: format!("http://{}", addr),
            recorder,
            clock,
            state,
            client: reqwest::Client::new(),
        }
    }

    async fn login(&self, login_type: Option<&str>, account: &str) -> (StatusCode, Value) {
        let mut request = self
            .client
            .post(format!("{}/dundas/Api/LogOn", self.base))
            .json(&json!({"accountName": account, "password": "secret"}));
        if let Some(t) = login_type {
            request = request.header("login-type", t);
        }
        let resp = request.send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }
}

#[tokio::test]
async fn test_second_login_within_window_is_cached() {
    let h = Harness::start().await;

    let (status, first) = h.login(Some("api"), "acme").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["sessionId"], "s1");

    h.clock.advance(Duration::from_secs(35 * 3600));
    let (status, second) = h.login(Some("api"), "acme").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second, first);
    assert_eq!(h.recorder.logins(), 1);
    assert!(h.recorder.deleted().is_empty());
}

#[tokio::test]
async fn test_expired_login_deletes_session_and_relogs() {
    let h = Harness::start().await;

    let (_, first) = h.login(Some("api"), "acme").await;
    assert_eq!(first["sessionId"], "s1");

    h.clock
        .advance(Duration::from_millis(EXPIRATION_WINDOW_MILLIS as u64 + 1));
    let (status, second) = h.login(Some("api"), "acme").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["sessionId"], "s2");
    assert_eq!(h.recorder.deleted(), vec!["s1".to_string()]);
    assert_eq!(h.recorder.logins(), 2);

    let cached = h.state.sessions().get(LoginKind::Api, "acme").unwrap();
    assert_eq!(cached.response().session_id(), Some("s2"));
}

#[tokio::test]
async fn test_sessions_listing_shows_partitions() {
    let h = Harness::start().await;
    h.login(Some("api"), "acme").await;

    let listing: Value = h
        .client
        .get(format!("{}/sessions", h.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let dashboard = listing[0].as_array().unwrap();
    let api = listing[1].as_array().unwrap();
    assert!(dashboard.is_empty());
    assert_eq!(api.len(), 1);
    assert_eq!(api[0][0], "acme");
    assert_eq!(api[0][1]["loginResponse"]["statusCode"], 200);
    assert_eq!(api[0][1]["loginResponse"]["body"]["sessionId"], "s1");
    assert_eq!(api[0][1]["capturedAtMillis"], T0);
}

#[tokio::test]
async fn test_missing_login_type_uses_dashboard_partition() {
    let h = Harness::start().await;
    let (status, _) = h.login(None, "acme").await;
    assert_eq!(status, StatusCode::OK);

    assert!(h.state.sessions().get(LoginKind::Dashboard, "acme").is_some());
    assert!(h.state.sessions().get(LoginKind::Api, "acme").is_none());

    // 另一个分区需要单独登录
    h.login(Some("api"), "acme").await;
    assert_eq!(h.recorder.logins(), 2);
}

#[tokio::test]
async fn test_unrelated_path_is_forwarded_verbatim() {
    let h = Harness::start().await;

    let resp = h
        .client
        .post(format!("{}/reports/run?id=7", h.base))
        .body("hello")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(resp.headers()["x-upstream"], "echo");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["method"], "POST");
    assert_eq!(body["uri"], "/reports/run?id=7");
    assert_eq!(body["body"], "hello");

    assert_eq!(h.recorder.logins(), 0);
    assert!(h.state.sessions().is_empty());
}

#[tokio::test]
async fn test_login_query_is_forwarded() {
    let h = Harness::start().await;
    let resp = h
        .client
        .post(format!("{}/dundas/Api/LogOn?culture=en-US", h.base))
        .json(&json!({"accountName": "acme"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let queries = h.recorder.login_queries.lock().unwrap().clone();
    assert_eq!(queries, vec![Some("culture=en-US".to_string())]);
}

#[tokio::test]
async fn test_validation_errors_use_error_envelope() {
    let h = Harness::start().await;

    let (status, body) = h.login(Some("foo"), "acme").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Unknown login-type: foo."}));

    let (status, body) = h.login(Some("api"), "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Missing accountName in login body object"}));

    assert_eq!(h.recorder.logins(), 0);
}

#[tokio::test]
async fn test_failed_login_is_forwarded_not_cached() {
    let h = Harness::start().await;

    let (status, body) = h.login(Some("api"), "denied").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "bad credentials");

    let (status, _) = h.login(Some("api"), "denied").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(h.recorder.logins(), 2);
    assert!(h.state.sessions().is_empty());
}

#[tokio::test]
async fn test_passthrough_only_never_caches() {
    let h = Harness::start_with(|config| config.with_passthrough_only(true)).await;

    h.login(Some("api"), "acme").await;
    h.login(Some("api"), "acme").await;
    assert_eq!(h.recorder.logins(), 2);
    assert!(h.state.sessions().is_empty());

    // /sessions 也直接转发到上游
    let resp = h
        .client
        .get(format!("{}/sessions", h.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-upstream"], "echo");
}

#[tokio::test]
async fn test_unreachable_upstream_yields_500_envelope() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let config = ProxyConfig::new(&format!("http://{}/dundas", dead), 0).unwrap();
    let state = Arc::new(AppState::new(config).unwrap());
    let addr = spawn(build_routes(state)).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{}/anything", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().is_some_and(|m| !m.is_empty()));

    let resp = client
        .post(format!("http://{}/dundas/Api/LogOn", addr))
        .header("login-type", "api")
        .json(&json!({"accountName": "acme"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().is_some());
}
