//! In-process stub of the ChurchMan API for integration tests.
//! Every request is recorded before routing, so tests can assert what went over the wire
//! (or that nothing did).

#![allow(dead_code)]

use std::future::Ready;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;

use churchman::{ApiClient, ClientConfig, SessionStore};

#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Hit>>>);

impl Recorder {
    pub fn hits(&self) -> Vec<Hit> { self.0.lock().clone() }
    pub fn count(&self) -> usize { self.0.lock().len() }
    pub fn last(&self) -> Hit { self.0.lock().last().cloned().expect("no request recorded") }
}

async fn record(State(rec): State<Recorder>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    rec.0.lock().push(Hit {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        authorization: header("authorization"),
        content_type: header("content-type"),
        body: String::from_utf8_lossy(&bytes).to_string(),
    });
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Handler answering every call with the same status and JSON body.
pub fn canned(status: u16, body: Value) -> impl Fn() -> Ready<(StatusCode, Json<Value>)> + Clone + Send + Sync + 'static {
    let status = StatusCode::from_u16(status).expect("valid status");
    move || std::future::ready((status, Json(body.clone())))
}

pub struct StubApi {
    pub base: String,
    pub recorder: Recorder,
    handle: JoinHandle<()>,
}

impl Drop for StubApi {
    fn drop(&mut self) { self.handle.abort(); }
}

impl StubApi {
    /// Serve `routes` on an ephemeral localhost port.
    pub async fn spawn(routes: Router) -> Self {
        let recorder = Recorder::default();
        let app = routes.layer(from_fn_with_state(recorder.clone(), record));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind 127.0.0.1:0");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("stub api error: {e:?}");
            }
        });
        Self { base: format!("http://{}", addr), recorder, handle }
    }

    /// Client with an empty in-memory session pointed at this stub.
    pub fn client(&self) -> ApiClient {
        let cfg = ClientConfig::new(&self.base, "unused-session.json").expect("config");
        ApiClient::new(&cfg, SessionStore::in_memory()).expect("client")
    }

    pub fn calls(&self) -> usize { self.recorder.count() }
}

/// Base URL of a port nothing listens on. Small race window; acceptable for tests.
pub fn dead_base_url() -> String {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("bind 127.0.0.1:0");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Unsigned JWT-shaped token carrying `payload`.
pub fn jwt_with(payload: &Value) -> String {
    use base64::Engine;
    let enc = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!("{}.{}.sig", enc.encode(br#"{"alg":"HS256","typ":"JWT"}"#), enc.encode(payload.to_string()))
}
