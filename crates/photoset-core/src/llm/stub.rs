//! In-process stand-in for a vision API endpoint, used by the provider tests.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Router;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A request as seen by the stub.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

struct StubState {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
    requests: Mutex<Vec<CapturedRequest>>,
}

/// Serves one canned response on every path of an ephemeral local port.
pub struct StubServer {
    addr: std::net::SocketAddr,
    state: Arc<StubState>,
}

impl StubServer {
    pub async fn spawn(status: u16, body: serde_json::Value) -> Self {
        Self::start(status, body.to_string(), None).await
    }

    pub async fn spawn_raw(status: u16, body: &str) -> Self {
        Self::start(status, body.to_string(), None).await
    }

    pub async fn spawn_delayed(status: u16, body: serde_json::Value, delay: Duration) -> Self {
        Self::start(status, body.to_string(), Some(delay)).await
    }

    async fn start(status: u16, body: String, delay: Option<Duration>) -> Self {
        let state = Arc::new(StubState {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            delay,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(respond).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Absolute URL for `path` on this stub.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn last_request(&self) -> Option<CapturedRequest> {
        self.state.requests.lock().unwrap().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }
}

async fn respond(
    State(state): State<Arc<StubState>>,
    uri: axum::http::Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(&'static str, &'static str); 1], String) {
    let captured = CapturedRequest {
        path: uri.path().to_string(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    };
    state.requests.lock().unwrap().push(captured);

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    (
        state.status,
        [("content-type", "application/json")],
        state.body.clone(),
    )
}
