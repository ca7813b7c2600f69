#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, Response, StatusCode},
};
use bytes::Bytes;
use serde_json::Value;
use tokio::sync::Barrier;
use url::Url;

use storegate::application::gateway::{StoreGateway, UpstreamCredentials, UpstreamEndpoints};
use storegate::application::upstream::{
    Upstream, UpstreamError, UpstreamRequest, UpstreamResponse,
};
use storegate::cache::{CacheConfig, Clock, ManualClock};
use storegate::infra::documents::FsDocumentStore;
use storegate::infra::http::{AppState, build_router};

/// Canned reply for requests whose URL path ends with `suffix`.
#[derive(Clone)]
struct Route {
    method: Method,
    suffix: String,
    reply: Reply,
}

#[derive(Clone)]
enum Reply {
    Json(StatusCode, Value),
    Text(StatusCode, String),
    Timeout,
}

/// In-memory upstream recording every request it sees.
#[derive(Default)]
pub struct FakeUpstream {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<UpstreamRequest>>,
    barrier: Mutex<Option<Arc<Barrier>>>,
}

impl FakeUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn json(&self, method: Method, suffix: &str, status: StatusCode, body: Value) {
        self.push(method, suffix, Reply::Json(status, body));
    }

    pub fn text(&self, method: Method, suffix: &str, status: StatusCode, body: &str) {
        self.push(method, suffix, Reply::Text(status, body.to_string()));
    }

    pub fn timeout(&self, method: Method, suffix: &str) {
        self.push(method, suffix, Reply::Timeout);
    }

    /// Hold every request until `parties` requests are in flight.
    pub fn rendezvous(&self, parties: usize) {
        *self.barrier.lock().expect("barrier lock") = Some(Arc::new(Barrier::new(parties)));
    }

    pub fn calls(&self) -> Vec<UpstreamRequest> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    fn push(&self, method: Method, suffix: &str, reply: Reply) {
        // Newest route wins so a test can change an answer midway.
        self.routes.lock().expect("routes lock").insert(
            0,
            Route {
                method,
                suffix: suffix.to_string(),
                reply,
            },
        );
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        self.calls.lock().expect("calls lock").push(request.clone());

        let barrier = self.barrier.lock().expect("barrier lock").clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }

        let reply = self
            .routes
            .lock()
            .expect("routes lock")
            .iter()
            .find(|route| route.method == request.method && request.url.path().ends_with(&route.suffix))
            .map(|route| route.reply.clone());

        match reply {
            Some(Reply::Json(status, body)) => Ok(UpstreamResponse {
                status,
                content_type: Some("application/json".to_string()),
                body: Bytes::from(body.to_string()),
            }),
            Some(Reply::Text(status, body)) => Ok(UpstreamResponse {
                status,
                content_type: Some("text/html".to_string()),
                body: Bytes::from(body),
            }),
            Some(Reply::Timeout) => Err(UpstreamError::Timeout),
            None => Ok(UpstreamResponse {
                status: StatusCode::NOT_FOUND,
                content_type: Some("application/json".to_string()),
                body: Bytes::from_static(br#"{"code":"rest_no_route","message":"No route"}"#),
            }),
        }
    }
}

pub struct Harness {
    pub router: Router,
    pub state: AppState,
    pub upstream: Arc<FakeUpstream>,
    pub clock: Arc<ManualClock>,
}

pub struct HarnessBuilder {
    credentials: bool,
    cache: CacheConfig,
    documents: PathBuf,
    document_max_age: Duration,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            credentials: true,
            cache: CacheConfig::default(),
            documents: PathBuf::from("documents"),
            document_max_age: Duration::from_secs(3600),
        }
    }
}

impl HarnessBuilder {
    pub fn without_credentials(mut self) -> Self {
        self.credentials = false;
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn documents(mut self, root: PathBuf) -> Self {
        self.documents = root;
        self
    }

    pub fn build(self) -> Harness {
        let upstream = FakeUpstream::new();
        let clock = Arc::new(ManualClock::default());
        let endpoints = UpstreamEndpoints {
            store_url: Url::parse("https://shop.test").expect("store url"),
            api_prefix: "wc/v3".to_string(),
            jwt_base_url: Url::parse("https://id.test").expect("jwt url"),
            credentials: self
                .credentials
                .then(|| UpstreamCredentials::new("ck_test", "cs_test")),
        };
        let gateway = Arc::new(StoreGateway::new(upstream.clone(), endpoints));
        let state = AppState::new(
            gateway,
            self.cache,
            clock.clone() as Arc<dyn Clock>,
            Arc::new(FsDocumentStore::new(self.documents)),
            self.document_max_age,
        );
        Harness {
            router: build_router(state.clone()),
            state,
            upstream,
            clock,
        }
    }
}

pub fn harness() -> Harness {
    HarnessBuilder::default().build()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body")
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}
