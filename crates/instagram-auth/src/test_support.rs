//! In-process stand-in for the Instagram endpoints
//!
//! Binds an axum server on `127.0.0.1:0` that answers canned JSON per path
//! and records every request it receives, so tests can assert on the exact
//! query string and form body that went over the wire.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::net::TcpListener;
use url::Url;

use crate::flow::Endpoints;

/// One canned response, matched on request path.
#[derive(Clone)]
pub(crate) struct Route {
    pub path: &'static str,
    pub status: StatusCode,
    pub body: String,
}

impl Route {
    pub fn json(path: &'static str, status: StatusCode, body: serde_json::Value) -> Self {
        Self {
            path,
            status,
            body: body.to_string(),
        }
    }

    pub fn text(path: &'static str, status: StatusCode, body: &str) -> Self {
        Self {
            path,
            status,
            body: body.to_owned(),
        }
    }
}

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub accept: Option<String>,
}

impl Recorded {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        lookup(&self.query, key)
    }

    pub fn form_value(&self, key: &str) -> Option<&str> {
        lookup(&self.form, key)
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

pub(crate) struct MockProvider {
    pub base: Url,
    requests: Arc<Mutex<Vec<Recorded>>>,
    _server: tokio::task::JoinHandle<()>,
}

impl MockProvider {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base = Url::parse(&format!("http://{addr}")).unwrap();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();
        let routes = Arc::new(routes);

        let server = tokio::spawn(async move {
            let app = axum::Router::new().fallback(move |request: Request<Body>| {
                let log = log.clone();
                let routes = routes.clone();
                async move {
                    let method = request.method().to_string();
                    let path = request.uri().path().to_string();
                    let query = request.uri().query().map(decode_pairs).unwrap_or_default();
                    let accept = request
                        .headers()
                        .get(axum::http::header::ACCEPT)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_owned);
                    let body = axum::body::to_bytes(request.into_body(), 1024 * 1024)
                        .await
                        .unwrap();
                    let form = decode_pairs(&String::from_utf8_lossy(&body));

                    log.lock().unwrap().push(Recorded {
                        method,
                        path: path.clone(),
                        query,
                        form,
                        accept,
                    });

                    match routes.iter().find(|route| route.path == path) {
                        Some(route) => (
                            route.status,
                            [(axum::http::header::CONTENT_TYPE, "application/json")],
                            route.body.clone(),
                        ),
                        None => (
                            StatusCode::NOT_FOUND,
                            [(axum::http::header::CONTENT_TYPE, "application/json")],
                            String::from(r#"{"error":{"message":"no such route"}}"#),
                        ),
                    }
                }
            });
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base,
            requests,
            _server: server,
        }
    }

    pub fn url(&self, path: &str) -> Url {
        self.base.join(path).unwrap()
    }

    /// Endpoints pointing at this server, one distinct path per endpoint.
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            authorize: self.url("/oauth/authorize"),
            token: self.url("/oauth/access_token"),
            long_lived_token: self.url("/access_token"),
            profile: self.url("/me"),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn single_request(&self) -> Recorded {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request: {requests:?}");
        requests.into_iter().next().unwrap()
    }
}

fn decode_pairs(raw: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}
