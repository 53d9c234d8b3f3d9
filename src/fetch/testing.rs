//! In-memory [`HttpClient`] for unit tests.

use super::HttpClient;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Serves canned responses keyed by URL (query string ignored) and records
/// every request. Unregistered URLs answer 404.
#[derive(Default)]
pub(crate) struct MockClient {
    routes: Vec<(String, u16, Vec<u8>)>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        let key = route_key(&Url::parse(url).expect("valid mock url"));
        self.routes.push((key, status, body.into()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        let key = route_key(&Url::parse(url).expect("valid mock url"));
        self.requests()
            .iter()
            .filter(|r| route_key(&Url::parse(&r.url).unwrap()) == key)
            .count()
    }
}

fn route_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

#[async_trait]
impl HttpClient for MockClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let key = route_key(req.url());
        self.requests.lock().unwrap().push(RecordedRequest {
            method: req.method().clone(),
            url: req.url().to_string(),
            headers: req.headers().clone(),
            body: req.body().and_then(|b| b.as_bytes()).map(<[u8]>::to_vec),
        });

        let (status, body) = self
            .routes
            .iter()
            .find(|(url, _, _)| *url == key)
            .map(|(_, status, body)| (*status, body.clone()))
            .unwrap_or((404, Vec::new()));

        let response = http::Response::builder()
            .status(status)
            .body(body)
            .expect("valid mock response");
        Ok(reqwest::Response::from(response))
    }
}
