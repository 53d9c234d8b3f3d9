//! Outbound HTTP.
//!
//! Every network collaborator goes through [`HttpClient`], so feeds, the
//! bike-share and weather lookups, and device pushes can all be exercised
//! against an in-memory client.

mod basic;
mod client;
pub mod auth;
#[cfg(test)]
pub(crate) mod testing;

pub use basic::BasicClient;
pub use client::HttpClient;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::FetchError;

/// GETs `url` and returns the body of a 2xx response.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Bytes, FetchError> {
    let req = Request::new(Method::GET, parse_url(url)?);
    send(client, req).await
}

/// GETs `url` with the given query parameters and decodes a JSON body.
pub async fn get_json<C, T>(client: &C, url: &str, query: &[(&str, String)]) -> Result<T, FetchError>
where
    C: HttpClient + ?Sized,
    T: DeserializeOwned,
{
    let mut url = parse_url(url)?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in query {
            pairs.append_pair(name, value);
        }
    }
    let display_url = url.to_string();

    let bytes = send(client, Request::new(Method::GET, url)).await?;
    serde_json::from_slice(&bytes).map_err(|source| FetchError::Json {
        url: display_url,
        source,
    })
}

/// POSTs `body` as JSON and returns the body of a 2xx response.
pub async fn post_json<C, B>(client: &C, url: &str, body: &B) -> Result<Bytes, FetchError>
where
    C: HttpClient + ?Sized,
    B: Serialize + ?Sized,
{
    let payload = serde_json::to_vec(body).map_err(|source| FetchError::Json {
        url: url.to_string(),
        source,
    })?;

    let mut req = Request::new(Method::POST, parse_url(url)?);
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *req.body_mut() = Some(payload.into());

    send(client, req).await
}

fn parse_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

async fn send<C: HttpClient + ?Sized>(client: &C, req: Request) -> Result<Bytes, FetchError> {
    let url = req.url().to_string();

    let resp = client
        .execute(req)
        .await
        .map_err(|source| FetchError::Request {
            url: url.clone(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(FetchError::Status { url, status, body });
    }

    resp.bytes()
        .await
        .map_err(|source| FetchError::Request { url, source })
}
