//! Pluggable HTTP transport used by the language-model client.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// POSTs `body` as JSON and decodes a JSON reply, failing on non-2xx status.
pub async fn post_json<C, B, T>(client: &C, url: &str, body: &B) -> Result<T>
where
    C: HttpClient + ?Sized,
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let mut req = reqwest::Request::new(reqwest::Method::POST, url.parse()?);
    req.headers_mut().insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    *req.body_mut() = Some(serde_json::to_vec(body)?.into());

    let resp = client.execute(req).await.context("request failed")?;
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("endpoint returned status {status}: {body}");
    }

    resp.json().await.context("failed to decode response body")
}
