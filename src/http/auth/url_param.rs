use crate::http::client::HttpClient;
use async_trait::async_trait;

/// Query parameter Gemini-style endpoints read the API key from.
pub const KEY_PARAM: &str = "key";

/// Authenticates model requests by appending the API key to the URL.
pub struct UrlParam<C> {
    inner: C,
    name: String,
    value: String,
}

impl<C: HttpClient> UrlParam<C> {
    /// `?key=<api_key>`
    pub fn key(inner: C, api_key: impl Into<String>) -> Self {
        Self::new(inner, KEY_PARAM, api_key)
    }

    pub fn new(inner: C, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
            value: value.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for UrlParam<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.url_mut()
            .query_pairs_mut()
            .append_pair(&self.name, &self.value);
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the URL it was asked to fetch and fails the request.
    struct Capture(Mutex<Option<String>>);

    #[async_trait]
    impl HttpClient for Capture {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            *self.0.lock().unwrap() = Some(req.url().to_string());
            reqwest::Client::new()
                .execute(reqwest::Request::new(
                    reqwest::Method::GET,
                    "http://127.0.0.1:9/".parse().unwrap(),
                ))
                .await
        }
    }

    #[tokio::test]
    async fn test_key_is_appended_to_existing_query() {
        let client = UrlParam::key(Capture(Mutex::new(None)), "s3cret");
        let url = "https://example.com/v1/chat/completions?alt=json".parse().unwrap();

        let _ = client
            .execute(reqwest::Request::new(reqwest::Method::POST, url))
            .await;

        let seen = client.inner.0.lock().unwrap().clone().unwrap();
        assert_eq!(seen, "https://example.com/v1/chat/completions?alt=json&key=s3cret");
    }
}
