use crate::http::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiKeyError {
    #[error("invalid header name: {0}")]
    Name(#[from] InvalidHeaderName),
    #[error("invalid header value: {0}")]
    Value(#[from] InvalidHeaderValue),
}

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// The header is validated once at construction, so sending never fails on
/// a malformed key.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self, ApiKeyError> {
        let mut value = HeaderValue::from_str(key)?;
        value.set_sensitive(true);
        Ok(Self {
            inner,
            header_name: HeaderName::from_bytes(header_name.as_bytes())?,
            value,
        })
    }

    /// `Authorization: Bearer <key>`, used by OpenAI-compatible endpoints.
    pub fn bearer(inner: C, key: &str) -> Result<Self, ApiKeyError> {
        Self::new(inner, "Authorization", &format!("Bearer {key}"))
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl HttpClient for Noop {
        async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            unreachable!("not called")
        }
    }

    #[test]
    fn test_rejects_malformed_header() {
        assert!(matches!(ApiKey::new(Noop, "bad header", "k"), Err(ApiKeyError::Name(_))));
        assert!(matches!(ApiKey::bearer(Noop, "line\nbreak"), Err(ApiKeyError::Value(_))));
    }

    #[test]
    fn test_bearer_value() {
        let client = ApiKey::bearer(Noop, "secret").unwrap();
        assert_eq!(client.header_name, "authorization");
        assert_eq!(client.value.to_str().unwrap(), "Bearer secret");
        assert!(client.value.is_sensitive());
    }
}
