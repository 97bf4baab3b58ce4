use super::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that sets one credential header on every
/// request.
///
/// The session token is handed in at construction; nothing is read from
/// global state.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    /// Sends `key` verbatim in `header_name`.
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .with_context(|| format!("invalid header name '{header_name}'"))?;
        let mut value = HeaderValue::from_str(key).context("credential is not a valid header value")?;
        value.set_sensitive(true);

        Ok(Self {
            inner,
            header_name,
            value,
        })
    }

    /// `Authorization: Bearer <token>`, as the dashboard backend expects.
    pub fn bearer(inner: C, token: &str) -> Result<Self> {
        Self::new(inner, AUTHORIZATION.as_str(), &format!("Bearer {token}"))
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

    struct NoopClient;

    #[test]
    fn test_bearer_header() {
        let auth = ApiKey::bearer(NoopClient, "abc123").unwrap();
        assert_eq!(auth.header_name, AUTHORIZATION);
        assert_eq!(auth.value.to_str().unwrap(), "Bearer abc123");
        assert!(auth.value.is_sensitive());
    }

    #[test]
    fn test_custom_header() {
        let auth = ApiKey::new(NoopClient, "X-Api-Key", "k").unwrap();
        assert_eq!(auth.header_name.as_str(), "x-api-key");
    }

    #[test]
    fn test_invalid_header_inputs_are_errors() {
        assert!(ApiKey::new(NoopClient, "bad header", "k").is_err());
        assert!(ApiKey::bearer(NoopClient, "line\nbreak").is_err());
    }
}
