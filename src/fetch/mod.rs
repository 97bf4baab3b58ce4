//! HTTP plumbing for pulling history payloads.

mod auth;
mod basic;

pub use auth::ApiKey;
pub use basic::BasicClient;

use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, Request, Response, Url};

/// Sends prepared requests. Wrappers such as [`ApiKey`] decorate an inner
/// client to add credentials.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// A [`BasicClient`], wrapped with a bearer credential when `token` is set.
pub fn client_with_token(token: Option<&str>) -> Result<Box<dyn HttpClient>> {
    let basic = BasicClient::new()?;
    Ok(match token {
        Some(token) => Box::new(ApiKey::bearer(basic, token)?),
        None => Box::new(basic),
    })
}

/// Whether `url` sits under `base`: same scheme, host and port, and a path
/// equal to `base`'s or below it on a `/` boundary. Unparsable input is
/// never under anything.
pub fn is_under_base(base: &str, url: &str) -> bool {
    let (Ok(base), Ok(url)) = (Url::parse(base), Url::parse(url)) else {
        return false;
    };
    if base.host_str().is_none()
        || base.scheme() != url.scheme()
        || base.host_str() != url.host_str()
        || base.port_or_known_default() != url.port_or_known_default()
    {
        return false;
    }

    let prefix = base.path().trim_end_matches('/');
    prefix.is_empty()
        || url
            .path()
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// `token` if `url` belongs to the API at `api_url`, otherwise `None`.
pub fn token_for<'a>(api_url: Option<&str>, url: &str, token: Option<&'a str>) -> Option<&'a str> {
    api_url.filter(|base| is_under_base(base, url)).and(token)
}

/// GETs `url` and returns the body, failing on any non-2xx status.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>> {
    let mut req = Request::new(Method::GET, url.parse()?);
    req.headers_mut()
        .insert(ACCEPT, HeaderValue::from_static("application/json"));

    let resp = client.execute(req).await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("GET {} returned status {}: {}", url, status, body);
    }

    Ok(resp.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const API: &str = "https://gas.example.com/api";

    #[test]
    fn test_urls_under_api_base() {
        assert!(is_under_base(API, "https://gas.example.com/api"));
        assert!(is_under_base(API, "https://gas.example.com/api/tanks/1/history"));
        assert!(is_under_base("https://gas.example.com/api/", "https://gas.example.com/api/h.json"));
        assert!(is_under_base("https://GAS.example.com", "https://gas.example.com/any/path"));
        assert!(is_under_base("https://gas.example.com", "https://gas.example.com:443/h.json"));
    }

    #[test]
    fn test_look_alike_urls_are_not_under_api_base() {
        assert!(!is_under_base("https://gas.example.com", "https://gas.example.com.evil.net/h.json"));
        assert!(!is_under_base(API, "https://gas.example.com/api-evil/h.json"));
        assert!(!is_under_base(API, "https://gas.example.com/other/h.json"));
        assert!(!is_under_base(API, "http://gas.example.com/api/h.json"));
        assert!(!is_under_base(API, "https://gas.example.com:8443/api/h.json"));
        assert!(!is_under_base(API, "https://evil.net/?u=https://gas.example.com/api"));
        assert!(!is_under_base(API, "not a url"));
        assert!(!is_under_base("not a url", API));
    }

    #[test]
    fn test_token_only_for_api_urls() {
        let token = Some("secret");
        assert_eq!(token_for(Some(API), "https://gas.example.com/api/tanks/1/history", token), token);
        assert_eq!(token_for(Some("https://gas.example.com"), "https://gas.example.com.evil.net/h.json", token), None);
        assert_eq!(token_for(None, "https://gas.example.com/api/h.json", token), None);
        assert_eq!(token_for(Some(API), "https://gas.example.com/api/h.json", None), None);
    }
}
