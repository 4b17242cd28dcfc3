//! HTTP plumbing shared by the provider adapters.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::debug;

/// `url` without its query string, for logs and error context.
fn redacted(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// Issues a GET for `url` and returns the body.
///
/// Errors carry the URL without its query string: auth wrappers such as
/// [`auth::UrlParam`] put API keys there after the URL was built.
///
/// # Errors
///
/// Fails on an unparsable URL, a transport error or a non-2xx status.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>> {
    let url: reqwest::Url = url
        .parse()
        .with_context(|| format!("invalid url {}", url.split('?').next().unwrap_or(url)))?;
    let target = redacted(&url);
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client
        .execute(req)
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(reqwest::Error::without_url)
        .with_context(|| format!("GET {target}"))?;
    let bytes = resp
        .bytes()
        .await
        .map_err(reqwest::Error::without_url)
        .with_context(|| format!("reading body of {target}"))?
        .to_vec();
    debug!(url = %target, bytes = bytes.len(), "Fetched");
    Ok(bytes)
}

/// Like [`fetch_bytes`] but decodes the body as UTF-8 text, replacing invalid sequences.
pub async fn fetch_text<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<String> {
    let bytes = fetch_bytes(client, url).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_bytes_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let body = fetch_bytes(&BasicClient::new(), &format!("{}/forecast", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, b"[]");
    }

    #[tokio::test]
    async fn test_fetch_bytes_fails_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = fetch_text(&BasicClient::new(), &server.uri()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetch_bytes_rejects_bad_url() {
        assert!(fetch_bytes(&BasicClient::new(), "not a url").await.is_err());
    }

    #[tokio::test]
    async fn test_errors_omit_query_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = format!("{}/forecast?key=abc123", server.uri());
        let err = fetch_bytes(&BasicClient::new(), &url).await.unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("/forecast"), "{text}");
        assert!(!text.contains("abc123"), "{text}");
    }
}
