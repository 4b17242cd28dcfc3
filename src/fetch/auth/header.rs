use crate::fetch::client::HttpClient;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, USER_AGENT};

/// An [`HttpClient`] wrapper that sets a fixed HTTP header on every request.
///
/// MET Norway rejects requests without an identifying `User-Agent`; the MSN
/// scrape sends the same one.
pub struct StaticHeader<C> {
    inner: C,
    name: HeaderName,
    value: HeaderValue,
}

impl<C> StaticHeader<C> {
    /// Identifies the caller with `User-Agent: <agent>`.
    ///
    /// # Errors
    ///
    /// Fails if `agent` is not valid HTTP header text.
    pub fn user_agent(inner: C, agent: &str) -> Result<Self> {
        Ok(Self {
            inner,
            name: USER_AGENT,
            value: HeaderValue::from_str(agent)?,
        })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for StaticHeader<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}
