use async_trait::async_trait;
use reqwest::{Request, Response};

/// Minimal request executor, so adapters can be wrapped with auth layers
/// and pointed at mock servers in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
