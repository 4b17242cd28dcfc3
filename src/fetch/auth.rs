//! [`HttpClient`](super::HttpClient) wrappers that attach credentials or
//! identification to every request.

mod header;
mod url_param;

pub use header::StaticHeader;
pub use url_param::UrlParam;
