//! HTTP access for the archiver
//!
//! Everything that talks to the network goes through [`HttpFetch`], so the
//! fetch coordinator and the post feeds can be driven by a stub in tests.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use super::error::{ResourceError, ResourceResult};
use crate::utils::{ERROR_BODY_EXCERPT_LEN, PRIMARY_HOST, USER_AGENT};

/// A successful (2xx) response
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedResponse {
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Request headers as name/value pairs
pub type RequestHeaders = Vec<(&'static str, String)>;

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = ResourceResult<FetchedResponse>> + Send + 'a>>;

/// HTTP GET.
///
/// Implementations must report non-2xx responses as
/// [`ResourceError::HttpStatus`] with an excerpt of the body.
pub trait HttpFetch: Send + Sync {
    fn get<'a>(&'a self, url: &'a str, headers: &'a RequestHeaders) -> FetchFuture<'a>;
}

/// Headers for a request to `url`: the user agent always, the session
/// cookie only when the target is the platform's primary host.
#[must_use]
pub fn request_headers(url: &str, cookie: &str) -> RequestHeaders {
    let mut headers = vec![("user-agent", USER_AGENT.to_string())];
    let is_primary = Url::parse(url)
        .ok()
        .is_some_and(|u| u.host_str() == Some(PRIMARY_HOST) && u.port().is_none());
    if is_primary && !cookie.is_empty() {
        headers.push(("cookie", cookie.to_string()));
    }
    headers
}

/// [`HttpFetch`] backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> ResourceResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResourceError::RequestFailed {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str, headers: &RequestHeaders) -> ResourceResult<FetchedResponse> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let failed = |e: reqwest::Error| ResourceError::RequestFailed {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = request.send().await.map_err(failed)?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResourceError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        let body = response.bytes().await.map_err(failed)?.to_vec();
        Ok(FetchedResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

impl HttpFetch for ReqwestFetcher {
    fn get<'a>(&'a self, url: &'a str, headers: &'a RequestHeaders) -> FetchFuture<'a> {
        Box::pin(self.fetch(url, headers))
    }
}

fn excerpt(body: &str) -> String {
    if body.len() <= ERROR_BODY_EXCERPT_LEN {
        return body.to_string();
    }
    let mut end = ERROR_BODY_EXCERPT_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
