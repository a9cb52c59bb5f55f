//! Fetch wrapper that resolves app-relative paths against the local origin.
//!
//! Targets starting with `/` are rewritten onto the platform's local origin;
//! everything else goes to the network primitive untouched. Timeouts, retries
//! and error reporting are whatever the primitive provides.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::errors::ServiceError;

/// Platform identifier the webview reports on Windows.
pub const WINDOWS_PLATFORM: &str = "win32";
/// Local origin used on Windows, where custom schemes are served over https.
pub const WINDOWS_ORIGIN: &str = "https://ace.localhost";
/// Local origin used on every other platform.
pub const CUSTOM_SCHEME_ORIGIN: &str = "ace://localhost";

/// Host platform identifier (`win32`, `darwin`, `linux`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform(String);

impl Platform {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_windows(&self) -> bool {
        self.0 == WINDOWS_PLATFORM
    }
}

impl From<&str> for Platform {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Platform {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Base origin for app-relative requests on `platform`.
pub fn local_origin(platform: &Platform) -> &'static str {
    if platform.is_windows() {
        WINDOWS_ORIGIN
    } else {
        CUSTOM_SCHEME_ORIGIN
    }
}

/// What the caller asked to fetch.
#[derive(Debug, Clone)]
pub enum FetchTarget {
    /// Any string target: an app-relative path or a full URL.
    Path(String),
    /// An already parsed URL; never rewritten.
    Url(reqwest::Url),
}

impl From<&str> for FetchTarget {
    fn from(s: &str) -> Self {
        Self::Path(s.to_string())
    }
}

impl From<String> for FetchTarget {
    fn from(s: String) -> Self {
        Self::Path(s)
    }
}

impl From<reqwest::Url> for FetchTarget {
    fn from(u: reqwest::Url) -> Self {
        Self::Url(u)
    }
}

/// Resolve `target` to the URL handed to the network primitive.
pub fn rewrite_target(target: FetchTarget, platform: &Platform) -> String {
    match target {
        FetchTarget::Path(path) if path.starts_with('/') => {
            format!("{}{}", local_origin(platform), path)
        }
        FetchTarget::Path(other) => other,
        FetchTarget::Url(url) => url.to_string(),
    }
}

/// Optional request configuration, forwarded as-is.
#[derive(Debug, Clone)]
pub struct RequestInit {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Default for RequestInit {
    fn default() -> Self {
        Self { method: Method::GET, headers: Vec::new(), body: None }
    }
}

impl RequestInit {
    pub fn new(method: Method) -> Self {
        Self { method, ..Self::default() }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the body and set `content-type: application/json`.
    pub fn json<T: serde::Serialize>(self, value: &T) -> Result<Self, ServiceError> {
        let bytes = serde_json::to_vec(value).map_err(|e| ServiceError::Decode(e.to_string()))?;
        Ok(self.header("content-type", "application/json").body(bytes))
    }
}

/// Fully buffered response from the network primitive.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> Result<String, ServiceError> {
        String::from_utf8(self.body.clone()).map_err(|e| ServiceError::Decode(e.to_string()))
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ServiceError> {
        serde_json::from_slice(&self.body).map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

/// The host's network-fetch primitive.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<FetchResponse, ServiceError>;
}

/// [`HttpFetch`] over a shared `reqwest::Client`. Non-2xx statuses are responses, not errors.
#[derive(Clone)]
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    pub fn new(user_agent: &str) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ServiceError::Network(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }
}

/// Turn `(name, value)` pairs into a header map, rejecting anything HTTP can't carry.
fn header_map(headers: Vec<(String, String)>) -> Result<HeaderMap, ServiceError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ServiceError::InvalidHeader(format!("{name:?}: {e}")))?;
        let header_value = HeaderValue::from_str(&value)
            .map_err(|e| ServiceError::InvalidHeader(format!("{name}: {e}")))?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<FetchResponse, ServiceError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ServiceError::InvalidUrl(format!("{url}: {e}")))?;
        let headers = header_map(init.headers)?;
        let mut req = self.client.request(init.method, parsed).headers(headers);
        if let Some(body) = init.body {
            req = req.body(body);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = resp.bytes().await?.to_vec();
        trace!(url = %final_url, status, bytes = body.len(), "response received");

        Ok(FetchResponse { url: final_url, status, headers, body })
    }
}

/// Origin-rewriting fetch. The platform is fixed at construction.
pub struct AceFetch<F> {
    platform: Platform,
    inner: F,
}

impl<F: HttpFetch> AceFetch<F> {
    pub fn new(platform: impl Into<Platform>, inner: F) -> Self {
        Self { platform: platform.into(), inner }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Rewrite `target` if app-relative, then forward exactly once.
    pub async fn fetch(
        &self,
        target: impl Into<FetchTarget>,
        init: Option<RequestInit>,
    ) -> Result<FetchResponse, ServiceError> {
        let url = rewrite_target(target.into(), &self.platform);
        debug!(platform = self.platform.as_str(), %url, "fetch");
        self.inner.fetch(&url, init.unwrap_or_default()).await
    }
}
