//! Shared HTTP client for OGC and processing endpoints.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use tracing::{debug, warn};
use url::Url;

use crate::error::{OgcError, Result};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Endpoint used when a caller supplies no URL.
const DEFAULT_URL: &str = "https://mara.rangelands.itc.utwente.nl/geoserver/ows?";

/// HTTP client used by every adapter and executor.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct OgcClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    default_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for OgcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OgcClient")
            .field("default_url", &self.inner.default_url)
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

/// A successful (2xx) response with its body and `Location` header.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

impl OgcClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The endpoint used when a request carries no URL.
    pub fn default_url(&self) -> &str {
        &self.inner.default_url
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Resolve an optional caller URL into a base ready for query parameters.
    ///
    /// A missing URL falls back to the default endpoint. The result always
    /// ends with `?` or `&`.
    pub fn base_url(&self, url: Option<&str>) -> String {
        let url = match url {
            Some(u) if !u.trim().is_empty() => u.trim(),
            _ => self.default_url(),
        };
        normalize_base(url)
    }

    /// GET a document.
    ///
    /// Returns `None` on network failure, non-2xx status or an empty body.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        let request = self.inner.http.get(url).timeout(self.inner.timeout);
        self.send(url, request).await.map(|r| r.body)
    }

    /// GET a binary payload, such as a raster.
    ///
    /// Returns `None` on network failure, non-2xx status or an empty body.
    pub async fn fetch_bytes(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self.inner.http.get(url).timeout(self.inner.timeout).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(url, status = response.status().as_u16(), "endpoint returned an error status");
            return None;
        }
        match response.bytes().await {
            Ok(b) if !b.is_empty() => Some(b.to_vec()),
            Ok(_) => {
                warn!(url, "endpoint returned an empty body");
                None
            }
            Err(e) => {
                warn!(url, error = %e, "failed to read response body");
                None
            }
        }
    }

    /// POST a body with the given content type.
    ///
    /// Returns `None` on network failure, non-2xx status or an empty body.
    pub async fn post(&self, url: &str, content_type: &str, body: String) -> Option<String> {
        self.post_full(url, content_type, body)
            .await
            .map(|r| r.body)
            .filter(|b| !b.is_empty())
    }

    /// POST a body and keep the response metadata.
    ///
    /// Unlike [`OgcClient::post`], an empty body is not treated as failure
    /// since job submissions often answer with only a `Location` header.
    pub async fn post_full(
        &self,
        url: &str,
        content_type: &str,
        body: String,
    ) -> Option<FetchedResponse> {
        let content_type = match HeaderValue::from_str(content_type) {
            Ok(v) => v,
            Err(_) => {
                warn!(url, content_type, "invalid content type");
                return None;
            }
        };
        let request = self
            .inner
            .http
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .timeout(self.inner.timeout);

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "request failed");
                return None;
            }
        };
        read_response(url, response, true).await
    }

    async fn send(&self, url: &str, request: reqwest::RequestBuilder) -> Option<FetchedResponse> {
        match request.send().await {
            Ok(response) => read_response(url, response, false).await,
            Err(e) => {
                warn!(url, error = %e, "request failed");
                None
            }
        }
    }
}

async fn read_response(
    url: &str,
    response: reqwest::Response,
    allow_empty: bool,
) -> Option<FetchedResponse> {
    let status = response.status();
    if !status.is_success() {
        warn!(url, status = status.as_u16(), "endpoint returned an error status");
        return None;
    }

    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = match response.text().await {
        Ok(b) => b,
        Err(e) => {
            warn!(url, error = %e, "failed to read response body");
            return None;
        }
    };

    if body.is_empty() && !allow_empty {
        warn!(url, "endpoint returned an empty body");
        return None;
    }

    debug!(url, bytes = body.len(), "fetched");
    Some(FetchedResponse {
        status: status.as_u16(),
        location,
        body,
    })
}

/// Make sure a base URL can take query parameters by plain concatenation.
pub fn normalize_base(url: &str) -> String {
    if url.ends_with('?') || url.ends_with('&') {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&")
    } else {
        format!("{url}?")
    }
}

/// Escape a value for use inside a query string.
pub fn query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Builder for creating an [`OgcClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    default_url: String,
    timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            default_url: DEFAULT_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Set the endpoint used when a request carries no URL.
    pub fn default_url(mut self, url: impl Into<String>) -> Self {
        self.default_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<OgcClient> {
        // Validate the default endpoint early
        Url::parse(&self.default_url)?;
        if self.timeout.is_zero() {
            return Err(OgcError::Config("timeout must be positive".to_string()));
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("geoflow/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()?;

        Ok(OgcClient {
            inner: Arc::new(ClientInner {
                http,
                default_url: self.default_url,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_value_escapes_reserved_characters() {
        assert_eq!(query_value("gs:Clip"), "gs%3AClip");
        assert_eq!(query_value("a b&c#d"), "a+b%26c%23d");
        assert_eq!(query_value("Rainfall-talek"), "Rainfall-talek");
    }

    #[test]
    fn test_builder_rejects_bad_default_url() {
        let result = ClientBuilder::new().default_url("not a url").build();
        assert!(matches!(result, Err(OgcError::InvalidUrl(_))));
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let result = ClientBuilder::new().timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(OgcError::Config(_))));
    }

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base("http://h/ows"), "http://h/ows?");
        assert_eq!(normalize_base("http://h/ows?"), "http://h/ows?");
        assert_eq!(normalize_base("http://h/ows?map=a"), "http://h/ows?map=a&");
        assert_eq!(normalize_base("http://h/ows?map=a&"), "http://h/ows?map=a&");
    }

    #[test]
    fn test_base_url_falls_back_to_default() {
        let client = OgcClient::builder()
            .default_url("http://fallback/ows")
            .build()
            .unwrap();
        assert_eq!(client.base_url(None), "http://fallback/ows?");
        assert_eq!(client.base_url(Some("  ")), "http://fallback/ows?");
        assert_eq!(client.base_url(Some("http://x/wps")), "http://x/wps?");
    }
}
