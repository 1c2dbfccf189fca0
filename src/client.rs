//! HTTP transport abstraction and the reqwest-backed client


use crate::{
    error::{AppError, Result},
    models::Config,
    payload::{NO_CACHE_REQUEST_HEADERS, OCTET_STREAM},
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::{Client, Method};
use std::fmt;
use std::time::Duration;

/// Response body delivered chunk by chunk
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// Transport used by the measurement phases.
///
/// `fetch` resolves once the status line and headers have been received;
/// the body is consumed separately so callers decide whether their timing
/// includes it.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// HTTP request description
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub user_agent: Option<String>,
}

impl HttpRequest {
    /// Create a new HTTP request
    pub fn new(url: String, method: Method) -> Self {
        Self {
            url,
            method,
            headers: Vec::new(),
            body: None,
            user_agent: Some(format!("{}/{}", crate::PKG_NAME, crate::VERSION)),
        }
    }

    /// Create a GET request
    pub fn get(url: String) -> Self {
        Self::new(url, Method::GET)
    }

    /// Create a POST request carrying a binary payload
    pub fn post_octets(url: String, body: Bytes) -> Self {
        let mut request = Self::new(url, Method::POST)
            .with_header("Content-Type".to_string(), OCTET_STREAM.to_string());
        request.body = Some(body);
        request
    }

    /// Add custom header
    pub fn with_header(mut self, name: String, value: String) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Ask every cache on the path to stay out of the measurement
    pub fn no_cache(mut self) -> Self {
        for (name, value) in NO_CACHE_REQUEST_HEADERS {
            self.headers.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// Size of the request body in bytes
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map(Bytes::len).unwrap_or(0)
    }
}

/// HTTP response whose body has not been read yet
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    body: BodyStream,
}

impl HttpResponse {
    /// Create a response from a body stream
    pub fn new(status_code: u16, headers: Vec<(String, String)>, body: BodyStream) -> Self {
        Self { status_code, headers, body }
    }

    /// Create a response with a body that is already in memory
    pub fn from_bytes(status_code: u16, body: Bytes) -> Self {
        Self::new(status_code, Vec::new(), stream::once(async move { Ok::<Bytes, AppError>(body) }).boxed())
    }

    /// Check if the response indicates success
    pub fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code < 300
    }

    /// Read the body to the end and return the number of bytes received
    pub async fn consume_body(mut self) -> Result<u64> {
        let mut received: u64 = 0;
        while let Some(chunk) = self.body.next().await {
            received += chunk?.len() as u64;
        }
        Ok(received)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status_code", &self.status_code)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Speed test HTTP client backed by reqwest
pub struct NetworkClient {
    client: Client,
    request_timeout: Duration,
}

impl NetworkClient {
    /// Create a new network client with the given request timeout
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, request_timeout })
    }

    /// Create a client whose timeout matches the configured phase timeout
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.phase_timeout())
    }

    /// Request timeout applied to every request
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

#[async_trait]
impl HttpTransport for NetworkClient {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = url::Url::parse(&request.url)?;

        let mut req_builder = self.client.request(request.method, url);

        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }

        if let Some(ref ua) = request.user_agent {
            req_builder = req_builder.header("User-Agent", ua);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder.send().await.map_err(AppError::from)?;

        let status_code = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(AppError::from))
            .boxed();

        Ok(HttpResponse::new(status_code, headers, body))
    }
}
