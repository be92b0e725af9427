use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde_json::Value;
use tracing::{enabled, trace, Level};

use crate::config::ClaudeWebConfig;
use crate::error::ClaudeWebError;

pub type ByteStream = BoxStream<'static, Result<Bytes, ClaudeWebError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
    /// TLS fingerprint identifier; interpreted only by the transport.
    pub fingerprint: String,
}

impl TransportRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            timeout: None,
            fingerprint: String::new(),
        }
    }
}

pub struct TransportResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Still-open response body.
    pub body: ByteStream,
}

impl TransportResponse {
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }

    /// Drain the whole body.
    pub async fn bytes(mut self) -> Result<Vec<u8>, ClaudeWebError> {
        let mut out = Vec::new();
        while let Some(chunk) = self.body.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// HTTP gateway used by the client; proxying and fingerprinting live behind it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request. Any status is returned as a response; only
    /// network-level failures are errors.
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ClaudeWebError>;
}

/// Default [`Transport`] over reqwest with rustls.
///
/// reqwest cannot emulate a TLS fingerprint, so the request fingerprint is only
/// traced.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClaudeWebConfig) -> Result<Self, ClaudeWebError> {
        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = config
            .proxy
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            let proxy = reqwest::Proxy::all(proxy).map_err(|error| {
                ClaudeWebError::InvalidConfig(format!("invalid proxy {proxy}: {error}"))
            })?;
            builder = builder.proxy(proxy);
        }
        let http = builder.build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, ClaudeWebError> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
            timeout,
            fingerprint,
        } = request;

        if enabled!(Level::TRACE) {
            trace!(%method, %url, %fingerprint, "sending request");
        }

        let mut builder = self.http.request(method.as_reqwest(), &url);
        for (key, value) in &headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(key, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (key.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|error| ClaudeWebError::StreamRead(error.to_string())));

        Ok(TransportResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}
