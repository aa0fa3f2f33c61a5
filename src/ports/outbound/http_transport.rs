use crate::shared::error::FetchError;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
}

/// A single HTTP exchange request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(uri: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            uri: uri.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn head(uri: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Head,
            ..Self::get(uri)
        }
    }

    pub fn post(uri: impl Into<String>, headers: Vec<(String, String)>, body: String) -> Self {
        Self {
            method: HttpMethod::Post,
            uri: uri.into(),
            headers,
            body: Some(body),
        }
    }
}

/// Status, raw `Retry-After` header and body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub retry_after: Option<String>,
    pub body: Vec<u8>,
}

/// HttpTransport port: performs one HTTP exchange without retries or caching.
///
/// Non-success statuses are returned as responses, only transport-level
/// failures are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError>;
}
