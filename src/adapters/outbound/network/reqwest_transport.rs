use crate::ports::outbound::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::shared::error::FetchError;
use crate::shared::Result;
use async_trait::async_trait;
use std::time::Duration;

/// ReqwestTransport adapter performing HTTP exchanges with an async reqwest client
///
/// Redirects are followed by the client. Retrying, caching and status
/// interpretation belong to the caller.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the default timeout and a tool user agent
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(60))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, FetchError> {
        let transport_error = |e: reqwest::Error| FetchError::Transport {
            uri: request.uri.clone(),
            details: e.to_string(),
        };

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.uri),
            HttpMethod::Head => self.client.head(&request.uri),
            HttpMethod::Post => self.client.post(&request.uri),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(transport_error)?.to_vec();

        Ok(HttpResponse {
            status,
            retry_after,
            body,
        })
    }
}
