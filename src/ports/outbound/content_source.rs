use crate::shared::error::FetchError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// ContentSource port for retrieving remote content
///
/// Implementations decide caching, retry and negative-result policy.
/// Every operation observes the cancellation token and fails with
/// [`FetchError::Canceled`] once it is triggered.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetches the bytes at a URI (`http(s):` or `file:`).
    async fn fetch(&self, uri: &str, cancel: &CancellationToken) -> Result<Vec<u8>, FetchError>;

    /// Fetches a URI as UTF-8 text, replacing invalid sequences.
    async fn fetch_text(&self, uri: &str, cancel: &CancellationToken) -> Result<String, FetchError> {
        let bytes = self.fetch(uri, cancel).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Whether a resource exists, determined without downloading it.
    async fn exists(&self, uri: &str, cancel: &CancellationToken) -> Result<bool, FetchError>;

    /// Posts a query and returns the response text.
    async fn post(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
        body: &str,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError>;
}
