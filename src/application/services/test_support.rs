use crate::ports::outbound::ContentSource;
use crate::shared::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// In-memory content source: unknown URIs are not found.
#[derive(Default)]
pub struct StaticContent {
    resources: HashMap<String, Vec<u8>>,
    failures: HashMap<String, FetchError>,
    existing: Vec<String>,
    post_responses: HashMap<String, String>,
    pub posts: Mutex<Vec<(String, String)>>,
    fetches: AtomicUsize,
}

impl StaticContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uri: &str, body: impl AsRef<[u8]>) -> Self {
        self.resources.insert(uri.to_string(), body.as_ref().to_vec());
        self
    }

    pub fn failing(mut self, uri: &str, error: FetchError) -> Self {
        self.failures.insert(uri.to_string(), error);
        self
    }

    pub fn existing(mut self, uri: &str) -> Self {
        self.existing.push(uri.to_string());
        self
    }

    pub fn with_post(mut self, uri: &str, response: &str) -> Self {
        self.post_responses
            .insert(uri.to_string(), response.to_string());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for StaticContent {
    async fn fetch(&self, uri: &str, cancel: &CancellationToken) -> Result<Vec<u8>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Canceled);
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failures.get(uri) {
            return Err(error.clone());
        }
        self.resources
            .get(uri)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                uri: uri.to_string(),
            })
    }

    async fn exists(&self, uri: &str, cancel: &CancellationToken) -> Result<bool, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Canceled);
        }
        Ok(self.existing.iter().any(|u| u == uri) || self.resources.contains_key(uri))
    }

    async fn post(
        &self,
        uri: &str,
        _headers: &[(&str, &str)],
        body: &str,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Canceled);
        }
        if let Ok(mut posts) = self.posts.lock() {
            posts.push((uri.to_string(), body.to_string()));
        }
        if let Some(error) = self.failures.get(uri) {
            return Err(error.clone());
        }
        self.post_responses
            .get(uri)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                uri: uri.to_string(),
            })
    }
}
