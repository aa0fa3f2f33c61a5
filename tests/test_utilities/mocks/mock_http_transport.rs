use async_trait::async_trait;
use p2_sbom::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Mock HttpTransport replaying scripted responses per URI
///
/// Each URI has a queue of responses; the last one repeats once the queue
/// is drained. Unscripted URIs answer 404. Clones share the script and the
/// request log, so a test keeps a handle after moving one into a cache.
#[derive(Clone, Default)]
pub struct MockHttpTransport {
    responses: Arc<Mutex<HashMap<String, VecDeque<HttpResponse>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockHttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(self, uri: &str, body: impl AsRef<[u8]>) -> Self {
        self.push(uri, 200, None, body.as_ref());
        self
    }

    /// Answers `status` for the next `times` exchanges with `uri`.
    pub fn with_status(self, uri: &str, status: u16, times: usize) -> Self {
        for _ in 0..times {
            self.push(uri, status, None, b"");
        }
        self
    }

    pub fn with_retry_after(self, uri: &str, status: u16, retry_after: &str) -> Self {
        self.push(uri, status, Some(retry_after), b"");
        self
    }

    fn push(&self, uri: &str, status: u16, retry_after: Option<&str>, body: &[u8]) {
        self.responses
            .lock()
            .unwrap()
            .entry(uri.to_string())
            .or_default()
            .push_back(HttpResponse {
                status,
                retry_after: retry_after.map(str::to_string),
                body: body.to_vec(),
            });
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn calls_to(&self, uri: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.uri == uri)
            .count()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(request.clone());

        let mut responses = self.responses.lock().unwrap();
        let response = match responses.get_mut(&request.uri) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or(HttpResponse {
            status: 404,
            retry_after: None,
            body: Vec::new(),
        }))
    }
}
