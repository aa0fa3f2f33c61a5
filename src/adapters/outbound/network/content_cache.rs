use crate::ports::outbound::{ContentSource, HttpRequest, HttpResponse, HttpTransport};
use crate::shared::error::FetchError;
use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Statuses worth retrying: rate limiting and gateway/origin hiccups.
const RETRYABLE_STATUSES: [u16; 5] = [429, 502, 503, 504, 524];
const DEFAULT_RETRY_BUDGET: u32 = 5;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(8 * 60 * 60);
const NOT_FOUND_PREFIX: &str = "404";
const EXISTS_PREFIX: &str = "exists";
/// Longer path segments are replaced by their digest to stay within file name limits.
const MAX_SEGMENT_LENGTH: usize = 128;

static URI_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[:/?#&;,{}'"]+"#).expect("valid separator pattern"));

/// ContentCache adapter: disk-backed, retrying [`ContentSource`] over an [`HttpTransport`]
///
/// Every remote lookup goes through this cache. Successful bodies and
/// not-found results are persisted under a path derived from the URI and are
/// reused while younger than the freshness window, so re-running against the
/// same cache directory never re-contacts the network for fresh entries.
///
/// # Concurrency
/// Safe to share between enrichment tasks. Cache files are written to a
/// unique temporary name and renamed into place.
pub struct ContentCache<T: HttpTransport> {
    transport: T,
    cache_root: PathBuf,
    _temp_dir: Option<TempDir>,
    exists_memo: DashMap<String, bool>,
    max_age: Duration,
    retry_budget: u32,
    default_retry_delay: Duration,
}

impl<T: HttpTransport> ContentCache<T> {
    /// Creates a cache rooted at `cache_root`
    pub fn new(transport: T, cache_root: PathBuf) -> Self {
        Self {
            transport,
            cache_root,
            _temp_dir: None,
            exists_memo: DashMap::new(),
            max_age: DEFAULT_MAX_AGE,
            retry_budget: DEFAULT_RETRY_BUDGET,
            default_retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Creates a cache in a fresh temporary directory that lives as long as the cache
    pub fn in_temp_dir(transport: T) -> crate::shared::Result<Self> {
        let temp_dir = tempfile::Builder::new().prefix("p2-sbom-cache").tempdir()?;
        let mut cache = Self::new(transport, temp_dir.path().to_path_buf());
        cache._temp_dir = Some(temp_dir);
        Ok(cache)
    }

    pub fn with_retry_policy(mut self, retry_budget: u32, default_retry_delay: Duration) -> Self {
        self.retry_budget = retry_budget;
        self.default_retry_delay = default_retry_delay;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Maps a URI to its cache file.
    ///
    /// The URI is percent-decoded and split on URI punctuation; the last
    /// segment is prefixed with `_` so a file never collides with a directory.
    pub fn cache_path(&self, uri: &str, prefix: Option<&str>) -> PathBuf {
        let decoded = urlencoding::decode(uri)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| uri.to_string());
        let segments: Vec<String> = URI_SEPARATORS
            .split(&decoded)
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .map(shorten_segment)
            .collect();

        let mut path = self.cache_root.clone();
        if let Some(prefix) = prefix {
            path.push(prefix);
        }
        match segments.split_last() {
            Some((last, parents)) => {
                for segment in parents {
                    path.push(segment);
                }
                path.push(format!("_{}", last));
            }
            None => path.push("_"),
        }
        path
    }

    async fn is_fresh(&self, path: &Path) -> bool {
        match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => metadata
                .modified()
                .ok()
                .and_then(|modified| SystemTime::now().duration_since(modified).ok())
                .map(|age| age <= self.max_age)
                .unwrap_or(true),
            _ => false,
        }
    }

    async fn write_entry(&self, uri: &str, path: &Path, bytes: &[u8]) -> Result<(), FetchError> {
        let io_error = |e: std::io::Error| FetchError::Io {
            uri: uri.to_string(),
            details: format!("{}: {}", path.display(), e),
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let staging = path.with_file_name(format!(".{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&staging, bytes).await.map_err(io_error)?;
        tokio::fs::rename(&staging, path).await.map_err(io_error)
    }

    async fn read_entry(&self, uri: &str, path: &Path) -> Result<Vec<u8>, FetchError> {
        tokio::fs::read(path).await.map_err(|e| FetchError::Io {
            uri: uri.to_string(),
            details: format!("{}: {}", path.display(), e),
        })
    }

    async fn read_local(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        let path = reqwest::Url::parse(uri)
            .ok()
            .and_then(|url| url.to_file_path().ok())
            .ok_or_else(|| FetchError::Io {
                uri: uri.to_string(),
                details: "not a valid file URI".to_string(),
            })?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
                uri: uri.to_string(),
            }),
            Err(e) => Err(FetchError::Io {
                uri: uri.to_string(),
                details: e.to_string(),
            }),
        }
    }

    /// Seconds from a `Retry-After` header, or the default delay.
    fn retry_delay(&self, uri: &str, retry_after: Option<&str>) -> Duration {
        match retry_after {
            None => self.default_retry_delay,
            Some(value) => match value.trim().parse::<u64>() {
                Ok(seconds) => Duration::from_secs(seconds),
                Err(_) => {
                    tracing::warn!(uri, retry_after = value, "Unparseable Retry-After header");
                    self.default_retry_delay
                }
            },
        }
    }

    async fn exchange(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, FetchError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Canceled),
            response = self.transport.send(request) => response,
        }
    }

    /// Cached, retrying retrieval of `request` stored under `key`.
    async fn retrieve(
        &self,
        key: &str,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Canceled);
        }

        let path = self.cache_path(key, None);
        if self.is_fresh(&path).await {
            return self.read_entry(key, &path).await;
        }
        let not_found_marker = self.cache_path(key, Some(NOT_FOUND_PREFIX));
        if self.is_fresh(&not_found_marker).await {
            return Err(FetchError::NotFound {
                uri: request.uri.clone(),
            });
        }

        let mut retries_left = self.retry_budget;
        loop {
            let response = self.exchange(&request, cancel).await?;
            match response.status {
                200 => {
                    if cancel.is_cancelled() {
                        return Err(FetchError::Canceled);
                    }
                    self.write_entry(key, &path, &response.body).await?;
                    return Ok(response.body);
                }
                404 => {
                    self.write_entry(key, &not_found_marker, &[]).await?;
                    return Err(FetchError::NotFound {
                        uri: request.uri.clone(),
                    });
                }
                status if RETRYABLE_STATUSES.contains(&status) => {
                    if retries_left == 0 {
                        return Err(FetchError::Transient {
                            uri: request.uri.clone(),
                            status,
                        });
                    }
                    retries_left -= 1;
                    let delay = self.retry_delay(&request.uri, response.retry_after.as_deref());
                    tracing::warn!(
                        uri = %request.uri,
                        status,
                        delay_secs = delay.as_secs(),
                        retries_left,
                        "Retrying after transient HTTP status"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(FetchError::Canceled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                status => {
                    return Err(FetchError::Http {
                        uri: request.uri.clone(),
                        status,
                    })
                }
            }
        }
    }
}

fn shorten_segment(segment: &str) -> String {
    if segment.len() <= MAX_SEGMENT_LENGTH {
        segment.to_string()
    } else {
        use sha2::{Digest, Sha256};
        hex::encode(Sha256::digest(segment.as_bytes()))
    }
}

/// Cache key of a POST query: the URI plus encoded headers and body as a fragment.
fn post_key(uri: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut parts: Vec<String> = headers
        .iter()
        .flat_map(|(name, value)| [urlencoding::encode(name), urlencoding::encode(value)])
        .map(|part| part.into_owned())
        .collect();
    parts.push(urlencoding::encode(body).into_owned());
    format!("{}#{}", uri, parts.join(","))
}

#[async_trait]
impl<T: HttpTransport> ContentSource for ContentCache<T> {
    async fn fetch(&self, uri: &str, cancel: &CancellationToken) -> Result<Vec<u8>, FetchError> {
        if uri.starts_with("file:") {
            return self.read_local(uri).await;
        }
        self.retrieve(uri, HttpRequest::get(uri), cancel).await
    }

    async fn exists(&self, uri: &str, cancel: &CancellationToken) -> Result<bool, FetchError> {
        if let Some(known) = self.exists_memo.get(uri) {
            return Ok(*known);
        }
        if cancel.is_cancelled() {
            return Err(FetchError::Canceled);
        }

        let exists = if uri.starts_with("file:") {
            match self.read_local(uri).await {
                Ok(_) => true,
                Err(FetchError::NotFound { .. }) => false,
                Err(e) => return Err(e),
            }
        } else {
            let marker = self.cache_path(uri, Some(EXISTS_PREFIX));
            let not_found_marker = self.cache_path(uri, Some(NOT_FOUND_PREFIX));
            if self.is_fresh(&marker).await || self.is_fresh(&self.cache_path(uri, None)).await {
                true
            } else if self.is_fresh(&not_found_marker).await {
                false
            } else {
                let response = self.exchange(&HttpRequest::head(uri), cancel).await?;
                match response.status {
                    200 => {
                        self.write_entry(uri, &marker, &[]).await?;
                        true
                    }
                    404 => {
                        self.write_entry(uri, &not_found_marker, &[]).await?;
                        false
                    }
                    status if RETRYABLE_STATUSES.contains(&status) => {
                        return Err(FetchError::Transient {
                            uri: uri.to_string(),
                            status,
                        })
                    }
                    status => {
                        return Err(FetchError::Http {
                            uri: uri.to_string(),
                            status,
                        })
                    }
                }
            }
        };

        self.exists_memo.insert(uri.to_string(), exists);
        Ok(exists)
    }

    async fn post(
        &self,
        uri: &str,
        headers: &[(&str, &str)],
        body: &str,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        let key = post_key(uri, headers, body);
        let request = HttpRequest::post(
            uri,
            headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            body.to_string(),
        );
        let bytes = self.retrieve(&key, request, cancel).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::HttpMethod;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Transport replaying scripted responses and counting exchanges
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        responses: Arc<Mutex<VecDeque<HttpResponse>>>,
        requests: Arc<Mutex<Vec<HttpRequest>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedTransport {
        fn with_statuses(statuses: &[u16]) -> Self {
            let transport = Self::default();
            for &status in statuses {
                transport.push(status, b"body", None);
            }
            transport
        }

        fn push(&self, status: u16, body: &[u8], retry_after: Option<&str>) {
            self.responses.lock().unwrap().push_back(HttpResponse {
                status,
                retry_after: retry_after.map(str::to_string),
                body: body.to_vec(),
            });
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(HttpResponse {
                    status: 500,
                    retry_after: None,
                    body: Vec::new(),
                }))
        }
    }

    fn cache(transport: &ScriptedTransport, root: &Path) -> ContentCache<ScriptedTransport> {
        ContentCache::new(transport.clone(), root.to_path_buf())
            .with_retry_policy(DEFAULT_RETRY_BUDGET, Duration::ZERO)
    }

    const URI: &str = "https://repo.example.org/maven2/org/example/core/1.0/core-1.0.pom";

    #[test]
    fn test_cache_path_layout() {
        let temp = TempDir::new().unwrap();
        let cache = cache(&ScriptedTransport::default(), temp.path());
        assert_eq!(
            cache.cache_path(URI, None),
            temp.path()
                .join("https/repo.example.org/maven2/org/example/core/1.0/_core-1.0.pom")
        );
        assert_eq!(
            cache.cache_path("https://a.example.org/x?q=1", Some("404")),
            temp.path().join("404/https/a.example.org/x/q=_1")
        );
    }

    #[test]
    fn test_cache_path_stays_inside_root() {
        let temp = TempDir::new().unwrap();
        let cache = cache(&ScriptedTransport::default(), temp.path());
        let path = cache.cache_path("https://a.example.org/%2E%2E/%2E%2E/etc/passwd", None);
        assert!(path.starts_with(temp.path()));
        assert!(!path.components().any(|c| c.as_os_str() == ".."));
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let temp = TempDir::new().unwrap();
        let transport = ScriptedTransport::with_statuses(&[200]);
        let cache = cache(&transport, temp.path());
        let cancel = CancellationToken::new();

        let first = cache.fetch(URI, &cancel).await.unwrap();
        let second = cache.fetch(URI, &cancel).await.unwrap();

        assert_eq!(first, b"body");
        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_fresh_entries_survive_a_new_cache_instance() {
        let temp = TempDir::new().unwrap();
        let transport = ScriptedTransport::with_statuses(&[200]);
        cache(&transport, temp.path())
            .fetch(URI, &CancellationToken::new())
            .await
            .unwrap();

        let other = ScriptedTransport::default();
        let bytes = cache(&other, temp.path())
            .fetch(URI, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(bytes, b"body");
        assert_eq!(other.calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_entries_are_refetched() {
        let temp = TempDir::new().unwrap();
        let transport = ScriptedTransport::with_statuses(&[200, 200]);
        let cache = cache(&transport, temp.path());
        let cancel = CancellationToken::new();
        cache.fetch(URI, &cancel).await.unwrap();

        let path = cache.cache_path(URI, None);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(9 * 60 * 60))
            .unwrap();

        cache.fetch(URI, &cancel).await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_transient_status_exhausts_retry_budget() {
        let temp = TempDir::new().unwrap();
        let transport = ScriptedTransport::with_statuses(&[503; 6]);
        let cache = cache(&transport, temp.path());

        let result = cache.fetch(URI, &CancellationToken::new()).await;

        assert!(matches!(
            result,
            Err(FetchError::Transient { status: 503, .. })
        ));
        assert_eq!(transport.calls(), 6);
    }

    #[tokio::test]
    async fn test_transient_status_then_success() {
        let temp = TempDir::new().unwrap();
        let transport = ScriptedTransport::default();
        transport.push(429, b"", Some("0"));
        transport.push(200, b"ok", None);
        let cache = cache(&transport, temp.path());

        let bytes = cache.fetch(URI, &CancellationToken::new()).await.unwrap();
        assert_eq!(bytes, b"ok");
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_cached_negatively() {
        let temp = TempDir::new().unwrap();
        let transport = ScriptedTransport::with_statuses(&[404]);
        let cache = cache(&transport, temp.path());
        let cancel = CancellationToken::new();

        let first = cache.fetch(URI, &cancel).await;
        let second = cache.fetch(URI, &cancel).await;

        assert!(matches!(first, Err(FetchError::NotFound { .. })));
        assert!(matches!(second, Err(FetchError::NotFound { .. })));
        assert_eq!(transport.calls(), 1);
        assert!(cache.cache_path(URI, Some("404")).is_file());
    }

    #[tokio::test]
    async fn test_other_statuses_fail_without_retry() {
        let temp = TempDir::new().unwrap();
        let transport = ScriptedTransport::with_statuses(&[403]);
        let cache = cache(&transport, temp.path());

        let result = cache.fetch(URI, &CancellationToken::new()).await;
        assert!(matches!(result, Err(FetchError::Http { status: 403, .. })));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_canceled_token_prevents_exchange() {
        let temp = TempDir::new().unwrap();
        let transport = ScriptedTransport::with_statuses(&[200]);
        let cache = cache(&transport, temp.path());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = cache.fetch(URI, &cancel).await;
        assert_eq!(result, Err(FetchError::Canceled));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_exists_is_memoized_and_persisted() {
        let temp = TempDir::new().unwrap();
        let transport = ScriptedTransport::with_statuses(&[200, 404]);
        let cache = cache(&transport, temp.path());
        let cancel = CancellationToken::new();
        let issues = "https://github.com/eclipse/example/issues";
        let missing = "https://github.com/eclipse/missing/issues";

        assert!(cache.exists(issues, &cancel).await.unwrap());
        assert!(cache.exists(issues, &cancel).await.unwrap());
        assert!(!cache.exists(missing, &cancel).await.unwrap());
        assert_eq!(transport.calls(), 2);
        assert_eq!(
            transport.requests.lock().unwrap()[0].method,
            HttpMethod::Head
        );

        let other = ScriptedTransport::default();
        let reopened = super::tests::cache(&other, temp.path());
        assert!(reopened.exists(issues, &cancel).await.unwrap());
        assert!(!reopened.exists(missing, &cancel).await.unwrap());
        assert_eq!(other.calls(), 0);
    }

    #[tokio::test]
    async fn test_post_is_keyed_by_body() {
        let temp = TempDir::new().unwrap();
        let transport = ScriptedTransport::default();
        transport.push(200, b"{\"vulns\":[]}", None);
        transport.push(200, b"{}", None);
        transport.push(200, b"plain", None);
        let cache = cache(&transport, temp.path());
        let cancel = CancellationToken::new();
        let headers = [("Content-Type", "application/json")];
        let uri = "https://api.example.org/v1/query";

        let first = cache.post(uri, &headers, "{\"a\":1}", &cancel).await.unwrap();
        let repeat = cache.post(uri, &headers, "{\"a\":1}", &cancel).await.unwrap();
        let other = cache.post(uri, &headers, "{\"a\":2}", &cancel).await.unwrap();
        let get = cache.fetch(uri, &cancel).await.unwrap();

        assert_eq!(first, "{\"vulns\":[]}");
        assert_eq!(first, repeat);
        assert_eq!(other, "{}");
        assert_eq!(get, b"plain");
        assert_eq!(transport.calls(), 3);

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].body.as_deref(), Some("{\"a\":1}"));
        assert_eq!(
            requests[0].headers,
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );
    }

    #[tokio::test]
    async fn test_file_uris_bypass_the_cache() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("local.txt");
        std::fs::write(&file, "local").unwrap();
        let transport = ScriptedTransport::default();
        let cache = cache(&transport, temp.path());
        let uri = reqwest::Url::from_file_path(&file).unwrap().to_string();

        let bytes = cache.fetch(&uri, &CancellationToken::new()).await.unwrap();
        assert_eq!(bytes, b"local");
        assert_eq!(transport.calls(), 0);

        let missing = reqwest::Url::from_file_path(temp.path().join("none.txt"))
            .unwrap()
            .to_string();
        assert!(matches!(
            cache.fetch(&missing, &CancellationToken::new()).await,
            Err(FetchError::NotFound { .. })
        ));
    }

    #[test]
    fn test_retry_delay_parsing() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::new(ScriptedTransport::default(), temp.path().to_path_buf());
        assert_eq!(cache.retry_delay(URI, Some("7")), Duration::from_secs(7));
        assert_eq!(cache.retry_delay(URI, Some("soon")), DEFAULT_RETRY_DELAY);
        assert_eq!(cache.retry_delay(URI, None), DEFAULT_RETRY_DELAY);
    }

    #[test]
    fn test_in_temp_dir_creates_root() {
        let cache = ContentCache::in_temp_dir(ScriptedTransport::default()).unwrap();
        assert!(cache.cache_root().is_dir());
    }
}
