//! Polite, filesystem-mirrored HTTP cache
//!
//! Every remote document in a filing closure is fetched through one
//! [`HttpCache`]. The cache mirrors URL authority+path under its root
//! directory, returns cached bytes without touching the network, and applies
//! the polite-fetch discipline regulators expect: a configurable wall-clock
//! gap between successive network fetches, retry with exponential backoff on
//! 5xx and connection errors, and caller-injected headers (no `User-Agent`
//! default is shipped; SEC EDGAR callers must set their own).
//!
//! Network fetches are serialized behind one mutex so the gap holds across
//! concurrent parses sharing the cache, and concurrent requests for the same
//! URL coalesce onto a single fetch. Files land via temp-file plus atomic
//! rename, so readers never observe partial content.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use xbrl_graph_core::{Result, XbrlError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Network politeness knobs. Defaults: no delay, 5 attempts, 0.8 backoff.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub delay_ms: u64,
    pub retries: u32,
    pub backoff_factor: f64,
    pub verbose: bool,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            delay_ms: 0,
            retries: 5,
            backoff_factor: 0.8,
            verbose: false,
        }
    }
}

/// Counters for cache observability.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// HTTP requests issued by this process (including retries).
    pub network_fetches: u64,
    /// `get` calls satisfied from disk without a request.
    pub cache_hits: u64,
}

#[derive(Default)]
struct NetGate {
    last_fetch: Option<Instant>,
}

/// URL-addressed document cache backed by a directory mirror.
pub struct HttpCache {
    root: PathBuf,
    client: reqwest::Client,
    headers: HeaderMap,
    params: ConnectionParams,
    cancellation: CancellationToken,
    net_gate: Mutex<NetGate>,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    network_fetches: AtomicU64,
    cache_hits: AtomicU64,
    // Keeps the backing directory of an ephemeral cache alive.
    _ephemeral_dir: Option<tempfile::TempDir>,
}

impl HttpCache {
    /// Cache rooted at `root`. The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            client: reqwest::Client::new(),
            headers: HeaderMap::new(),
            params: ConnectionParams::default(),
            cancellation: CancellationToken::new(),
            net_gate: Mutex::new(NetGate::default()),
            inflight: Mutex::new(HashMap::new()),
            network_fetches: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            _ephemeral_dir: None,
        }
    }

    /// In-memory-equivalent variant over a temporary directory that is
    /// removed when the cache is dropped. Parsing always goes through a
    /// cache object; this is the sanctioned substitute for "no cache".
    pub fn ephemeral() -> Result<Self> {
        let dir = tempfile::TempDir::new()?;
        let mut cache = Self::new(dir.path());
        cache._ephemeral_dir = Some(dir);
        Ok(cache)
    }

    /// Replace the injected request headers. Callers talking to SEC EDGAR
    /// must provide `User-Agent` (and should provide `From`).
    pub fn set_headers(&mut self, headers: HashMap<String, String>) {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    map.insert(name, value);
                }
                _ => warn!(header = %name, "ignoring invalid header"),
            }
        }
        self.headers = map;
    }

    pub fn set_connection_params(
        &mut self,
        delay_ms: u64,
        retries: u32,
        backoff_factor: f64,
        verbose: bool,
    ) {
        self.params = ConnectionParams {
            delay_ms,
            retries,
            backoff_factor,
            verbose,
        };
    }

    /// Token checked before each network request.
    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = token;
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            network_fetches: self.network_fetches.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }

    /// Map a URL to its mirror path: strip the scheme, join authority+path
    /// onto the cache root (`https://host/a/b.xml` -> `<root>/host/a/b.xml`).
    pub fn url_to_path(&self, url: &str) -> Result<PathBuf> {
        let parsed = url::Url::parse(url).map_err(|error| XbrlError::RemoteFetch {
            url: url.to_string(),
            reason: format!("not a valid URL: {}", error),
        })?;
        let host = parsed.host_str().ok_or_else(|| XbrlError::RemoteFetch {
            url: url.to_string(),
            reason: "URL has no host".to_string(),
        })?;
        let mut relative = String::from(host);
        if let Some(port) = parsed.port() {
            relative.push_str(&format!(":{}", port));
        }
        relative.push_str(parsed.path());
        // The path is absolute; joining it raw would escape the root.
        let relative = relative.trim_start_matches('/').to_string();
        Ok(self.root.join(relative))
    }

    /// Return the document bytes and their mirror path, fetching on a miss.
    pub async fn get(&self, url: &str) -> Result<(Vec<u8>, PathBuf)> {
        let path = self.url_to_path(url)?;
        if path.is_file() {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            let bytes = tokio::fs::read(&path).await?;
            return Ok((bytes, path));
        }

        // Single-flight: concurrent requests for one URL share a fetch.
        let url_lock = {
            let mut inflight = self.inflight.lock().await;
            inflight.entry(url.to_string()).or_default().clone()
        };
        let _guard = url_lock.lock().await;

        if path.is_file() {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            let bytes = tokio::fs::read(&path).await?;
            return Ok((bytes, path));
        }

        let fetched = self.fetch_bytes(url).await;
        let written = fetched.and_then(|bytes| {
            write_atomic(&path, &bytes)?;
            Ok(bytes)
        });
        self.inflight.lock().await.remove(url);
        Ok((written?, path))
    }

    /// Fetch a SEC EDGAR enclosure archive and extract its members beneath
    /// the archive's directory mapping. Returns the extraction directory.
    pub async fn cache_edgar_enclosure(&self, url: &str) -> Result<PathBuf> {
        let (bytes, path) = self.get(url).await?;
        let target = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());

        let extract_dir = target.clone();
        tokio::task::spawn_blocking(move || extract_zip(&bytes, &extract_dir))
            .await
            .map_err(|error| {
                XbrlError::Io(std::io::Error::other(format!(
                    "enclosure extraction task failed: {}",
                    error
                )))
            })??;

        info!(url, dir = %target.display(), "extracted enclosure");
        Ok(target)
    }

    /// Drop one cached document.
    pub async fn purge(&self, url: &str) -> Result<()> {
        let path = self.url_to_path(url)?;
        if path.is_file() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    /// Drop the entire mirror.
    pub async fn purge_all(&self) -> Result<()> {
        if self.root.is_dir() {
            tokio::fs::remove_dir_all(&self.root).await?;
        }
        Ok(())
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut gate = self.net_gate.lock().await;
        let attempts = self.params.retries.max(1);

        for attempt in 1..=attempts {
            if self.cancellation.is_cancelled() {
                return Err(XbrlError::Cancelled);
            }

            // Polite gap since the previous network fetch, cache-wide.
            if let Some(last) = gate.last_fetch {
                let min_gap = Duration::from_millis(self.params.delay_ms);
                let elapsed = last.elapsed();
                if elapsed < min_gap {
                    tokio::time::sleep(min_gap - elapsed).await;
                }
            }

            if self.params.verbose {
                info!(url, attempt, "fetching");
            } else {
                debug!(url, attempt, "fetching");
            }
            self.network_fetches.fetch_add(1, Ordering::Relaxed);
            let result = self
                .client
                .get(url)
                .headers(self.headers.clone())
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await;
            gate.last_fetch = Some(Instant::now());

            let retriable_reason = match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let bytes =
                            response
                                .bytes()
                                .await
                                .map_err(|error| XbrlError::RemoteFetch {
                                    url: url.to_string(),
                                    reason: error.to_string(),
                                })?;
                        gate.last_fetch = Some(Instant::now());
                        return Ok(bytes.to_vec());
                    }
                    if status.is_client_error() {
                        return Err(XbrlError::RemoteFetch {
                            url: url.to_string(),
                            reason: format!("HTTP {}", status),
                        });
                    }
                    format!("HTTP {}", status)
                }
                Err(error) => error.to_string(),
            };

            if attempt == attempts {
                return Err(XbrlError::RemoteFetch {
                    url: url.to_string(),
                    reason: format!("{} after {} attempts", retriable_reason, attempts),
                });
            }

            let backoff = self.params.backoff_factor * 2f64.powi(attempt as i32 - 1);
            warn!(url, attempt, backoff_secs = backoff, reason = %retriable_reason, "retrying fetch");
            tokio::time::sleep(Duration::from_secs_f64(backoff)).await;
        }

        unreachable!("retry loop returns on final attempt")
    }
}

/// Write bytes to `path` via a sibling temp file and atomic rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        XbrlError::Io(std::io::Error::other("cache path has no parent directory"))
    })?;
    std::fs::create_dir_all(parent)?;
    let mut temp = tempfile::Builder::new()
        .prefix(".fetch-")
        .tempfile_in(parent)?;
    temp.write_all(bytes)?;
    temp.persist(path)
        .map_err(|error| XbrlError::Io(error.error))?;
    Ok(())
}

/// Extract every archive member under `dir`, preserving relative paths.
fn extract_zip(bytes: &[u8], dir: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|error| {
        XbrlError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("not a zip archive: {}", error),
        ))
    })?;

    for index in 0..archive.len() {
        let mut member = archive.by_index(index).map_err(|error| {
            XbrlError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("corrupt zip member: {}", error),
            ))
        })?;
        // enclosed_name refuses traversal outside the extraction root.
        let Some(relative) = member.enclosed_name().map(|name| name.to_path_buf()) else {
            warn!(member = member.name(), "skipping zip member with unsafe path");
            continue;
        };
        let target = dir.join(relative);
        if member.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        let mut contents = Vec::with_capacity(member.size() as usize);
        std::io::copy(&mut member, &mut contents)?;
        write_atomic(&target, &contents)?;
    }
    Ok(())
}
