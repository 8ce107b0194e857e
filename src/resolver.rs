//! Best-effort postcode to county lookups against postcodes.io, with a
//! durable on-disk cache. Postcode to county assignments change rarely, so
//! cached answers are kept for a configurable number of days (a year by
//! default).

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::ResolverConfig;

/// Source of authoritative county names for a postcode. Lookups are
/// enrichment only: implementations answer `None` for anything they cannot
/// resolve and never surface an error to the caller.
#[async_trait]
pub trait CountySource: Send + Sync {
    async fn admin_county(&self, postcode: &str) -> Option<String>;
}

/// Never resolves anything. Used when running offline and in tests.
pub struct OfflineCountySource;

#[async_trait]
impl CountySource for OfflineCountySource {
    async fn admin_county(&self, _postcode: &str) -> Option<String> {
        None
    }
}

/// Canonical cache and lookup key: the postcode with every run of whitespace
/// removed. "AB1 2CD" and "AB12CD" are the same postcode.
fn cache_key(postcode: &str) -> String {
    postcode.split_whitespace().collect()
}

/// postcodes.io reports the odd record with an empty county string; an empty
/// or whitespace-only name is no county at all.
fn non_blank(county: Option<String>) -> Option<String> {
    county.filter(|county| !county.trim().is_empty())
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    postcode: String,
    admin_county: Option<String>,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct PostcodesIoResponse {
    result: Option<PostcodesIoResult>,
}

#[derive(Debug, Deserialize)]
struct PostcodesIoResult {
    admin_county: Option<String>,
}

/// Looks counties up over HTTP with two cache layers in front: a per-run
/// in-memory map shared by all row tasks, and sharded JSON entries on disk
/// that survive between runs.
///
/// Failed lookups are remembered in memory for the rest of the run but never
/// written to disk, so a flaky network does not poison future runs.
pub struct PostcodeResolver {
    client: reqwest::Client,
    base_url: String,
    cache_dir: PathBuf,
    cache_ttl: Duration,
    timeout: std::time::Duration,
    memory: Mutex<HashMap<String, Option<String>>>,
}

impl PostcodeResolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache_dir: config.cache_dir.clone(),
            cache_ttl: Duration::days(config.cache_ttl_days),
            timeout: std::time::Duration::from_secs(config.timeout_secs),
            memory: Mutex::new(HashMap::new()),
        }
    }

    /// Sharded path for one cache entry, keyed by the digest of the
    /// canonical postcode so arbitrary input never names a file directly.
    fn cache_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let hex = hex::encode(hasher.finalize());
        self.cache_dir
            .join("sha256")
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(format!("{hex}.json"))
    }

    /// A fresh disk entry, if one exists. The outer `Option` is the cache
    /// hit; the inner one is the (possibly absent) county it recorded.
    fn read_disk(&self, key: &str) -> Option<Option<String>> {
        let raw = fs::read_to_string(self.cache_path(key)).ok()?;
        let entry: CacheEntry = serde_json::from_str(&raw).ok()?;
        if Utc::now().signed_duration_since(entry.fetched_at) > self.cache_ttl {
            return None;
        }
        Some(non_blank(entry.admin_county))
    }

    fn write_disk(&self, key: &str, admin_county: &Option<String>) {
        let entry = CacheEntry {
            postcode: key.to_string(),
            admin_county: admin_county.clone(),
            fetched_at: Utc::now(),
        };
        let path = self.cache_path(key);
        if let Some(dir) = path.parent() {
            if let Err(e) = fs::create_dir_all(dir) {
                warn!(error = %e, "Could not create postcode cache directory");
                return;
            }
        }
        match serde_json::to_string(&entry) {
            Ok(body) => {
                if let Err(e) = fs::write(&path, body) {
                    warn!(error = %e, "Could not persist postcode cache entry");
                }
            }
            Err(e) => warn!(error = %e, "Could not serialize postcode cache entry"),
        }
    }

    async fn fetch_remote(&self, key: &str) -> Result<Option<String>, reqwest::Error> {
        let url = format!("{}/postcodes/{}", self.base_url, key);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        let body: PostcodesIoResponse = response.json().await?;
        Ok(non_blank(body.result.and_then(|r| r.admin_county)))
    }
}

#[async_trait]
impl CountySource for PostcodeResolver {
    async fn admin_county(&self, postcode: &str) -> Option<String> {
        let key = cache_key(postcode);
        if key.is_empty() {
            return None;
        }

        {
            let memory = self.memory.lock().await;
            if let Some(cached) = memory.get(&key) {
                return cached.clone();
            }
        }

        if let Some(county) = self.read_disk(&key) {
            debug!(postcode = %key, "Postcode cache hit");
            self.memory.lock().await.insert(key, county.clone());
            return county;
        }

        let resolved = match self.fetch_remote(&key).await {
            Ok(county) => {
                debug!(postcode = %key, county = ?county, "Resolved postcode");
                self.write_disk(&key, &county);
                county
            }
            Err(e) => {
                warn!(postcode = %key, error = %e, "Postcode lookup failed; record keeps its gazetteer region");
                None
            }
        };
        self.memory.lock().await.insert(key, resolved.clone());
        resolved
    }
}
