//! URL Registry (C7): a short-lived, hash-addressable table mapping a
//! 16-hex fingerprint to a canonical upstream URL, so the delivery proxy
//! never has to be an open relay for an arbitrary caller-supplied URL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use url::Url;

#[derive(Debug, Clone)]
struct Entry {
    canonical_url: String,
    inserted_at: Instant,
}

/// Concurrency-safe, TTL-expiring map. Cheap to clone: the inner map is
/// shared behind an `Arc`.
#[derive(Clone)]
pub struct UrlRegistry {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Duration,
}

/// A normalized form (`scheme://host + path`, query/fragment dropped) and
/// the exact original string both index the same entry, so a lookup
/// succeeds whichever form the caller has on hand.
fn normalize(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    Some(format!(
        "{}://{}{}",
        parsed.scheme(),
        parsed.host_str().unwrap_or_default(),
        parsed.path()
    ))
}

/// 16 lowercase hex characters of a stable digest of the canonical form.
fn fingerprint(canonical: &str) -> String {
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(&digest[..8])
}

impl UrlRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Inserts `url` under its exact string, its normalized form, and its
    /// fingerprint. Idempotent within a TTL window: re-adding the same URL
    /// just refreshes `inserted_at`. Returns the fingerprint.
    pub async fn add(&self, url: &str) -> String {
        let canonical = normalize(url).unwrap_or_else(|| url.to_string());
        let fp = fingerprint(&canonical);
        let entry = Entry {
            canonical_url: url.to_string(),
            inserted_at: Instant::now(),
        };

        let mut entries = self.entries.write().await;
        entries.insert(url.to_string(), entry.clone());
        entries.insert(canonical, entry.clone());
        entries.insert(fp.clone(), entry);
        fp
    }

    pub async fn add_many(&self, urls: &[String]) -> Vec<String> {
        let mut fingerprints = Vec::with_capacity(urls.len());
        for url in urls {
            fingerprints.push(self.add(url).await);
        }
        fingerprints
    }

    /// Resolves a full URL, its normalized form, or a fingerprint key back
    /// to the canonical URL, provided the entry is within TTL.
    pub async fn lookup(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.canonical_url.clone())
    }

    /// Removes every entry older than TTL. Intended to run on a fixed
    /// interval (at least every 60s per §4.7).
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        before - entries.len()
    }

    /// Spawns the periodic sweeper task; returns its `JoinHandle` so the
    /// caller can abort it on shutdown.
    pub fn spawn_sweeper(self, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = self.sweep().await;
                if removed > 0 {
                    tracing::debug!(removed, "url registry sweep");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_succeeds_by_url_normalized_form_and_fingerprint() {
        let registry = UrlRegistry::new(Duration::from_secs(300));
        let fp = registry.add("https://cdn.example.com/video.mp4?sig=abc").await;

        assert_eq!(
            registry
                .lookup("https://cdn.example.com/video.mp4?sig=abc")
                .await,
            Some("https://cdn.example.com/video.mp4?sig=abc".to_string())
        );
        assert_eq!(
            registry
                .lookup("https://cdn.example.com/video.mp4")
                .await,
            Some("https://cdn.example.com/video.mp4?sig=abc".to_string())
        );
        assert!(registry.lookup(&fp).await.is_some());
    }

    #[tokio::test]
    async fn lookup_returns_none_for_unknown_key() {
        let registry = UrlRegistry::new(Duration::from_secs(300));
        assert!(registry.lookup("deadbeefdeadbeef").await.is_none());
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let registry = UrlRegistry::new(Duration::from_millis(20));
        let fp = registry.add("https://cdn.example.com/a.mp4").await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(registry.lookup(&fp).await.is_none());
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let registry = UrlRegistry::new(Duration::from_millis(20));
        registry.add("https://cdn.example.com/old.mp4").await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        let fresh_fp = registry.add("https://cdn.example.com/new.mp4").await;
        // old.mp4's three keys are expired; new.mp4's three are not.
        let removed = registry.sweep().await;
        assert_eq!(removed, 3);
        assert!(registry.lookup(&fresh_fp).await.is_some());
    }
}
