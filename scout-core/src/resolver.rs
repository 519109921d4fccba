//! Fetch-or-load policy
//!
//! The resolver decides whether a cached copy of a script is acceptable
//! and otherwise fetches, verifies, and caches a fresh one. A cached copy
//! is served only when every gate passes: all three artifacts load, the
//! entry is inside the freshness window, the server still reports the
//! same hash, and the stored signature verifies over the stored payload.
//! Any failure purges the entry and falls through to the fetch path, so
//! cache anomalies are self-healing and never surface to the host.

use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::cache::{cache_key, CacheStore};
use crate::config::ScoutConfig;
use crate::error::ScoutError;
use crate::fetch::{script_url, Fetcher};
use crate::script::Script;
use crate::verify::verify_detached;

pub struct Resolver {
    config: Arc<ScoutConfig>,
    fetcher: Fetcher,
    store: CacheStore,
}

impl Resolver {
    pub fn new(config: Arc<ScoutConfig>) -> Result<Self, ScoutError> {
        let fetcher = Fetcher::new(&config.server_url)?;
        let store = CacheStore::new(&config.cache_dir);
        Ok(Resolver {
            config,
            fetcher,
            store,
        })
    }

    /// Resolve `name` to a verified script.
    ///
    /// With `use_cache` false the cache is bypassed entirely (the fetched
    /// copy is still saved for later callers that do want it).
    pub async fn get(&self, name: &str, use_cache: bool) -> Result<Script, ScoutError> {
        let full_url = script_url(&self.config.server_url, name);
        let key = cache_key(&full_url);

        if use_cache {
            match self.from_cache(name, &key).await {
                Ok(script) => {
                    info!(name, "serving script from cache");
                    return Ok(script);
                }
                Err(err) => {
                    debug!(name, %err, "cached copy rejected");
                    self.store.remove(&key);
                }
            }
        }

        info!(name, url = %full_url, "fetching script from server");
        let (bytes, signature) = self.fetcher.fetch(&full_url).await?;

        // Verification failure is fatal to the request; nothing unverified
        // ever reaches the cache.
        let hash = verify_detached(&self.config.public_key, &bytes, &signature)?;

        let script = Script {
            name: name.to_string(),
            contents: bytes,
            hash,
            from_cache: false,
        };
        self.store.save(&key, &script, &signature)?;

        Ok(script)
    }

    /// Run the cached entry for `key` through every acceptance gate.
    async fn from_cache(&self, name: &str, key: &str) -> Result<Script, ScoutError> {
        let (payload, meta) = self.store.load(key)?;

        // The metadata hash must match what is actually on disk before it
        // is compared against anything the server says.
        let recomputed = hex::encode(Sha256::digest(&payload));
        if recomputed != meta.script_hash {
            return Err(ScoutError::CacheCorrupt(format!(
                "payload hash {recomputed} disagrees with metadata {}",
                meta.script_hash
            )));
        }

        let age = Utc::now()
            .signed_duration_since(meta.cache_time)
            .to_std()
            .unwrap_or_default();
        if self.config.cache_window.is_zero() || age >= self.config.cache_window {
            return Err(ScoutError::CacheStale);
        }

        // A transport failure here propagates and counts as a rejection:
        // when in doubt, prefer fresh to stale.
        let remote = self.fetcher.remote_hash(&meta.script_name).await?;
        if remote != meta.script_hash {
            debug!(
                name,
                remote = %remote,
                local = %meta.script_hash,
                "server reports a different hash"
            );
            return Err(ScoutError::CacheStale);
        }

        let signature = self.store.load_signature(key)?;
        let hash = verify_detached(&self.config.public_key, &payload, &signature).map_err(
            |err| {
                warn!(name, %err, "cached script failed signature verification");
                err
            },
        )?;

        Ok(Script {
            name: meta.script_name,
            contents: payload,
            hash,
            from_cache: true,
        })
    }
}
