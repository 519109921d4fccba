//! Error types for the script lifecycle engine
//!
//! Cache anomalies (`CacheMiss`, `CacheStale`, `CacheCorrupt`) are
//! self-healing: the resolver purges the entry and re-fetches, so they
//! never reach the host. Everything else surfaces as the failure message
//! of the table call that triggered it.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoutError {
    /// Config file could not be read at any candidate path
    #[error("failed to read config file: {path}")]
    ConfigMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file was readable but not usable
    #[error("failed to parse config: {0}")]
    ConfigParse(String),

    /// A cache artifact is absent or unreadable
    #[error("cache entry missing or unreadable")]
    CacheMiss(#[source] std::io::Error),

    /// The entry is older than the freshness window, or the server
    /// reports a different hash
    #[error("cache entry is stale")]
    CacheStale,

    /// Metadata is malformed or disagrees with the recomputed payload hash
    #[error("cache entry is corrupt: {0}")]
    CacheCorrupt(String),

    #[error("transport error: {0}")]
    FetchTransport(#[from] reqwest::Error),

    #[error("fetch failed: received status code {status}")]
    FetchStatus { status: u16 },

    /// The `X-Signature` response header is absent or not valid hex
    #[error("no usable signature in response header")]
    MissingSignature,

    #[error("failed to decode public key PEM")]
    PemDecode,

    #[error("failed to parse public key")]
    ParseKey,

    #[error("public key is not an RSA key")]
    WrongKeyAlgorithm,

    /// The detached signature does not cover these bytes under the
    /// configured key. Never cached, never executed.
    #[error("script signature verification failed")]
    SignatureInvalid,

    #[error("unsupported script type: {name}")]
    UnsupportedKind { name: String },

    #[error("unsupported host platform: {os}")]
    UnsupportedHost { os: String },

    #[error("failed to spawn interpreter")]
    SpawnFailed(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
