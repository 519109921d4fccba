//! The unit of work: a named, verified script

/// A script that has passed signature verification and is ready to run.
///
/// `hash` is always the hex SHA-256 of `contents`, recomputed on whichever
/// path (cache or fetch) produced the value.
#[derive(Debug, Clone)]
pub struct Script {
    /// Opaque identifier, also used to form the fetch URL
    pub name: String,
    pub contents: Vec<u8>,
    /// Hex-encoded SHA-256 of `contents`
    pub hash: String,
    /// Provenance: true when served from the on-disk cache
    pub from_cache: bool,
}
