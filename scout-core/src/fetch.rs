//! Script retrieval from the content server
//!
//! Two endpoints: `GET {server}/{os}/{name}` returns the script bytes with
//! the detached signature in the `X-Signature` header, and
//! `GET {server}/hash/{name}` returns the server's current content hash
//! for the resolver's freshness check.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;
use tracing::debug;

use crate::error::ScoutError;
use crate::platform::HostOs;

const SIGNATURE_HEADER: &str = "X-Signature";

/// Characters escaped in a URL path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'\\')
    .add(b'{')
    .add(b'}');

/// Build the full fetch URL for a script name on this host.
pub fn script_url(server_url: &str, name: &str) -> String {
    format!(
        "{}/{}/{}",
        server_url.trim_end_matches('/'),
        HostOs::current().server_dir(),
        utf8_percent_encode(name, SEGMENT)
    )
}

#[derive(Debug, Deserialize)]
struct HashResponse {
    script_hash: String,
}

/// HTTP client for the content server.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    server_url: String,
}

impl Fetcher {
    pub fn new(server_url: &str) -> Result<Self, ScoutError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("scout/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Fetcher {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch script bytes and the hex-decoded detached signature from the
    /// `X-Signature` response header.
    pub async fn fetch(&self, url: &str) -> Result<(Vec<u8>, Vec<u8>), ScoutError> {
        debug!(url, "fetching script");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::FetchStatus {
                status: status.as_u16(),
            });
        }

        let signature_hex = response
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .ok_or(ScoutError::MissingSignature)?;
        let signature = hex::decode(signature_hex).map_err(|_| ScoutError::MissingSignature)?;

        let bytes = response.bytes().await?.to_vec();
        Ok((bytes, signature))
    }

    /// Ask the server for the current content hash of `name`.
    pub async fn remote_hash(&self, name: &str) -> Result<String, ScoutError> {
        let url = format!(
            "{}/hash/{}",
            self.server_url,
            utf8_percent_encode(name, SEGMENT)
        );
        debug!(url = %url, "querying remote hash");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::FetchStatus {
                status: status.as_u16(),
            });
        }

        let body: HashResponse = response.json().await?;
        Ok(body.script_hash)
    }
}
