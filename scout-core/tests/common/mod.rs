//! Shared helpers for integration tests: one-shot logging setup, a test
//! RSA keypair, and a minimal in-process content server.

// Each integration binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex, Once, OnceLock};
use std::time::Duration;

use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha256};

use scout_core::ScoutConfig;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

static KEYPAIR: OnceLock<(RsaPrivateKey, String)> = OnceLock::new();

/// Shared 2048-bit test keypair; generation is slow enough to do once.
pub fn keypair() -> &'static (RsaPrivateKey, String) {
    KEYPAIR.get_or_init(|| {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).expect("generate test key");
        let pem = private
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .expect("encode public key");
        (private, pem)
    })
}

pub fn sign(private: &RsaPrivateKey, bytes: &[u8]) -> Vec<u8> {
    let digest = Sha256::digest(bytes);
    private
        .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
        .expect("sign")
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn test_config(
    server_url: &str,
    cache_dir: &Path,
    cache_window_s: u64,
    exec_timeout_s: u64,
) -> Arc<ScoutConfig> {
    let (_, public_key) = keypair();
    Arc::new(ScoutConfig {
        server_url: server_url.trim_end_matches('/').to_string(),
        public_key: public_key.clone(),
        cache_window: Duration::from_secs(cache_window_s),
        exec_timeout: Duration::from_secs(exec_timeout_s),
        cache_dir: cache_dir.to_path_buf(),
    })
}

struct ScriptEntry {
    body: Vec<u8>,
    /// Hex signature for the `X-Signature` header; `None` omits the header
    signature: Option<String>,
}

#[derive(Default)]
struct ServerState {
    scripts: HashMap<String, ScriptEntry>,
    hashes: HashMap<String, String>,
    payload_gets: usize,
}

/// Minimal content server speaking just enough HTTP/1.1 for the fetcher:
/// `GET /{os}/{name}` with the signature header, and `GET /hash/{name}`.
pub struct ScriptServer {
    url: String,
    state: Arc<Mutex<ServerState>>,
}

impl ScriptServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let url = format!("http://{}", listener.local_addr().expect("local addr"));
        let state = Arc::new(Mutex::new(ServerState::default()));

        let handler_state = Arc::clone(&state);
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                handle_connection(&mut stream, &handler_state);
            }
        });

        ScriptServer { url, state }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Serve `body` for `name` with a signature from the shared test key,
    /// and report its hash on the hash endpoint.
    pub fn put_script(&self, name: &str, body: &[u8]) {
        let (private, _) = keypair();
        let signature = hex::encode(sign(private, body));
        let mut state = self.state.lock().unwrap();
        state.scripts.insert(
            name.to_string(),
            ScriptEntry {
                body: body.to_vec(),
                signature: Some(signature),
            },
        );
        state.hashes.insert(name.to_string(), sha256_hex(body));
    }

    /// Serve `body` signed over *different* bytes, so verification fails.
    pub fn put_script_badly_signed(&self, name: &str, body: &[u8]) {
        let (private, _) = keypair();
        let signature = hex::encode(sign(private, b"something else entirely"));
        let mut state = self.state.lock().unwrap();
        state.scripts.insert(
            name.to_string(),
            ScriptEntry {
                body: body.to_vec(),
                signature: Some(signature),
            },
        );
        state.hashes.insert(name.to_string(), sha256_hex(body));
    }

    /// Serve `body` without any `X-Signature` header.
    pub fn put_script_unsigned(&self, name: &str, body: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.scripts.insert(
            name.to_string(),
            ScriptEntry {
                body: body.to_vec(),
                signature: None,
            },
        );
        state.hashes.insert(name.to_string(), sha256_hex(body));
    }

    /// Make the hash endpoint report `hash` for `name`.
    pub fn set_remote_hash(&self, name: &str, hash: &str) {
        self.state
            .lock()
            .unwrap()
            .hashes
            .insert(name.to_string(), hash.to_string());
    }

    /// Make the hash endpoint 404 for `name`.
    pub fn remove_remote_hash(&self, name: &str) {
        self.state.lock().unwrap().hashes.remove(name);
    }

    /// How many times a script payload has been fetched.
    pub fn payload_gets(&self) -> usize {
        self.state.lock().unwrap().payload_gets
    }
}

fn handle_connection(stream: &mut TcpStream, state: &Arc<Mutex<ServerState>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));

    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
        }
    }

    let request = String::from_utf8_lossy(&raw);
    let Some(path) = request.split_whitespace().nth(1) else {
        return;
    };

    if let Some(name) = path.strip_prefix("/hash/") {
        let state = state.lock().unwrap();
        match state.hashes.get(name) {
            Some(hash) => {
                let body = format!(r#"{{"script_hash": "{hash}"}}"#);
                respond(stream, 200, &[], body.as_bytes());
            }
            None => respond(stream, 404, &[], b"not found"),
        }
        return;
    }

    // Script path: /{os}/{name}
    let name = path.rsplit('/').next().unwrap_or_default();
    let mut state = state.lock().unwrap();
    match state.scripts.get(name) {
        Some(entry) => {
            let headers: Vec<String> = entry
                .signature
                .iter()
                .map(|sig| format!("X-Signature: {sig}"))
                .collect();
            let body = entry.body.clone();
            state.payload_gets += 1;
            drop(state);
            let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
            respond(stream, 200, &header_refs, &body);
        }
        None => {
            drop(state);
            respond(stream, 404, &[], b"not found");
        }
    }
}

fn respond(stream: &mut TcpStream, status: u16, extra_headers: &[&str], body: &[u8]) {
    let reason = if status == 200 { "OK" } else { "Not Found" };
    let mut response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    for header in extra_headers {
        response.push_str(header);
        response.push_str("\r\n");
    }
    response.push_str("\r\n");

    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}
