//! Scout core — the script lifecycle engine
//!
//! Fetch-or-load, verify, execute, project: a named script is resolved
//! from the on-disk cache or the content server, its detached RSA
//! signature is checked before anything touches an interpreter, execution
//! runs under a wall-clock deadline, and stdout comes back as table rows.

pub mod cache;
pub mod config;
pub mod error;
pub mod exec;
pub mod fetch;
pub mod history;
pub mod inspect;
pub mod platform;
pub mod project;
pub mod resolver;
pub mod script;
pub mod table;
pub mod verify;

pub use config::ScoutConfig;
pub use error::ScoutError;
pub use script::Script;
