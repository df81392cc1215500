//! Client configuration resolved from the environment, with CLI overrides applied on top.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const STORE_FILE: &str = "session.json";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// File backing the durable session store.
    pub store_path: PathBuf,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str, store_path: impl Into<PathBuf>) -> ClientResult<Self> {
        Ok(Self { base_url: parse_base_url(base_url)?, store_path: store_path.into(), timeout: None })
    }

    /// CHURCHMAN_BASE_URL, CHURCHMAN_STORE (else CHURCHMAN_HOME/HOME based), CHURCHMAN_TIMEOUT_SECS.
    pub fn from_env() -> ClientResult<Self> {
        let base = std::env::var("CHURCHMAN_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let store_path = match std::env::var("CHURCHMAN_STORE") {
            Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => default_store_path(),
        };
        let timeout = match std::env::var("CHURCHMAN_TIMEOUT_SECS") {
            Ok(v) if !v.trim().is_empty() => {
                let secs: u64 = v.trim().parse()
                    .map_err(|_| ClientError::config(format!("CHURCHMAN_TIMEOUT_SECS must be a whole number of seconds, got '{}'", v)))?;
                if secs == 0 { None } else { Some(Duration::from_secs(secs)) }
            }
            _ => None,
        };
        let mut cfg = Self::new(&base, store_path)?;
        cfg.timeout = timeout;
        Ok(cfg)
    }

    pub fn with_base_url(mut self, base: &str) -> ClientResult<Self> {
        self.base_url = parse_base_url(base)?;
        Ok(self)
    }
}

fn default_store_path() -> PathBuf {
    if let Ok(h) = std::env::var("CHURCHMAN_HOME") {
        if !h.trim().is_empty() { return PathBuf::from(h).join(STORE_FILE); }
    }
    let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")).unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".churchman").join(STORE_FILE)
}

/// Endpoint paths are joined relative to the base, so the base must end in '/'
/// for a deployment prefix (e.g. `https://host/api/v1`) to survive the join.
fn parse_base_url(base: &str) -> ClientResult<Url> {
    let mut url = Url::parse(base.trim()).map_err(|e| ClientError::config(format!("invalid base URL '{}': {}", base, e)))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ClientError::config(format!("unsupported base URL scheme '{}'", other))),
    }
    if !url.path().ends_with('/') {
        let p = format!("{}/", url.path());
        url.set_path(&p);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
