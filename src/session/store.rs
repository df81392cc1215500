use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::ClientResult;
use crate::tprintln;

use super::backend::{FileBackend, MemoryBackend, TokenBackend, TOKEN_KEY};
use super::claims::decode_claims;
use super::state::SessionState;

/// Strip surrounding double quotes (a JSON-encoding artifact of older writers) and whitespace.
/// Idempotent: the result never starts or ends with either.
pub fn normalize(raw: &str) -> String {
    raw.trim_matches(|c: char| c == '"' || c.is_whitespace()).to_string()
}

fn is_expired(token: &str) -> bool {
    decode_claims(token).is_some_and(|c| c.is_expired_at(Utc::now()))
}

/// Owner of the single bearer-token slot. Cheap to clone; every clone shares the
/// backend and the published state.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn TokenBackend>,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn TokenBackend>) -> Self {
        let initial = match backend.load(TOKEN_KEY) {
            Ok(Some(raw)) => {
                let tok = normalize(&raw);
                if is_expired(&tok) {
                    warn!(target: "churchman::session", "stored login has expired; clearing it");
                    if let Err(e) = backend.remove(TOKEN_KEY) {
                        warn!(target: "churchman::session", "could not clear expired token: {}", e);
                    }
                }
                SessionState::from_token(&tok)
            }
            Ok(None) => SessionState::signed_out(),
            Err(e) => {
                warn!(target: "churchman::session", "could not read stored token: {}", e);
                SessionState::signed_out()
            }
        };
        let (tx, _rx) = watch::channel(initial);
        Self { backend, state: Arc::new(tx) }
    }

    pub fn in_memory() -> Self { Self::new(Arc::new(MemoryBackend::new())) }

    pub fn open(path: impl Into<PathBuf>) -> Self { Self::new(Arc::new(FileBackend::new(path))) }

    /// Persist a token exactly as received and publish the derived state.
    pub fn set_token(&self, raw: &str) -> ClientResult<()> {
        self.backend.save(TOKEN_KEY, raw)?;
        let next = SessionState::from_token(&normalize(raw));
        tprintln!("session.set signed_in={} level={:?}", next.signed_in, next.level);
        debug!(target: "churchman::session", level = ?next.level, "token stored");
        self.state.send_replace(next);
        Ok(())
    }

    /// Raw stored value; `None` when never set, cleared, or empty.
    pub fn get_token(&self) -> Option<String> {
        match self.backend.load(TOKEN_KEY) {
            Ok(Some(v)) if !v.is_empty() => Some(v),
            Ok(_) => None,
            Err(e) => {
                warn!(target: "churchman::session", "could not read stored token: {}", e);
                None
            }
        }
    }

    /// Normalized token ready for an Authorization header. A token whose decoded
    /// expiry has passed is cleared and reported as absent.
    pub fn token(&self) -> Option<String> {
        let tok = normalize(&self.get_token()?);
        if tok.is_empty() { return None; }
        if let Some(claims) = decode_claims(&tok) {
            if claims.is_expired_at(Utc::now()) {
                warn!(target: "churchman::session", usercode = ?claims.usercode, "login has expired; clearing stored token");
                if let Err(e) = self.clear() {
                    warn!(target: "churchman::session", "could not clear expired token: {}", e);
                }
                return None;
            }
        }
        Some(tok)
    }

    pub fn clear(&self) -> ClientResult<()> {
        self.backend.remove(TOKEN_KEY)?;
        self.state.send_replace(SessionState::signed_out());
        debug!(target: "churchman::session", "token cleared");
        Ok(())
    }

    pub fn state(&self) -> SessionState { self.state.borrow().clone() }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> { self.state.subscribe() }
}
