use chrono::{DateTime, Utc};

use super::claims::decode_claims;

/// Snapshot of the session as seen by consumers. Published on every token write or clear,
/// so views re-render from this instead of reloading the whole application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub signed_in: bool,
    pub usercode: Option<String>,
    /// Church level the current token is scoped to, once one has been selected.
    pub level: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn signed_out() -> Self { Self::default() }

    /// Derive state from a normalized token; opaque tokens yield a bare signed-in state.
    /// A token whose expiry has passed is signed out.
    pub fn from_token(token: &str) -> Self { Self::from_token_at(token, Utc::now()) }

    pub fn from_token_at(token: &str, now: DateTime<Utc>) -> Self {
        if token.is_empty() { return Self::signed_out(); }
        let claims = decode_claims(token).unwrap_or_default();
        if claims.is_expired_at(now) { return Self::signed_out(); }
        Self {
            signed_in: true,
            expires_at: claims.expires_at(),
            usercode: claims.usercode,
            level: claims.church_level,
        }
    }
}
