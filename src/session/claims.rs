use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Unverified view of a JWT payload as issued by the ChurchMan API.
/// The signature is never checked here; the server remains the authority.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    #[serde(default)]
    pub usercode: Option<String>,
    #[serde(default)]
    pub church_level: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> { DateTime::from_timestamp(self.exp?, 0) }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(t) => t <= now,
            None => false,
        }
    }
}

/// Decode the middle segment of a `header.payload.signature` token.
/// Returns `None` for anything that is not a three-part base64url JSON token.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let mut parts = token.split('.');
    let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || payload.is_empty() { return None; }
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: &serde_json::Value) -> String {
    let enc = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!("{}.{}.sig", enc.encode(br#"{"alg":"HS256","typ":"JWT"}"#), enc.encode(payload.to_string()))
}
