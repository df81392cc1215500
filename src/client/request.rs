use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// Whether a request carries the stored bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Bearer,
    Anonymous,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    /// `application/x-www-form-urlencoded` fields, in submission order.
    Form(Vec<(String, String)>),
}

impl Body {
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Body::Empty => None,
            Body::Json(_) => Some("application/json"),
            Body::Form(_) => Some("application/x-www-form-urlencoded"),
        }
    }
}

/// A normalized, non-empty bearer token. Only obtainable through the session guard.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(pub(crate) String);

impl Credential {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str("Credential(***)") }
}

/// Authorization and content-type headers for one request.
pub fn build_headers(cred: Option<&Credential>, body: &Body) -> ClientResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(c) = cred {
        let v = HeaderValue::from_str(&format!("Bearer {}", c.as_str()))
            .map_err(|_| ClientError::storage("stored token contains characters not allowed in a header"))?;
        headers.insert(AUTHORIZATION, v);
    }
    if let Some(ct) = body.content_type() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(ct));
    }
    Ok(headers)
}

/// Status plus decoded JSON body. Non-JSON bodies decode as `Value::Null`.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }

    pub fn message(&self) -> Option<String> { self.text_field("message") }

    /// FastAPI error detail; validation errors come back as a list of objects with `msg`.
    pub fn detail(&self) -> Option<String> {
        match self.body.get("detail")? {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => {
                let msgs: Vec<String> = items.iter()
                    .filter_map(|i| i.get("msg").and_then(|m| m.as_str()).map(str::to_string))
                    .collect();
                if msgs.is_empty() { None } else { Some(msgs.join("; ")) }
            }
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Whatever the server said: `message` first, then `detail`.
    pub fn server_message(&self) -> Option<String> { self.message().or_else(|| self.detail()) }

    pub fn parse<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_value(self.body.clone()).map_err(|e| ClientError::decode(format!("HTTP {} body: {}", self.status, e)))
    }

    fn text_field(&self, key: &str) -> Option<String> {
        match self.body.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
