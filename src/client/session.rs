use reqwest::{Method, Url};
use serde_json::Value;
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::AccessGrant;
use crate::session::SessionStore;

use super::request::{build_headers, ApiResponse, Auth, Body, Credential};

/// HTTP access to the API with the session store injected. Every bearer request goes
/// through [`ApiClient::credential`], so a missing token stops the call before anything
/// touches the network.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig, session: SessionStore) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = cfg.timeout { builder = builder.timeout(t); }
        let http = builder.build()?;
        Ok(Self { base: cfg.base_url.clone(), http, session })
    }

    pub fn base(&self) -> &Url { &self.base }

    pub fn session(&self) -> &SessionStore { &self.session }

    /// The stored token, normalized, or `MissingCredential`.
    pub fn credential(&self) -> ClientResult<Credential> {
        match self.session.token() {
            Some(t) => Ok(Credential(t)),
            None => Err(ClientError::MissingCredential),
        }
    }

    pub fn url(&self, path: &str) -> ClientResult<Url> {
        self.base.join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::config(format!("cannot join '{}' onto {}: {}", path, self.base, e)))
    }

    pub fn request(&self, method: Method, path: &str, body: Body, auth: Auth) -> ClientResult<reqwest::RequestBuilder> {
        let cred = match auth {
            Auth::Bearer => Some(self.credential()?),
            Auth::Anonymous => None,
        };
        let url = self.url(path)?;
        let headers = build_headers(cred.as_ref(), &body)?;
        let rb = self.http.request(method, url).headers(headers);
        Ok(match body {
            Body::Empty => rb,
            Body::Json(v) => rb.body(v.to_string()),
            Body::Form(fields) => rb.body(encode_form(&fields)),
        })
    }

    /// Send one request and decode its JSON body. Transport failures are logged here
    /// and returned; server rejections come back as a normal `ApiResponse`.
    pub async fn send(&self, method: Method, path: &str, body: Body, auth: Auth) -> ClientResult<ApiResponse> {
        let label = format!("{} {}", method, path);
        let rb = self.request(method, path, body, auth)?;
        let resp = match rb.send().await {
            Ok(r) => r,
            Err(e) => {
                error!(target: "churchman::client", "{} failed: {}", label, e);
                return Err(ClientError::Transport(e));
            }
        };
        let status = resp.status().as_u16();
        let text = match resp.text().await {
            Ok(t) => t,
            Err(e) => {
                error!(target: "churchman::client", "{} body read failed: {}", label, e);
                return Err(ClientError::Transport(e));
            }
        };
        let body = if text.trim().is_empty() { Value::Null } else { serde_json::from_str(&text).unwrap_or(Value::Null) };
        debug!(target: "churchman::client", status, "{}", label);
        Ok(ApiResponse { status, body })
    }

    /// `GET /auth/users/me`: access records behind the current token.
    pub async fn current_user_access(&self) -> ClientResult<Vec<AccessGrant>> {
        let resp = self.send(Method::GET, "auth/users/me", Body::Empty, Auth::Bearer).await?;
        if !resp.is_success() {
            return Err(ClientError::rejected(resp.status, resp.server_message()));
        }
        match &resp.body {
            Value::Array(_) => resp.parse(),
            Value::Object(_) => Ok(vec![resp.parse::<AccessGrant>()?]),
            _ => Ok(Vec::new()),
        }
    }
}

fn encode_form(fields: &[(String, String)]) -> String {
    fields.iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode a value for use as one path segment.
pub(crate) fn path_segment(v: &str) -> String { urlencoding::encode(v).into_owned() }
