//! Login, signup and logout.
//!
//! A submission is a single attempt: the form goes out once, a 2xx response with an
//! `access_token` stores the token and asks for the root route, anything else surfaces
//! the server's message and leaves the stored token alone.

use reqwest::Method;
use tracing::{info, warn};

use crate::client::{ApiClient, Auth, Body};
use crate::error::{ClientError, ClientResult};
use crate::models::TokenResponse;
use crate::session::normalize;

use super::Route;

/// Form state. There is no failed state: a rejected or failed submission returns to
/// `Idle` so the form can be resubmitted, and the failure is reported in the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    Submitting,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    SignedIn { message: Option<String>, navigate: Route },
    Rejected { status: u16, message: Option<String> },
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    fn check(&self) -> ClientResult<()> {
        if self.username.trim().is_empty() { return Err(ClientError::Validation { field: "Usercode" }); }
        if self.password.is_empty() { return Err(ClientError::Validation { field: "Password" }); }
        Ok(())
    }

    fn form(&self) -> Vec<(String, String)> {
        vec![
            ("username".to_string(), self.username.trim().to_string()),
            ("password".to_string(), self.password.clone()),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl SignupRequest {
    fn form(&self) -> Vec<(String, String)> {
        let mut fields = Credentials::new(self.username.clone(), self.password.clone()).form();
        let optional = [("email", &self.email), ("first_name", &self.first_name), ("last_name", &self.last_name)];
        for (k, v) in optional {
            if let Some(v) = v.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                fields.push((k.to_string(), v.to_string()));
            }
        }
        fields
    }
}

pub struct AuthFlow {
    client: ApiClient,
    state: AuthState,
    message: Option<String>,
}

impl AuthFlow {
    pub fn new(client: ApiClient) -> Self { Self { client, state: AuthState::Idle, message: None } }

    pub fn state(&self) -> AuthState { self.state }

    /// Last message the server sent back, success or failure.
    pub fn server_message(&self) -> Option<&str> { self.message.as_deref() }

    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<AuthOutcome> {
        let creds = Credentials::new(username, password);
        creds.check()?;
        self.submit("login", "auth/login", creds.form()).await
    }

    pub async fn signup(&mut self, req: &SignupRequest) -> ClientResult<AuthOutcome> {
        Credentials::new(req.username.clone(), req.password.clone()).check()?;
        self.submit("signup", "auth/signup", req.form()).await
    }

    /// Forget the stored token. Observers of the session see a signed-out state.
    pub fn logout(&mut self) -> ClientResult<Route> {
        self.client.session().clear()?;
        self.state = AuthState::Idle;
        self.message = None;
        info!(target: "churchman::flow", "signed out");
        Ok(Route::Login)
    }

    async fn submit(&mut self, action: &'static str, path: &str, fields: Vec<(String, String)>) -> ClientResult<AuthOutcome> {
        self.state = AuthState::Submitting;
        let out = self.exchange(action, path, fields).await;
        self.state = match &out {
            Ok(AuthOutcome::SignedIn { .. }) => AuthState::Success,
            _ => AuthState::Idle,
        };
        out
    }

    async fn exchange(&mut self, action: &'static str, path: &str, fields: Vec<(String, String)>) -> ClientResult<AuthOutcome> {
        let resp = self.client.send(Method::POST, path, Body::Form(fields), Auth::Anonymous).await?;
        if !resp.is_success() {
            let message = resp.server_message();
            warn!(target: "churchman::flow", action, status = resp.status, "rejected: {}", message.as_deref().unwrap_or("<no message>"));
            self.message = message.clone();
            return Ok(AuthOutcome::Rejected { status: resp.status, message });
        }
        let body: TokenResponse = resp.parse()?;
        if normalize(&body.access_token).is_empty() {
            return Err(ClientError::decode(format!("{} response carried an empty access_token", action)));
        }
        self.client.session().set_token(&body.access_token)?;
        info!(target: "churchman::flow", action, status = resp.status, "signed in");
        self.message = body.message.clone();
        Ok(AuthOutcome::SignedIn { message: body.message, navigate: Route::Root })
    }
}
