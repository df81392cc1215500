//! Church level selection.
//!
//! After sign-in the user picks which level to act under. The flow fetches the levels
//! available to the token holder, opens a chooser when there is at least one, and trades
//! the chosen code for a token scoped to that level.

use reqwest::Method;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::{path_segment, ApiClient, Auth, Body};
use crate::error::{ClientError, ClientResult};
use crate::models::{AccessGrant, SelectLevelResponse, UserLevel};
use crate::session::normalize;

use super::{guard, Guarded, Route};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelSelectionState {
    LevelsUnknown,
    LevelsLoaded,
    Selecting { code: String },
    Reselected,
    Failed { message: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    NotLoggedIn,
    Loaded { levels: usize, modal_open: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    NotLoggedIn,
    Reselected { message: Option<String>, access: Vec<AccessGrant>, navigate: Route },
    Rejected { status: u16, message: Option<String> },
}

pub struct LevelSelection {
    client: ApiClient,
    state: LevelSelectionState,
    levels: Vec<UserLevel>,
    modal_open: bool,
    access: Vec<AccessGrant>,
}

impl LevelSelection {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: LevelSelectionState::LevelsUnknown,
            levels: Vec::new(),
            modal_open: false,
            access: Vec::new(),
        }
    }

    pub fn state(&self) -> &LevelSelectionState { &self.state }
    pub fn levels(&self) -> &[UserLevel] { &self.levels }
    pub fn modal_open(&self) -> bool { self.modal_open }
    /// Grant returned by the last successful selection. Never persisted.
    pub fn access(&self) -> &[AccessGrant] { &self.access }

    /// Mount: fetch levels and open the chooser when there is something to choose.
    /// Without a stored token this logs and returns quietly.
    pub async fn load(&mut self) -> ClientResult<LoadOutcome> {
        let fetched = match guard("load levels", self.fetch_levels().await) {
            Ok(f) => f,
            Err(e) => {
                // the chooser only shows what the latest fetch returned
                self.levels.clear();
                self.modal_open = false;
                self.state = LevelSelectionState::LevelsUnknown;
                return Err(e);
            }
        };
        let levels = match fetched {
            Guarded::Ran(l) => l,
            Guarded::NotLoggedIn => return Ok(LoadOutcome::NotLoggedIn),
        };
        self.modal_open = !levels.is_empty();
        self.levels = levels;
        self.state = LevelSelectionState::LevelsLoaded;
        info!(target: "churchman::flow", levels = self.levels.len(), "levels loaded");
        Ok(LoadOutcome::Loaded { levels: self.levels.len(), modal_open: self.modal_open })
    }

    /// `GET /auth/user_levels/me`. A non-2xx answer is a generic failure; the server's
    /// detail is not carried.
    pub async fn fetch_levels(&self) -> ClientResult<Vec<UserLevel>> {
        let resp = self.client.send(Method::GET, "auth/user_levels/me", Body::Empty, Auth::Bearer).await?;
        if !resp.is_success() {
            warn!(target: "churchman::flow", status = resp.status, "level fetch failed");
            return Err(ClientError::Rejected { status: resp.status, message: None });
        }
        match &resp.body {
            Value::Null => Ok(Vec::new()),
            _ => resp.parse(),
        }
    }

    /// Exchange `code` for a token scoped to that level.
    pub async fn select_level(&mut self, code: &str) -> ClientResult<SelectOutcome> {
        let code = code.trim();
        if code.is_empty() { return Err(ClientError::Validation { field: "Church level" }); }
        let prev = std::mem::replace(&mut self.state, LevelSelectionState::Selecting { code: code.to_string() });
        let out = self.exchange(code).await;
        match &out {
            Ok(SelectOutcome::Reselected { .. }) => {}
            Ok(SelectOutcome::Rejected { message, .. }) => {
                self.state = LevelSelectionState::Failed { message: message.clone() };
            }
            Ok(SelectOutcome::NotLoggedIn) | Err(_) => self.state = prev,
        }
        out
    }

    /// Dismiss the chooser without selecting.
    pub fn close_modal(&mut self) { self.modal_open = false; }

    async fn exchange(&mut self, code: &str) -> ClientResult<SelectOutcome> {
        let path = format!("auth/select_level/{}", path_segment(code));
        let sent = self.client.send(Method::POST, &path, Body::Json(Value::String(code.to_string())), Auth::Bearer).await;
        let resp = match guard("select level", sent)? {
            Guarded::Ran(r) => r,
            Guarded::NotLoggedIn => return Ok(SelectOutcome::NotLoggedIn),
        };
        if !resp.is_success() {
            let message = resp.server_message();
            warn!(target: "churchman::flow", code, status = resp.status, "level selection rejected: {}", message.as_deref().unwrap_or("<no message>"));
            return Ok(SelectOutcome::Rejected { status: resp.status, message });
        }
        let body: SelectLevelResponse = resp.parse()?;
        if normalize(&body.access_token).is_empty() {
            return Err(ClientError::decode("select_level response carried an empty access_token"));
        }
        self.client.session().set_token(&body.access_token)?;
        self.access = body.user_access.clone();
        self.modal_open = false;
        self.state = LevelSelectionState::Reselected;
        info!(target: "churchman::flow", code, grants = self.access.len(), "level selected");
        Ok(SelectOutcome::Reselected { message: body.message, access: body.user_access, navigate: Route::Root })
    }
}
