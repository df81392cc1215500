//! User-facing flows over the API: authentication, level selection and the hierarchy view.
//! Each flow owns its transient state and reports what the front-end should show next.

pub mod auth;
pub mod hierarchy;
pub mod levels;

use tracing::info;

use crate::error::{ClientError, ClientResult};

pub use auth::{AuthFlow, AuthOutcome, AuthState, Credentials, SignupRequest};
pub use hierarchy::{HierarchyOutcome, HierarchyView};
pub use levels::{LevelSelection, LevelSelectionState, LoadOutcome, SelectOutcome};

/// Front-end destinations a flow can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Signup,
    Hierarchy,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Hierarchy => "/hierarchy",
        }
    }
}

/// Outcome of a step that needs a stored credential.
#[derive(Debug, Clone, PartialEq)]
pub enum Guarded<T> {
    Ran(T),
    /// No token: the step was skipped before any request was made.
    NotLoggedIn,
}

impl<T> Guarded<T> {
    pub fn ran(self) -> Option<T> {
        match self {
            Guarded::Ran(v) => Some(v),
            Guarded::NotLoggedIn => None,
        }
    }
}

/// Turn a missing credential into a logged, non-failing skip. Other errors pass through.
pub fn guard<T>(action: &str, res: ClientResult<T>) -> ClientResult<Guarded<T>> {
    match res {
        Ok(v) => Ok(Guarded::Ran(v)),
        Err(ClientError::MissingCredential) => {
            info!(target: "churchman::flow", action, "token not found; skipping");
            Ok(Guarded::NotLoggedIn)
        }
        Err(e) => Err(e),
    }
}
