//! Unified client error model.
//! One enum covers every failure a flow can hit: missing credential, transport, server
//! rejection, presence checks, decoding and session storage. `surface()` tells a
//! front-end how loudly to report each kind.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("token not found")]
    MissingCredential,
    #[error("{field} is required")]
    Validation { field: &'static str },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("request rejected: HTTP {status}{}", detail_suffix(.message))]
    Rejected { status: u16, message: Option<String> },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("session storage error: {0}")]
    Storage(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

fn detail_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(": {}", m),
        _ => String::new(),
    }
}

/// How a front-end reports an error to the person driving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Log and abort quietly ("not logged in yet").
    Silent,
    /// Log only; nothing shown to the user.
    LogOnly,
    /// Blocking message to the user.
    Alert,
}

impl ClientError {
    pub fn code_str(&self) -> &'static str {
        match self {
            ClientError::MissingCredential => "missing_credential",
            ClientError::Validation { .. } => "validation",
            ClientError::Transport(_) => "transport",
            ClientError::Rejected { .. } => "rejected",
            ClientError::Decode(_) => "decode",
            ClientError::Storage(_) => "storage",
            ClientError::Config(_) => "config",
        }
    }

    /// Server-provided text, when the server sent any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn surface(&self) -> Surface {
        match self {
            ClientError::MissingCredential => Surface::Silent,
            ClientError::Transport(_) | ClientError::Decode(_) => Surface::LogOnly,
            ClientError::Rejected { message: None, .. } => Surface::LogOnly,
            ClientError::Rejected { .. }
            | ClientError::Validation { .. }
            | ClientError::Storage(_)
            | ClientError::Config(_) => Surface::Alert,
        }
    }

    pub fn rejected<S: Into<String>>(status: u16, message: Option<S>) -> Self {
        ClientError::Rejected { status, message: message.map(Into::into) }
    }
    pub fn decode<S: Into<String>>(msg: S) -> Self { ClientError::Decode(msg.into()) }
    pub fn storage<S: Into<String>>(msg: S) -> Self { ClientError::Storage(msg.into()) }
    pub fn config<S: Into<String>>(msg: S) -> Self { ClientError::Config(msg.into()) }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self { ClientError::Storage(err.to_string()) }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_mapping() {
        assert_eq!(ClientError::MissingCredential.surface(), Surface::Silent);
        assert_eq!(ClientError::rejected(400, Some("bad creds")).surface(), Surface::Alert);
        assert_eq!(ClientError::rejected::<String>(500, None).surface(), Surface::LogOnly);
        assert_eq!(ClientError::decode("no token").surface(), Surface::LogOnly);
        assert_eq!(ClientError::Validation { field: "Usercode" }.surface(), Surface::Alert);
        assert_eq!(ClientError::storage("disk full").surface(), Surface::Alert);
    }

    #[test]
    fn display_includes_server_detail() {
        let e = ClientError::rejected(401, Some("Could not validate credentials"));
        assert_eq!(e.to_string(), "request rejected: HTTP 401: Could not validate credentials");
        assert_eq!(e.server_message(), Some("Could not validate credentials"));
        assert_eq!(e.code_str(), "rejected");

        let bare = ClientError::rejected::<String>(500, None);
        assert_eq!(bare.to_string(), "request rejected: HTTP 500");
        assert_eq!(bare.server_message(), None);
    }

    #[test]
    fn validation_message_names_field() {
        assert_eq!(ClientError::Validation { field: "Password" }.to_string(), "Password is required");
    }
}
