use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while synchronizing fleet state.
///
/// None of these terminate a session: inbound event errors reject a single
/// event, transport errors flip the connectivity status.
#[derive(Error, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Error {
    #[error("code: invalid_format, description: {0}")]
    InvalidFormat(String),

    #[error("code: missing_field, description: missing {0}")]
    MissingField(String),

    #[error("code: invalid_value, description: {0}")]
    InvalidValue(String),

    #[error("code: stale_event, description: epoch {0} is not the current subscription")]
    StaleEvent(u64),

    #[error("code: transport, description: {0}")]
    Transport(String),

    #[error("code: unauthenticated, description: no active principal")]
    Unauthenticated,

    #[error("code: server_error, description: {0}")]
    ServerError(String),
}

impl Error {
    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> &str {
        match self {
            Self::InvalidFormat(_) => "invalid_format",
            Self::MissingField(_) => "missing_field",
            Self::InvalidValue(_) => "invalid_value",
            Self::StaleEvent(_) => "stale_event",
            Self::Transport(_) => "transport",
            Self::Unauthenticated => "unauthenticated",
            Self::ServerError(_) => "server_error",
        }
    }

    /// Returns the error description.
    #[must_use]
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<Self>() {
            Some(Self::InvalidFormat(e)) => Self::InvalidFormat(format!("{err}: {e}")),
            Some(Self::MissingField(e)) => Self::MissingField(format!("{err}: {e}")),
            Some(Self::InvalidValue(e)) => Self::InvalidValue(format!("{err}: {e}")),
            Some(Self::Transport(e)) => Self::Transport(format!("{err}: {e}")),
            Some(Self::ServerError(e)) => Self::ServerError(format!("{err}: {e}")),
            Some(Self::StaleEvent(epoch)) => Self::StaleEvent(*epoch),
            Some(Self::Unauthenticated) => Self::Unauthenticated,
            None => {
                let stack = err.chain().fold(String::new(), |cause, e| format!("{cause} -> {e}"));
                let stack = stack.trim_start_matches(" -> ").to_string();
                Self::ServerError(stack)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        // serde reports absent struct fields as a data error with a fixed prefix
        let message = err.to_string();
        if let Some(field) = message.strip_prefix("missing field ") {
            let field = field.split_whitespace().next().unwrap_or_default().trim_matches('`');
            return Self::MissingField(field.to_string());
        }
        Self::InvalidFormat(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
