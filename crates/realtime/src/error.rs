//! Errors surfaced at the platform's HTTP boundary.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = anyhow::Result<T, Error>;

/// Errors returned to callers of the read API.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Error {
    /// The request was malformed (bad query parameter, bad body).
    #[error("code: 400, description: {0}")]
    BadRequest(String),

    /// The requested vehicle, route or resource does not exist.
    #[error("code: 404, description: {0}")]
    NotFound(String),

    /// The live session is not running (not started or already torn down).
    #[error("code: 503, description: {0}")]
    Unavailable(String),

    /// A non recoverable internal error occurred.
    #[error("code: 500, description: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the HTTP status associated with the variant.
    #[must_use]
    pub const fn code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
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
        let chain = err.chain().map(ToString::to_string).collect::<Vec<_>>().join(" -> ");

        // keep the variant, replace the message with the full context chain
        if let Some(inner) = err.downcast_ref::<Self>() {
            tracing::debug!("Error: {err}, caused by: {inner}");

            return match inner {
                Self::BadRequest(_) => Self::BadRequest(chain),
                Self::NotFound(_) => Self::NotFound(chain),
                Self::Unavailable(_) => Self::Unavailable(chain),
                Self::Internal(_) => Self::Internal(chain),
            };
        }

        Self::Internal(chain)
    }
}

/// Result type returned by HTTP handlers.
pub type HttpResult<T> = std::result::Result<T, HttpError>;

/// JSON error body returned by HTTP handlers.
#[derive(Debug, Serialize)]
pub struct HttpError {
    #[serde(skip)]
    status: StatusCode,
    code: u16,
    description: String,
}

impl From<Error> for HttpError {
    fn from(err: Error) -> Self {
        let status = err.code();
        Self { status, code: status.as_u16(), description: err.to_string() }
    }
}

impl From<anyhow::Error> for HttpError {
    fn from(e: anyhow::Error) -> Self {
        let description = format!("{e}, caused by: {}", e.root_cause());
        let status = e.downcast_ref().map_or(StatusCode::INTERNAL_SERVER_ERROR, Error::code);
        Self { status, code: status.as_u16(), description }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[macro_export]
macro_rules! bad_request {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::BadRequest(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::BadRequest(format!($err))
    };
}

#[macro_export]
macro_rules! not_found {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::NotFound(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::NotFound(format!($err))
    };
}

#[macro_export]
macro_rules! unavailable {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::Unavailable(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::Unavailable(format!($err))
    };
}

#[cfg(test)]
mod tests {
    use anyhow::{Context, Result, anyhow};
    use http::StatusCode;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Registry, fmt};

    use super::{Error, HttpError};

    #[test]
    fn error_display() {
        let err = Error::NotFound("vehicle BUS_404".to_string());
        assert_eq!(format!("{err}"), "code: 404, description: vehicle BUS_404");
        assert_eq!(err.code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn with_context() {
        let _ = Registry::default().with(EnvFilter::new("debug")).with(fmt::layer()).try_init();

        let context_error = || -> Result<(), Error> {
            Err(Error::BadRequest("limit must be a number".to_string()))
                .context("reading alerts")
                .context("handling request")?;
            Ok(())
        };

        let result = context_error();
        assert_eq!(
            result.unwrap_err(),
            Error::BadRequest(
                "handling request -> reading alerts -> code: 400, description: limit must be a number"
                    .to_string()
            )
        );
    }

    #[test]
    fn anyhow_context() {
        let result = Err::<(), anyhow::Error>(anyhow!("socket closed")).context("session loop");
        let err: Error = result.unwrap_err().into();

        assert_eq!(err.to_string(), "code: 500, description: session loop -> socket closed");
    }

    #[test]
    fn unavailable_macro() {
        let err = unavailable!("session {} stopped", "ops@example.com");
        assert_eq!(err, Error::Unavailable("session ops@example.com stopped".to_string()));
        assert_eq!(err.code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn http_error_status() {
        let err: HttpError = anyhow::Error::new(Error::Unavailable("session ended".to_string()))
            .context("clearing alerts")
            .into();
        let body = serde_json::to_value(&err).expect("should serialize");
        assert_eq!(body["code"], 503);
    }
}
