use std::io;

use {
    axum::{
        body::Body,
        http::{Response as HttpResponse, StatusCode},
        response::{IntoResponse, Response},
    },
    sqlx::migrate::MigrateError,
    thiserror::Error,
    tracing::error,
    url::ParseError,
};

/// Broad classes of failure, used to pick the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authorization,
    Validation,
    Configuration,
    Internal,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid session id")]
    InvalidSessionId,

    #[error("returnUrl is not application local: {0}")]
    NonLocalReturnUrl(String),

    #[error("The BFF middleware has not run for this request; add it to the router")]
    MissingBffMiddleware,

    #[error("No auth session on the request; the auth manager layer is missing")]
    MissingAuthSession,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML config: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("SQLx migrate error: {0}")]
    SqlxMigrate(#[from] MigrateError),

    #[error("Cannot parse URL")]
    ParseError(#[from] ParseError),

    #[error("Session error: {0}")]
    SessionError(String),
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSessionId => ErrorKind::Authorization,
            Self::NonLocalReturnUrl(_) => ErrorKind::Validation,
            Self::MissingBffMiddleware | Self::MissingAuthSession | Self::ConfigError(_) => {
                ErrorKind::Configuration
            }
            _ => ErrorKind::Internal,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.kind() {
            ErrorKind::Authorization => (StatusCode::FORBIDDEN, self.to_string()),
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, self.to_string()),
            ErrorKind::Configuration => {
                error!(err = %self, "Gateway is misconfigured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The gateway is misconfigured".to_string(),
                )
            }
            ErrorKind::Internal => {
                error!(err = %self, "Unexpected error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let full_message = format!("{status}: {error_message}");

        let mut response = HttpResponse::new(Body::from(full_message));
        *response.status_mut() = status;
        response
    }
}
