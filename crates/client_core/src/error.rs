use reqwest::StatusCode;
use shared::{error::ApiError, validation::FieldErrors};
use thiserror::Error;

/// Coarse classification used by front ends to pick a message and decide on re-login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Auth,
    Validation,
    NotFound,
    Other,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("not authorized ({status}): {message}")]
    Auth { status: u16, message: String },
    #[error("rejected by server ({status}): {message}")]
    Validation { status: u16, message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("unexpected response ({status}): {message}")]
    Unexpected { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no credential available; log in first")]
    MissingCredential,
    #[error("invalid api url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl GatewayError {
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = ApiError::message_from_body(body);
        let code = status.as_u16();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth {
                status: code,
                message,
            },
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::Validation {
                    status: code,
                    message,
                }
            }
            StatusCode::NOT_FOUND => Self::NotFound { message },
            _ => Self::Unexpected {
                status: code,
                message,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Auth { .. } | Self::MissingCredential => ErrorKind::Auth,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unexpected { .. } | Self::Decode(_) | Self::InvalidUrl(_) => ErrorKind::Other,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }

    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Validation => {
                "An employee with this email already exists or the data is invalid."
            }
            ErrorKind::Auth => "Your session is missing or expired. Please log in again.",
            ErrorKind::NotFound => "The employee no longer exists. Reload the list and try again.",
            ErrorKind::Network => {
                "The server could not be reached. Check the connection and retry."
            }
            ErrorKind::Other => "An unexpected error occurred. Please try again.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid form: {0}")]
    Form(FieldErrors),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<FieldErrors> for ClientError {
    fn from(value: FieldErrors) -> Self {
        Self::Form(value)
    }
}

impl ClientError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Form(errors) => format!("Please fix the form: {errors}"),
            Self::Gateway(err) => err.user_message().to_string(),
        }
    }
}
