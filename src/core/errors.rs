use spin_sdk::http::Response;
use std::fmt;

use crate::templates;

/// Request-level failure taxonomy. Validation failures never reach this
/// type: handlers re-render the form page themselves with status 200.
#[derive(Debug)]
pub enum AppError {
    /// Missing entity, rendered as the 404 page.
    NotFound,
    /// Rendered as the 403 page.
    Forbidden,
    /// Constraint violation in the repository, e.g. a self-follow.
    Integrity(String),
    /// Anything unhandled, rendered as the 500 page.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound => write!(f, "Not Found"),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::Integrity(msg) => write!(f, "Integrity Error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(other) => AppError::Internal(other.to_string()),
        }
    }
}

impl From<AppError> for Response {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NotFound => templates::render_error_page(404),
            AppError::Forbidden => templates::render_error_page(403),
            AppError::Integrity(msg) => {
                tracing::warn!(error = %msg, "integrity violation");
                templates::render_error_page(500)
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "unhandled failure");
                templates::render_error_page(500)
            }
        }
    }
}
