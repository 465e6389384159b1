//! Identity Error Types
//!
//! Identity-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.
//!
//! The gateway rejection variants (`MissingToken`, `TokenInvalid`,
//! `SessionRevoked`, `SessionExpired`) all map to 401 on the wire but stay
//! distinct: audit trails and tests depend on telling them apart, so each
//! carries its own machine-readable reason code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Identity-specific result type alias
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity-specific error variants
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Malformed or missing input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Email already belongs to an account
    #[error("Email is already registered")]
    EmailTaken,

    /// Account not found
    #[error("Account not found")]
    AccountNotFound,

    /// Wrong email/password combination
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account is locked by an administrator
    #[error("Account is locked")]
    AccountLocked,

    /// Verification code absent or past its TTL
    #[error("Verification code expired or was never issued")]
    CodeMissing,

    /// Supplied verification code does not match; the stored code stays valid
    #[error("Verification code does not match")]
    CodeMismatch,

    /// No bearer token on the request
    #[error("Authentication token required")]
    MissingToken,

    /// Token signature invalid or cryptographically expired
    #[error("Invalid or expired token")]
    TokenInvalid,

    /// No session row backs the token (logged out or force-revoked)
    #[error("Session is invalid or has been revoked")]
    SessionRevoked,

    /// Session row exists but its expiry has passed
    #[error("Session has expired")]
    SessionExpired,

    /// Privileged operation targeting the acting account itself
    #[error("Operation may not target your own account")]
    SelfTarget,

    /// Acting account lacks the required role
    #[error("Insufficient privileges")]
    Forbidden,

    /// Database error (transient; propagated, never retried here)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IdentityError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            IdentityError::Validation(_) => StatusCode::BAD_REQUEST,
            IdentityError::EmailTaken => StatusCode::CONFLICT,
            IdentityError::AccountNotFound => StatusCode::NOT_FOUND,
            IdentityError::InvalidCredentials | IdentityError::CodeMismatch => {
                StatusCode::UNAUTHORIZED
            }
            IdentityError::AccountLocked
            | IdentityError::SelfTarget
            | IdentityError::Forbidden => StatusCode::FORBIDDEN,
            IdentityError::CodeMissing => StatusCode::GONE,
            IdentityError::MissingToken
            | IdentityError::TokenInvalid
            | IdentityError::SessionRevoked
            | IdentityError::SessionExpired => StatusCode::UNAUTHORIZED,
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::Validation(_) => ErrorKind::BadRequest,
            IdentityError::EmailTaken => ErrorKind::Conflict,
            IdentityError::AccountNotFound => ErrorKind::NotFound,
            IdentityError::InvalidCredentials
            | IdentityError::CodeMismatch
            | IdentityError::MissingToken
            | IdentityError::TokenInvalid
            | IdentityError::SessionRevoked
            | IdentityError::SessionExpired => ErrorKind::Unauthorized,
            IdentityError::AccountLocked
            | IdentityError::SelfTarget
            | IdentityError::Forbidden => ErrorKind::Forbidden,
            IdentityError::CodeMissing => ErrorKind::Gone,
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Stable machine-readable reason code
    ///
    /// Several variants share a transport status; this code is what audit
    /// trails and clients should branch on.
    pub fn reason(&self) -> &'static str {
        match self {
            IdentityError::Validation(_) => "validation",
            IdentityError::EmailTaken => "email-taken",
            IdentityError::AccountNotFound => "account-not-found",
            IdentityError::InvalidCredentials => "invalid-credentials",
            IdentityError::AccountLocked => "account-locked",
            IdentityError::CodeMissing => "code-missing",
            IdentityError::CodeMismatch => "code-mismatch",
            IdentityError::MissingToken => "no-token",
            IdentityError::TokenInvalid => "invalid-or-expired-token",
            IdentityError::SessionRevoked => "session-invalid-or-revoked",
            IdentityError::SessionExpired => "session-expired",
            IdentityError::SelfTarget => "self-target",
            IdentityError::Forbidden => "forbidden",
            IdentityError::Database(_) => "store-unavailable",
            IdentityError::Internal(_) => "internal",
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error at an appropriate level
    ///
    /// Messages never include credentials, codes, or tokens.
    fn log(&self) {
        match self {
            IdentityError::Database(e) => {
                tracing::error!(error = %e, "Identity database error");
            }
            IdentityError::Internal(msg) => {
                tracing::error!(message = %msg, "Identity internal error");
            }
            IdentityError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            IdentityError::AccountLocked => {
                tracing::warn!("Operation attempted on locked account");
            }
            IdentityError::SessionRevoked | IdentityError::SessionExpired => {
                tracing::info!(reason = self.reason(), "Session rejected");
            }
            _ => {
                tracing::debug!(reason = self.reason(), "Identity error");
            }
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();

        // RFC 7807 body, extended with the stable reason code
        let body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", status.as_u16()),
            "title": self.kind().as_str(),
            "status": status.as_u16(),
            "detail": self.to_string(),
            "reason": self.reason(),
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<AppError> for IdentityError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => IdentityError::Validation(err.message().to_string()),
            ErrorKind::Conflict => IdentityError::EmailTaken,
            ErrorKind::NotFound => IdentityError::AccountNotFound,
            _ => IdentityError::Internal(err.to_string()),
        }
    }
}
