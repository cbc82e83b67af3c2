//! Password recovery flows.
//!
//! Both calls go through the same [`ApiClient`] as the session, so they carry
//! the current credential when one exists, though neither requires it.

use payment_voucher_core::{Email, EmailError};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::transport::{ApiClient, ApiError};

/// Endpoint that emails a password reset link.
pub const REQUEST_PASSWORD_CHANGE_PATH: &str = "/api/auth/request-password-change";

/// Endpoint prefix that sets a new password for a reset token.
pub const RESET_PASSWORD_PATH: &str = "/api/auth/reset-password";

/// Errors from the account recovery flows.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The email address was rejected before contacting the server.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The reset token was empty.
    #[error("Reset token is missing")]
    MissingToken,

    /// New password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// The reset email could not be requested.
    #[error("Failed to send password reset email")]
    RequestFailed(#[source] ApiError),

    /// The server refused the new password.
    #[error("Failed to reset password. The link may be expired.")]
    ResetFailed(#[source] ApiError),
}

impl AccountError {
    /// Normalized transport error behind a server-side failure.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::RequestFailed(e) | Self::ResetFailed(e) => Some(e),
            Self::InvalidEmail(_) | Self::MissingToken | Self::PasswordMismatch => None,
        }
    }
}

#[derive(Serialize)]
struct PasswordChangeRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    new_password: &'a str,
}

/// Ask the server to email a password reset link to `email`.
///
/// # Errors
///
/// Returns `AccountError::InvalidEmail` for a malformed address and
/// `AccountError::RequestFailed` if the server call fails.
#[instrument(skip(api))]
pub async fn request_password_change(api: &ApiClient, email: &str) -> Result<(), AccountError> {
    let email = Email::parse(email)?;

    api.post::<_, serde_json::Value>(
        REQUEST_PASSWORD_CHANGE_PATH,
        &PasswordChangeRequest {
            email: email.as_str(),
        },
    )
    .await
    .map_err(|e| {
        warn!(error = %e, status = ?e.status, "Password change request failed");
        AccountError::RequestFailed(e)
    })?;

    info!("Password reset email requested");
    Ok(())
}

/// Set a new password using the reset `token` from the emailed link.
///
/// The confirmation is checked locally; a mismatch never reaches the server.
///
/// # Errors
///
/// Returns `AccountError::MissingToken` or `AccountError::PasswordMismatch`
/// before any request, and `AccountError::ResetFailed` if the server call
/// fails.
#[instrument(skip(api, token, new_password, confirm_password))]
pub async fn reset_password(
    api: &ApiClient,
    token: &str,
    new_password: &SecretString,
    confirm_password: &SecretString,
) -> Result<(), AccountError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AccountError::MissingToken);
    }
    if new_password.expose_secret() != confirm_password.expose_secret() {
        return Err(AccountError::PasswordMismatch);
    }

    let encoded: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
    let path = format!("{RESET_PASSWORD_PATH}/{encoded}");

    api.post::<_, serde_json::Value>(
        &path,
        &ResetPasswordRequest {
            new_password: new_password.expose_secret(),
        },
    )
    .await
    .map_err(|e| {
        warn!(error = %e, status = ?e.status, "Password reset failed");
        AccountError::ResetFailed(e)
    })?;

    info!("Password reset");
    Ok(())
}
