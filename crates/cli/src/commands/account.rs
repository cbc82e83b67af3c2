//! Password recovery commands.
//!
//! # Usage
//!
//! ```bash
//! pv-cli request-password-change -e clerk@example.com
//! pv-cli reset-password --token abc123 --password s3cret --confirm s3cret
//! ```

use payment_voucher_console::account;
use secrecy::SecretString;

use super::{CliError, connect};

/// Email a password reset link.
#[allow(clippy::print_stdout)]
pub async fn request_password_change(email: &str) -> Result<(), CliError> {
    let session = connect()?;
    account::request_password_change(session.api(), email).await?;
    println!("Password reset email sent to {email}");
    Ok(())
}

/// Set a new password from a reset token.
#[allow(clippy::print_stdout)]
pub async fn reset_password(token: &str, password: String, confirm: String) -> Result<(), CliError> {
    let session = connect()?;
    account::reset_password(
        session.api(),
        token,
        &SecretString::from(password),
        &SecretString::from(confirm),
    )
    .await?;
    println!("Password reset. You can now log in with the new password.");
    Ok(())
}
