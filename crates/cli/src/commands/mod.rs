//! Command implementations.
//!
//! Every command builds its own config, credential store, transport, and
//! session; nothing is shared between invocations except the credential file.

use std::sync::Arc;

use payment_voucher_console::account::AccountError;
use payment_voucher_console::{
    ApiClient, ApiError, ConfigError, ConsoleConfig, FileCredentialStore, Session, SessionError,
};
use thiserror::Error;

pub mod account;
pub mod auth;
pub mod navigate;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client could not be built.
    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    /// Login or credential persistence failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Password recovery failed.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Reading input from the terminal failed.
    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),

    /// The command needs a logged-in session.
    #[error("Not logged in. Run `pv-cli login` first.")]
    NotLoggedIn,
}

/// Build an uninitialized session from the environment.
pub fn connect() -> Result<Session, CliError> {
    let config = ConsoleConfig::from_env()?;
    tracing::debug!(
        api_url = %config.api_url,
        credential_path = %config.credential_path.display(),
        "Console configured"
    );

    let store = Arc::new(FileCredentialStore::new(&config.credential_path));
    let api = ApiClient::new(&config, store)?;
    Ok(Session::new(api))
}

/// Build a session and resolve the stored credential.
pub async fn restore() -> Result<Session, CliError> {
    let session = connect()?;
    session.initialize().await;
    Ok(session)
}
