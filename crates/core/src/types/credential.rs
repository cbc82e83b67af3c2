//! Bearer credential type.

use secrecy::{ExposeSecret, SecretString};

/// Opaque bearer token proving an authenticated session to the voucher API.
///
/// Wraps a [`SecretString`] so the token never shows up in `Debug` output or
/// tracing fields.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Create a credential from a token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Expose the raw token (for the `Authorization` header or persistence).
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the token is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}
