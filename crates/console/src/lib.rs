//! Payment voucher console library.
//!
//! Session lifecycle and role-based access control for the voucher admin
//! console:
//!
//! - [`session::Session`] resolves a persisted credential into an identity,
//!   and handles login and logout.
//! - [`transport::ApiClient`] attaches the credential to every API request
//!   and normalizes every failure into [`transport::ApiError`].
//! - [`guard::evaluate`] decides whether a protected view renders.
//! - [`routes::RouteTable`] maps locations to views and runs the guard.
//!
//! Everything is constructed explicitly and passed by reference; there is no
//! global session.
//!
//! ```rust,ignore
//! let config = ConsoleConfig::from_env()?;
//! let store = Arc::new(FileCredentialStore::new(&config.credential_path));
//! let session = Session::new(ApiClient::new(&config, store)?);
//! session.initialize().await;
//!
//! match RouteTable::standard().navigate(&session.snapshot(), "/my-vouchers") {
//!     Navigation::Render { view, .. } => println!("{}", view.title()),
//!     other => println!("{other:?}"),
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod config;
pub mod credentials;
pub mod guard;
pub mod routes;
pub mod session;
pub mod transport;

pub use config::{ConfigError, ConsoleConfig};
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoreError};
pub use guard::{GuardDecision, Redirect, RouteConstraint};
pub use routes::{Access, Navigation, RouteTable, View};
pub use session::{Session, SessionError, SessionState};
pub use transport::{ApiClient, ApiError, ApiErrorKind};
