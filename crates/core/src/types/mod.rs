//! Core types for the payment voucher console.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod identity;
pub mod role;

pub use credential::Credential;
pub use email::{Email, EmailError};
pub use id::*;
pub use identity::Identity;
pub use role::{Role, RoleParseError};
