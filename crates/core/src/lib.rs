//! Payment Voucher Core - Shared types library.
//!
//! This crate provides common types used across all payment voucher components:
//! - `console` - Session lifecycle, credentialed transport, and route guard
//! - `cli` - Command-line front end built on the console library
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persisted state. This keeps it lightweight and allows it to be
//! used anywhere, including inside unit tests with no runtime.
//!
//! # Modules
//!
//! - [`types`] - Roles, identities, credentials, emails, and type-safe IDs
//! - [`navigation`] - The role to navigation-entry capability map

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod navigation;
pub mod types;

pub use navigation::{Icon, NavigationEntry, menu_for};
pub use types::*;
