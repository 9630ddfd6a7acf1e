//! # nnev-core
//!
//! Core types shared by the noname e.V. directory management tools.
//!
//! ## Modules
//!
//! - [`error`] - Error type shared by the directory adapter and the CLI
//! - [`config`] - File-backed settings for the LDAP connection and account defaults

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::Settings;
pub use error::{Error, Result};
