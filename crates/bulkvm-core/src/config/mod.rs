//! Configuration and profile management
//!
//! A small profile system for naming deployment targets: project,
//! default zone/region, API endpoint, and credentials. Profiles are
//! immutable values once loaded; environment-variable references in
//! credential fields are expanded at resolution time.

pub mod config;
pub mod error;

pub use config::{Config, Profile};
pub use error::{ConfigError, Result};
