//! Core types and configuration for sapcli.
//!
//! This crate provides the building blocks shared by the sapcli XML codec:
//! validated element identifiers, codec configuration, and the common
//! error type.

mod config;
mod error;
mod types;

pub use config::CodecConfig;
pub use error::{SapCliError, SapCliResult};
pub use types::Identifier;
