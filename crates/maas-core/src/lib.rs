//! # maas-core
//!
//! Core types and utilities for working with the MAAS REST API.
//!
//! This crate provides error handling, configuration, OAuth request signing
//! and the HTTP plumbing shared by MAAS client crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and HTTP status code mapping
//! - [`id`] - Strongly-typed identifiers for MAAS resources
//! - [`config`] - Endpoint and credential configuration
//! - [`auth`] - API key parsing and OAuth header generation
//! - [`client`] - HTTP client configuration and the signed service client
//! - [`query`] - Query and form parameter builder

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod id;
pub mod query;

// Re-export commonly used types
pub use error::{Error, Result};
