//! # ctk-core
//!
//! Configuration and environment error handling for the SAML conformance toolkit.
//!
//! This crate provides foundational types used across all other `ctk` crates.
//! Environment errors ([`Error`]) describe a broken test setup: unreadable
//! configuration, missing IdP metadata, an encoding the toolkit cannot decode.
//! They abort the current test and are never recorded as compliance violations.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{Error, Result};
