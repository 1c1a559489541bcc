//! # ctk-cli
//!
//! Command-line runner for the SAML IdP conformance toolkit.
//!
//! This crate provides:
//! - `ctk check`: replays captured IdP exchanges through the verification
//!   engine and writes the conformance report
//! - `ctk codes`: lists every SAML clause the toolkit checks
//! - `ctk config show`: prints the effective configuration

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod capture;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use error::{CliError, CliResult};
