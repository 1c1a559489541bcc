//! Command implementations.

pub mod check;
pub mod codes;
pub mod config;

pub use check::run_check;
pub use codes::run_codes;
pub use config::run_config;
