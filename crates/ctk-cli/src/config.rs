//! CLI configuration.
//!
//! The toolkit configuration lives in [`ctk_core::Config`]; this module
//! layers the global command-line flags on top of it.

use ctk_core::Config;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

/// Loads the configuration named by `--config` (or discovered) and applies
/// the global flags.
///
/// # Errors
///
/// Returns an environment error if the configuration cannot be read or parsed.
pub fn load(cli: &Cli) -> crate::CliResult<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    apply_flags(&mut config, cli);
    Ok(config)
}

/// Applies the global flags. Flags only ever switch settings on.
pub fn apply_flags(config: &mut Config, cli: &Cli) {
    if cli.debug {
        config.log_level = "debug".to_string();
    }
    if cli.quiet {
        config.report.quiet = true;
    }
    if cli.lenient {
        config.lenient = true;
    }
}
