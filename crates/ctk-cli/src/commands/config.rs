//! Configuration commands.

use ctk_core::Config;

use crate::cli::ConfigCommand;
use crate::config::OutputFormat;
use crate::output::output_single;

/// Runs a config command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized.
pub fn run_config(cmd: ConfigCommand, config: &Config, format: OutputFormat) -> crate::CliResult<()> {
    match cmd {
        ConfigCommand::Show => show_config(config, format),
    }
}

/// Shows the effective configuration.
fn show_config(config: &Config, format: OutputFormat) -> crate::CliResult<()> {
    let text = config.to_toml_string()?;
    output_single(config, &text, format)
}
