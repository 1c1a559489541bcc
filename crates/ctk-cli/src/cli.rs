//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::OutputFormat;

/// ctk - SAML 2.0 IdP conformance toolkit.
#[derive(Debug, Parser)]
#[command(name = "ctk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: ./ctk.toml, then ~/.ctk/ctk.toml).
    #[arg(short, long, global = true, env = "CTK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Omit violation messages from the report file.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Do not decode or check responses with an HTTP error status.
    #[arg(short, long, global = true)]
    pub lenient: bool,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay captured IdP exchanges and check them.
    Check(CheckArgs),

    /// List the SAML clauses the toolkit checks.
    Codes(CodesArgs),

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for `ctk check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Capture files, one test each.
    #[arg(required = true)]
    pub captures: Vec<PathBuf>,

    /// Report file (overrides config).
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for `ctk codes`.
#[derive(Debug, Args)]
pub struct CodesArgs {
    /// Only list codes of this document (General, Schema, Core, Bindings, Profiles).
    #[arg(long)]
    pub document: Option<String>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn check_takes_several_captures() {
        let cli = Cli::try_parse_from(["ctk", "-q", "check", "a.json", "b.json", "--lenient"])
            .unwrap();
        assert!(cli.quiet);
        assert!(cli.lenient);
        match cli.command {
            Command::Check(args) => {
                assert_eq!(args.captures, [PathBuf::from("a.json"), PathBuf::from("b.json")]);
                assert!(args.report.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn check_needs_a_capture() {
        assert!(Cli::try_parse_from(["ctk", "check"]).is_err());
    }

    #[test]
    fn codes_accepts_json_output() {
        let cli = Cli::try_parse_from(["ctk", "codes", "--output", "json", "--document", "Core"])
            .unwrap();
        assert!(matches!(cli.output, OutputFormat::Json));
        assert!(matches!(cli.command, Command::Codes(CodesArgs { document: Some(ref d) }) if d == "Core"));
    }
}
