//! # ctk
//!
//! Command-line runner for the SAML IdP conformance toolkit.

#![forbid(unsafe_code)]
#![deny(warnings)]

use clap::Parser;
use ctk_cli::{
    cli::{Cli, Command},
    commands::{run_check, run_codes, run_config},
    config,
    output::error,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            error(&format!("Failed to load configuration: {e}"));
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Command::Check(args) => run_check(args, &config, cli.output),
        Command::Codes(args) => run_codes(args, cli.output),
        Command::Config(cmd) => run_config(cmd, &config, cli.output),
    };

    if let Err(e) = result {
        error(&e.to_string());
        std::process::exit(1);
    }
}
