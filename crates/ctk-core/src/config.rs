//! Configuration management for the conformance toolkit.
//!
//! Configuration is layered: defaults, then a TOML file, then `CTK_*`
//! environment variables. Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// File name searched for in the working directory and `~/.ctk/`.
pub const CONFIG_FILE_NAME: &str = "ctk.toml";

/// Default location of the exported report, relative to the working directory.
pub const DEFAULT_REPORT_PATH: &str = "report.txt";

/// Relay state the toolkit sends on requests when a test supplies one.
///
/// The `+` makes it possible to tell whether the IdP URL-encoded the value
/// on the way back.
pub const DEFAULT_RELAY_STATE: &str = "relay+State";

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Accept HTTP error statuses (400-599) without decoding or checking them.
    pub lenient: bool,
    /// Report output configuration.
    pub report: ReportConfig,
    /// Identity provider under test.
    pub idp: IdpConfig,
    /// Service provider the toolkit impersonates.
    pub sp: SpConfig,
}

/// Report output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Path the report file is written to. Overwritten on every run.
    pub path: PathBuf,
    /// Omit violation messages from the report, listing statuses only.
    pub quiet: bool,
}

/// Identity provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdpConfig {
    /// Path to the IdP's SAML metadata document.
    pub metadata: Option<PathBuf>,
    /// Name of the registered responder that extracts messages from IdP pages.
    pub responder: String,
}

/// Service provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpConfig {
    /// Entity ID used as the expected audience.
    pub entity_id: Option<String>,
    /// Assertion consumer service URL requests are issued for.
    pub acs_url: Option<String>,
    /// Relay state value sent with requests.
    pub relay_state: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            lenient: false,
            report: ReportConfig::default(),
            idp: IdpConfig::default(),
            sp: SpConfig::default(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_REPORT_PATH),
            quiet: false,
        }
    }
}

impl Default for IdpConfig {
    fn default() -> Self {
        Self {
            metadata: None,
            responder: "generic".to_string(),
        }
    }
}

impl Default for SpConfig {
    fn default() -> Self {
        Self {
            entity_id: None,
            acs_url: None,
            relay_state: DEFAULT_RELAY_STATE.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration.
    ///
    /// An explicit path must exist. Without one, `./ctk.toml` and then
    /// `~/.ctk/ctk.toml` are tried, falling back to defaults. Environment
    /// overrides are applied last.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Config`] if a file cannot be parsed, or [`Error::Io`]
    /// if an explicit file cannot be read.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::discover() {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parses configuration from a TOML file.
    ///
    /// ## Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading configuration");
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Parses configuration from TOML text.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Config`] on invalid TOML or unknown value types.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("failed to parse config: {e}")))
    }

    /// Renders the configuration as TOML.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))
    }

    /// Applies `CTK_*` overrides using the given variable lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CTK_REPORT_PATH") {
            self.report.path = PathBuf::from(path);
        }
        if let Some(quiet) = lookup("CTK_QUIET") {
            self.report.quiet = parse_flag(&quiet);
        }
        if let Some(metadata) = lookup("CTK_IDP_METADATA") {
            self.idp.metadata = Some(PathBuf::from(metadata));
        }
        if let Some(responder) = lookup("CTK_IDP_RESPONDER") {
            self.idp.responder = responder;
        }
        if let Some(entity_id) = lookup("CTK_SP_ENTITY_ID") {
            self.sp.entity_id = Some(entity_id);
        }
        if let Some(acs_url) = lookup("CTK_ACS_URL") {
            self.sp.acs_url = Some(acs_url);
        }
        if let Some(relay_state) = lookup("CTK_RELAY_STATE") {
            self.sp.relay_state = relay_state;
        }
        if let Some(level) = lookup("CTK_LOG") {
            self.log_level = level;
        }
        if let Some(lenient) = lookup("CTK_LENIENT") {
            self.lenient = parse_flag(&lenient);
        }
    }

    /// Path of the IdP metadata file.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Metadata`] when no metadata path is configured.
    pub fn metadata_path(&self) -> Result<&Path> {
        self.idp
            .metadata
            .as_deref()
            .ok_or_else(|| Error::Metadata("no IdP metadata path configured".to_string()))
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        let home = dirs_next::home_dir()?.join(".ctk").join(CONFIG_FILE_NAME);
        home.exists().then_some(home)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
