//! Capture files.
//!
//! A capture is one recorded IdP exchange plus the request facts needed to
//! judge it:
//!
//! ```json
//! {
//!   "name": "sso-redirect-basic",
//!   "binding": "redirect",
//!   "status": 302,
//!   "location": "https://sp.example.com/acs?SAMLResponse=...&RelayState=...",
//!   "request_id": "_a1b2c3",
//!   "relay_state_given": true
//! }
//! ```

use std::path::Path;

use ctk_core::Config;
use ctk_protocol_saml::Binding;
use ctk_spi::HttpCapture;
use ctk_verification::RequestContext;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Binding a capture was recorded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureBinding {
    /// HTTP Redirect binding.
    Redirect,
    /// HTTP POST binding.
    Post,
}

impl From<CaptureBinding> for Binding {
    fn from(binding: CaptureBinding) -> Self {
        match binding {
            CaptureBinding::Redirect => Self::Redirect,
            CaptureBinding::Post => Self::Post,
        }
    }
}

/// A recorded test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    /// Test name; defaults to the file stem.
    #[serde(default)]
    pub name: Option<String>,
    /// Binding the response arrived on.
    pub binding: CaptureBinding,
    /// The HTTP response.
    #[serde(flatten)]
    pub exchange: HttpCapture,
    /// ID of the request the IdP answered.
    pub request_id: String,
    /// ACS URL the request named; defaults to `sp.acs_url`.
    #[serde(default)]
    pub acs_url: Option<String>,
    /// Whether the request carried a RelayState.
    #[serde(default)]
    pub relay_state_given: bool,
}

impl Capture {
    /// Reads a capture file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or
    /// [`CliError::Capture`] if it is not capture JSON.
    pub fn from_file(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut capture: Self = serde_json::from_str(&content).map_err(|source| CliError::Capture {
            path: path.to_path_buf(),
            source,
        })?;
        if capture.name.is_none() {
            capture.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        Ok(capture)
    }

    /// Test name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// Request facts for the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ctk_core::Error::Config`] if neither the capture nor the
    /// configuration names an ACS URL.
    pub fn request_context(&self, config: &Config) -> CliResult<RequestContext> {
        let mut ctx = match &self.acs_url {
            Some(acs_url) => RequestContext::new(self.request_id.clone(), acs_url.clone())
                .with_expected_relay_state(config.sp.relay_state.clone()),
            None => RequestContext::from_config(config, self.request_id.clone())?,
        };
        if let Some(entity_id) = &config.sp.entity_id {
            ctx = ctx.with_sp_entity_id(entity_id.clone());
        }
        if self.relay_state_given {
            ctx = ctx.with_relay_state();
        }
        Ok(ctx)
    }
}
