//! What the test sent to the IdP.

use ctk_core::config::DEFAULT_RELAY_STATE;
use ctk_core::{Config, Error, Result};
use uuid::Uuid;

/// Request-side facts the response is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// ID of the request the IdP is answering.
    pub request_id: String,
    /// URL the service provider receives responses at.
    pub acs_url: String,
    /// Whether a RelayState was sent with the request.
    pub relay_state_given: bool,
    /// RelayState value that was sent.
    pub expected_relay_state: String,
    /// Entity ID of the service provider, used for audience checks.
    pub sp_entity_id: Option<String>,
}

impl RequestContext {
    /// Creates a context for a request sent without RelayState.
    #[must_use]
    pub fn new(request_id: impl Into<String>, acs_url: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            acs_url: acs_url.into(),
            relay_state_given: false,
            expected_relay_state: DEFAULT_RELAY_STATE.to_string(),
            sp_entity_id: None,
        }
    }

    /// Builds a context from the `[sp]` configuration table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `sp.acs_url` is not set.
    pub fn from_config(config: &Config, request_id: impl Into<String>) -> Result<Self> {
        let acs_url = config
            .sp
            .acs_url
            .clone()
            .ok_or_else(|| Error::Config("sp.acs_url is not set".to_string()))?;
        Ok(Self {
            request_id: request_id.into(),
            acs_url,
            relay_state_given: false,
            expected_relay_state: config.sp.relay_state.clone(),
            sp_entity_id: config.sp.entity_id.clone(),
        })
    }

    /// Marks the request as carrying the expected RelayState.
    #[must_use]
    pub fn with_relay_state(mut self) -> Self {
        self.relay_state_given = true;
        self
    }

    /// Overrides the RelayState value that was sent.
    #[must_use]
    pub fn with_expected_relay_state(mut self, relay_state: impl Into<String>) -> Self {
        self.expected_relay_state = relay_state.into();
        self
    }

    /// Sets the service provider entity ID.
    #[must_use]
    pub fn with_sp_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.sp_entity_id = Some(entity_id.into());
        self
    }

    /// Generates a fresh request ID.
    ///
    /// xs:ID values may not start with a digit, hence the leading underscore.
    #[must_use]
    pub fn generate_request_id() -> String {
        format!("_{}", Uuid::new_v4().simple())
    }
}
