//! Gate configuration.

use serde::{Deserialize, Serialize};

use super::context::GRANT_TYPE;
use super::types::GateError;

/// What to do with a service that lists no grant types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnrestrictedServicePolicy {
    /// Treat the service as authorized for every grant type. Kept for
    /// compatibility with service definitions that predate allow-lists.
    #[default]
    AllowAll,
    /// Refuse every grant type until the service lists its grant types.
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Request parameter carrying the grant type.
    pub grant_type_parameter: String,
    pub unrestricted_services: UnrestrictedServicePolicy,
    /// Reject authorization codes issued to public clients without a PKCE challenge.
    pub require_pkce_for_public_clients: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            grant_type_parameter: GRANT_TYPE.to_string(),
            unrestricted_services: UnrestrictedServicePolicy::AllowAll,
            require_pkce_for_public_clients: false,
        }
    }
}

impl GateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON configuration document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, GateError> {
        let config: GateConfig = serde_json::from_str(json)
            .map_err(|e| GateError::Config(format!("invalid gate config: {}", e)))?;
        if config.grant_type_parameter.is_empty() {
            return Err(GateError::Config("grant_type_parameter must not be empty".into()));
        }
        Ok(config)
    }

    /// Overrides the grant type parameter name.
    pub fn grant_type_parameter<S: Into<String>>(mut self, name: S) -> Self {
        self.grant_type_parameter = name.into();
        self
    }

    /// Sets the policy for services without a grant type allow-list.
    pub fn unrestricted_services(mut self, policy: UnrestrictedServicePolicy) -> Self {
        self.unrestricted_services = policy;
        self
    }

    pub fn require_pkce_for_public_clients(mut self, required: bool) -> Self {
        self.require_pkce_for_public_clients = required;
        self
    }
}
