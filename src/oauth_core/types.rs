//! OAuth2 gate primitives: registered services, profiles, tickets, verdicts and errors.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::grant_type::GrantType;

/// A registered OAuth client application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredService {
    /// Client identifier presented at the token endpoint.
    pub client_id: String,
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    /// Pattern every accepted redirect URI must fully match.
    #[serde(default)]
    pub service_id: String,
    /// Client secret. `None` marks a public client.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Grant types this client may use. `None` or empty allows every grant type.
    #[serde(default)]
    pub supported_grant_types: Option<Vec<String>>,
}

impl RegisteredService {
    /// Creates a public client with no grant type restrictions.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            name: String::new(),
            service_id: String::new(),
            client_secret: None,
            supported_grant_types: None,
        }
    }

    /// Sets the client secret, turning this into a confidential client.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the redirect URI pattern.
    pub fn service_id(mut self, pattern: impl Into<String>) -> Self {
        self.service_id = pattern.into();
        self
    }

    /// Restricts the client to the given grant types.
    pub fn grant_types<I, S>(mut self, grant_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_grant_types = Some(grant_types.into_iter().map(Into::into).collect());
        self
    }

    /// Whether this client authenticates with a secret.
    pub fn is_confidential(&self) -> bool {
        self.client_secret.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Whether the redirect URI is accepted by this service's pattern.
    pub fn matches_redirect_uri(&self, redirect_uri: &str) -> bool {
        if self.service_id.is_empty() {
            return false;
        }
        match Regex::new(&format!("^(?:{})$", self.service_id)) {
            Ok(re) => re.is_match(redirect_uri),
            Err(err) => {
                warn!(
                    client_id = %self.client_id,
                    pattern = %self.service_id,
                    %err,
                    "Invalid service id pattern"
                );
                false
            }
        }
    }
}

/// The authenticated caller of a token request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedProfile {
    /// Subject of the authentication, usually the client id.
    pub id: String,
    /// Extra attributes collected during authentication.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl AuthenticatedProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), attributes: HashMap::new() }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// An issued authorization code awaiting exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeTicket {
    pub code: String,
    pub client_id: String,
    /// Redirect URI the code was issued for.
    pub redirect_uri: String,
    /// PKCE challenge recorded at the authorization endpoint.
    #[serde(default)]
    pub code_challenge: Option<String>,
    /// `S256` or `plain`; absent means `plain`.
    #[serde(default)]
    pub code_challenge_method: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// An issued refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTicket {
    pub token: String,
    pub client_id: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub revoked: bool,
}

/// A pending device authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTicket {
    pub device_code: String,
    pub user_code: String,
    pub client_id: String,
    /// Set once the user has approved the user code.
    #[serde(default)]
    pub approved: bool,
    pub expires_at: DateTime<Utc>,
}

impl CodeTicket {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

impl RefreshTicket {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

impl DeviceTicket {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Why a token request was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// The `grant_type` value names no known grant type.
    UnsupportedGrantType,
    /// No authenticated profile could be resolved for the request.
    Unauthenticated,
    /// The client's grant type allow-list excludes the requested grant type.
    UnauthorizedGrantType,
    /// The client identifier does not resolve to a registered service.
    UnknownService,
    /// The grant type is known but no validator is registered for it.
    NoValidator,
    /// A parameter the grant requires is missing.
    InvalidRequest { parameter: String },
    /// The presented code, token or device code is not acceptable.
    InvalidGrant { detail: String },
    /// The device code has not been approved by the user yet.
    AuthorizationPending,
    /// The access strategy refused the client.
    AccessDenied,
}

impl Rejection {
    pub(crate) fn missing(parameter: &str) -> Self {
        Rejection::InvalidRequest { parameter: parameter.to_string() }
    }

    pub(crate) fn invalid_grant(detail: impl Into<String>) -> Self {
        Rejection::InvalidGrant { detail: detail.into() }
    }

    /// RFC 6749 §5.2 error code, HTTP status and description for this rejection.
    pub fn error_parts(&self) -> (u16, &'static str, String) {
        match self {
            Rejection::UnsupportedGrantType => {
                (400, "unsupported_grant_type", "Grant type is not supported".into())
            }
            Rejection::Unauthenticated => {
                (401, "invalid_client", "Client authentication failed".into())
            }
            Rejection::UnauthorizedGrantType => (
                400,
                "unauthorized_client",
                "Client is not authorized for this grant type".into(),
            ),
            Rejection::UnknownService => (401, "invalid_client", "Client is not registered".into()),
            Rejection::NoValidator => {
                (400, "unsupported_grant_type", "Grant type is not enabled on this server".into())
            }
            Rejection::InvalidRequest { parameter } => {
                (400, "invalid_request", format!("Missing '{}'", parameter))
            }
            Rejection::InvalidGrant { detail } => (400, "invalid_grant", detail.clone()),
            Rejection::AuthorizationPending => (
                400,
                "authorization_pending",
                "The user has not yet approved the device code".into(),
            ),
            Rejection::AccessDenied => (403, "unauthorized_client", "Client not authorized".into()),
        }
    }

    /// OAuth error code, e.g. `invalid_grant`.
    pub fn error_code(&self) -> &'static str {
        self.error_parts().1
    }

    /// HTTP status a token endpoint should answer with.
    pub fn status(&self) -> u16 {
        self.error_parts().0
    }

    /// JSON error body for the token endpoint.
    pub fn to_json(&self) -> Value {
        let (status, code, description) = self.error_parts();
        debug!(
            rejection = ?self,
            error_code = code,
            http_status = status,
            "Token request rejected"
        );
        json!({ "error": code, "error_description": description })
    }
}

/// Result of running a token request through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The request may proceed to token issuance.
    Accepted { grant_type: GrantType, client_id: String },
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted { .. })
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Verdict::Rejected(r) => Some(r),
            Verdict::Accepted { .. } => None,
        }
    }
}

impl From<Rejection> for Verdict {
    fn from(rejection: Rejection) -> Self {
        Verdict::Rejected(rejection)
    }
}

/// Failures of the gate's collaborators. Expected validation failures are
/// [`Verdict::Rejected`], never this.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("service registry error: {0}")]
    Registry(String),
    #[error("ticket registry error: {0}")]
    TicketRegistry(String),
    #[error("authentication backend error: {0}")]
    Authentication(String),
    #[error("access strategy error: {0}")]
    AccessStrategy(String),
    #[error("configuration error: {0}")]
    Config(String),
}
