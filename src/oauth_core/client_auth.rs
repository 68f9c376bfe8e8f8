//! Client authentication for the token endpoint (RFC 6749 §2.3.1).
//!
//! Credentials come from `Authorization: Basic` or, failing that, from the
//! `client_id` / `client_secret` form parameters. The auth-scheme comparison
//! is case-insensitive per RFC 7235 §2.1.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use super::context::{TokenRequestContext, CLIENT_ID, CLIENT_SECRET};
use super::crypto::secrets_equal;
use super::oauth_provider::{ProfileLookup, ProfileResolver, ServiceResolver};
use super::types::{AuthenticatedProfile, GateError};

/// Profile attribute holding the authenticated client id.
pub const CLIENT_ID_ATTRIBUTE: &str = "client_id";

/// Authenticates the calling client against the service registry.
#[derive(Clone)]
pub struct ClientSecretProfileResolver {
    services: Arc<dyn ServiceResolver>,
}

enum Credentials {
    Malformed,
    Absent,
    Present { client_id: String, secret: Option<String> },
}

impl ClientSecretProfileResolver {
    pub fn new(services: Arc<dyn ServiceResolver>) -> Self {
        Self { services }
    }

    fn extract(ctx: &TokenRequestContext) -> Credentials {
        if let Some(value) = ctx.header("authorization") {
            if value.get(..6).is_some_and(|scheme| scheme.eq_ignore_ascii_case("basic ")) {
                return Self::decode_basic(value[6..].trim());
            }
        }
        match ctx.parameter(CLIENT_ID) {
            Some(id) => Credentials::Present {
                client_id: id.to_string(),
                secret: ctx.parameter(CLIENT_SECRET).map(str::to_string),
            },
            None => Credentials::Absent,
        }
    }

    fn decode_basic(encoded: &str) -> Credentials {
        let Ok(bytes) = STANDARD.decode(encoded) else {
            return Credentials::Malformed;
        };
        let Ok(text) = String::from_utf8(bytes) else {
            return Credentials::Malformed;
        };
        let Some((id, secret)) = text.split_once(':') else {
            return Credentials::Malformed;
        };
        // Both parts are form-urlencoded inside the Basic credential.
        let (Some(client_id), Some(secret)) = (form_decode(id), form_decode(secret)) else {
            return Credentials::Malformed;
        };
        if client_id.is_empty() {
            return Credentials::Malformed;
        }
        Credentials::Present { client_id, secret: Some(secret).filter(|s| !s.is_empty()) }
    }
}

fn form_decode(part: &str) -> Option<String> {
    urlencoding::decode(&part.replace('+', " ")).ok().map(|decoded| decoded.into_owned())
}

#[async_trait]
impl ProfileResolver for ClientSecretProfileResolver {
    async fn current_profile(&self, ctx: &TokenRequestContext) -> Result<ProfileLookup, GateError> {
        let (client_id, secret) = match Self::extract(ctx) {
            Credentials::Malformed => {
                warn!(request_id = %ctx.request_id(), "Malformed Basic authorization header");
                return Ok(ProfileLookup::Unavailable);
            }
            Credentials::Absent => return Ok(ProfileLookup::Empty),
            Credentials::Present { client_id, secret } => (client_id, secret),
        };

        let Some(service) = self.services.find_service_by(&client_id).await? else {
            warn!(%client_id, "Client authentication failed: unknown client");
            return Ok(ProfileLookup::Empty);
        };

        let authenticated = match (&service.client_secret, secret.as_deref()) {
            (Some(expected), Some(presented)) if !expected.is_empty() => {
                secrets_equal(presented, expected)
            }
            (Some(expected), None) if !expected.is_empty() => false,
            // Public client: identified by client_id alone, a presented secret is a mismatch.
            _ => secret.is_none(),
        };
        if !authenticated {
            warn!(%client_id, "Client authentication failed: bad credentials");
            return Ok(ProfileLookup::Empty);
        }

        debug!(%client_id, confidential = service.is_confidential(), "Client authenticated");
        let profile = AuthenticatedProfile::new(client_id.clone())
            .with_attribute(CLIENT_ID_ATTRIBUTE, client_id);
        Ok(ProfileLookup::Authenticated(profile))
    }
}
