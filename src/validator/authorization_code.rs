use async_trait::async_trait;
use tracing::warn;

use super::{accept, reject, TokenRequestValidator, ValidatorServices};
use crate::oauth_core::context::{TokenRequestContext, CODE, CODE_VERIFIER, REDIRECT_URI};
use crate::oauth_core::crypto::verify_pkce;
use crate::oauth_core::grant_type::GrantType;
use crate::oauth_core::types::{
    AuthenticatedProfile, GateError, RegisteredService, Rejection, Verdict,
};

/// Validates `authorization_code` exchanges: the code must be live, issued to
/// this client for this redirect URI, and satisfy its PKCE challenge.
#[derive(Clone)]
pub struct AuthorizationCodeValidator {
    services: ValidatorServices,
}

impl AuthorizationCodeValidator {
    pub fn new(services: ValidatorServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl TokenRequestValidator for AuthorizationCodeValidator {
    fn grant_type(&self) -> GrantType {
        GrantType::AuthorizationCode
    }

    fn services(&self) -> &ValidatorServices {
        &self.services
    }

    async fn validate_grant(
        &self,
        _grant_type: &str,
        _profile: &AuthenticatedProfile,
        service: &RegisteredService,
        ctx: &TokenRequestContext,
    ) -> Result<Verdict, GateError> {
        let Some(code) = ctx.parameter(CODE) else {
            return reject(Rejection::missing(CODE));
        };
        let Some(redirect_uri) = ctx.parameter(REDIRECT_URI) else {
            return reject(Rejection::missing(REDIRECT_URI));
        };

        let Some(ticket) = self.services.tickets.get_code(code).await? else {
            warn!(client_id = %service.client_id, "Provided authorization code is not found");
            return reject(Rejection::invalid_grant("Authorization code is invalid"));
        };
        if ticket.is_expired() {
            warn!(
                client_id = %service.client_id,
                expires_at = %ticket.expires_at,
                "Authorization code has expired"
            );
            return reject(Rejection::invalid_grant("Authorization code has expired"));
        }
        if ticket.client_id != service.client_id {
            warn!(
                client_id = %service.client_id,
                code_client_id = %ticket.client_id,
                "Authorization code was issued to a different client"
            );
            let detail = "Authorization code was issued to another client";
            return reject(Rejection::invalid_grant(detail));
        }
        if ticket.redirect_uri != redirect_uri || !service.matches_redirect_uri(redirect_uri) {
            warn!(
                client_id = %service.client_id,
                %redirect_uri,
                "Redirect URI does not match the authorization request"
            );
            return reject(Rejection::invalid_grant("Redirect URI does not match"));
        }

        match ticket.code_challenge.as_deref() {
            Some(challenge) => {
                let Some(verifier) = ctx.parameter(CODE_VERIFIER) else {
                    return reject(Rejection::missing(CODE_VERIFIER));
                };
                if !verify_pkce(verifier, challenge, ticket.code_challenge_method.as_deref()) {
                    warn!(
                        client_id = %service.client_id,
                        "PKCE code verifier does not match the challenge"
                    );
                    return reject(Rejection::invalid_grant("PKCE verification failed"));
                }
            }
            None if self.services.config.require_pkce_for_public_clients
                && !service.is_confidential() =>
            {
                warn!(
                    client_id = %service.client_id,
                    "Public client presented a code issued without PKCE"
                );
                return reject(Rejection::invalid_grant("PKCE is required for public clients"));
            }
            None => {}
        }

        accept(self.grant_type(), service)
    }
}
