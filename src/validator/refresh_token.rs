use async_trait::async_trait;
use tracing::warn;

use super::{accept, reject, TokenRequestValidator, ValidatorServices};
use crate::oauth_core::context::{TokenRequestContext, REFRESH_TOKEN};
use crate::oauth_core::grant_type::GrantType;
use crate::oauth_core::types::{
    AuthenticatedProfile, GateError, RegisteredService, Rejection, Verdict,
};

/// Validates `refresh_token` requests: the token must exist, be live, not
/// revoked, and belong to the requesting client.
#[derive(Clone)]
pub struct RefreshTokenValidator {
    services: ValidatorServices,
}

impl RefreshTokenValidator {
    pub fn new(services: ValidatorServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl TokenRequestValidator for RefreshTokenValidator {
    fn grant_type(&self) -> GrantType {
        GrantType::RefreshToken
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
        let Some(token) = ctx.parameter(REFRESH_TOKEN) else {
            return reject(Rejection::missing(REFRESH_TOKEN));
        };
        let Some(ticket) = self.services.tickets.get_refresh_token(token).await? else {
            warn!(client_id = %service.client_id, "Provided refresh token is not found");
            return reject(Rejection::invalid_grant("Refresh token is invalid"));
        };
        if ticket.revoked {
            warn!(client_id = %service.client_id, "Provided refresh token has been revoked");
            return reject(Rejection::invalid_grant("Refresh token has been revoked"));
        }
        if ticket.is_expired() {
            warn!(
                client_id = %service.client_id,
                expires_at = %ticket.expires_at,
                "Provided refresh token has expired"
            );
            return reject(Rejection::invalid_grant("Refresh token has expired"));
        }
        if ticket.client_id != service.client_id {
            warn!(
                client_id = %service.client_id,
                token_client_id = %ticket.client_id,
                "Refresh token belongs to a different client"
            );
            return reject(Rejection::invalid_grant("Refresh token was issued to another client"));
        }
        accept(self.grant_type(), service)
    }
}
