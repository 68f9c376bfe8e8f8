use async_trait::async_trait;
use tracing::warn;

use super::{accept, reject, TokenRequestValidator, ValidatorServices};
use crate::oauth_core::context::TokenRequestContext;
use crate::oauth_core::grant_type::GrantType;
use crate::oauth_core::types::{
    AuthenticatedProfile, GateError, RegisteredService, Rejection, Verdict,
};

/// Validates `client_credentials` requests. Only confidential clients may use
/// this grant (RFC 6749 §4.4).
#[derive(Clone)]
pub struct ClientCredentialsValidator {
    services: ValidatorServices,
}

impl ClientCredentialsValidator {
    pub fn new(services: ValidatorServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl TokenRequestValidator for ClientCredentialsValidator {
    fn grant_type(&self) -> GrantType {
        GrantType::ClientCredentials
    }

    fn services(&self) -> &ValidatorServices {
        &self.services
    }

    async fn validate_grant(
        &self,
        _grant_type: &str,
        _profile: &AuthenticatedProfile,
        service: &RegisteredService,
        _ctx: &TokenRequestContext,
    ) -> Result<Verdict, GateError> {
        if !service.is_confidential() {
            warn!(
                client_id = %service.client_id,
                "Public client cannot use the client_credentials grant"
            );
            return reject(Rejection::UnauthorizedGrantType);
        }
        accept(self.grant_type(), service)
    }
}
