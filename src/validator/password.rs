use async_trait::async_trait;
use tracing::warn;

use super::{accept, TokenRequestValidator, ValidatorServices};
use crate::oauth_core::client_auth::CLIENT_ID_ATTRIBUTE;
use crate::oauth_core::context::{TokenRequestContext, CLIENT_ID};
use crate::oauth_core::grant_type::GrantType;
use crate::oauth_core::types::{
    AuthenticatedProfile, GateError, RegisteredService, Rejection, Verdict,
};

/// Validates `password` requests.
///
/// The client is the one the profile authenticated as (its `client_id`
/// attribute). A `client_id` parameter naming another client is refused.
/// Profiles without the attribute take the client from the parameter.
#[derive(Clone)]
pub struct PasswordValidator {
    services: ValidatorServices,
}

impl PasswordValidator {
    pub fn new(services: ValidatorServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl TokenRequestValidator for PasswordValidator {
    fn grant_type(&self) -> GrantType {
        GrantType::Password
    }

    fn services(&self) -> &ValidatorServices {
        &self.services
    }

    fn client_id<'a>(
        &self,
        profile: &'a AuthenticatedProfile,
        ctx: &'a TokenRequestContext,
    ) -> Result<&'a str, Rejection> {
        match (profile.attribute(CLIENT_ID_ATTRIBUTE), ctx.parameter(CLIENT_ID)) {
            (Some(authenticated), Some(requested)) if authenticated != requested => {
                warn!(
                    client_id = %authenticated,
                    requested = %requested,
                    "Requested client does not match the authenticated client"
                );
                Err(Rejection::Unauthenticated)
            }
            (Some(authenticated), _) => Ok(authenticated),
            (None, Some(requested)) => Ok(requested),
            (None, None) => Err(Rejection::missing(CLIENT_ID)),
        }
    }

    async fn validate_grant(
        &self,
        _grant_type: &str,
        _profile: &AuthenticatedProfile,
        service: &RegisteredService,
        _ctx: &TokenRequestContext,
    ) -> Result<Verdict, GateError> {
        accept(self.grant_type(), service)
    }
}
