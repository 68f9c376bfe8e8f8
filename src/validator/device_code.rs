use async_trait::async_trait;
use tracing::{debug, warn};

use super::{accept, reject, TokenRequestValidator, ValidatorServices};
use crate::oauth_core::context::{TokenRequestContext, DEVICE_CODE};
use crate::oauth_core::grant_type::GrantType;
use crate::oauth_core::types::{
    AuthenticatedProfile, GateError, RegisteredService, Rejection, Verdict,
};

/// Validates `device_code` polling requests (RFC 8628 §3.4).
#[derive(Clone)]
pub struct DeviceCodeValidator {
    services: ValidatorServices,
}

impl DeviceCodeValidator {
    pub fn new(services: ValidatorServices) -> Self {
        Self { services }
    }
}

#[async_trait]
impl TokenRequestValidator for DeviceCodeValidator {
    fn grant_type(&self) -> GrantType {
        GrantType::DeviceCode
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
        let Some(device_code) = ctx.parameter(DEVICE_CODE) else {
            return reject(Rejection::missing(DEVICE_CODE));
        };
        let Some(ticket) = self.services.tickets.get_device_code(device_code).await? else {
            warn!(client_id = %service.client_id, "Provided device code is not found");
            return reject(Rejection::invalid_grant("Device code is invalid"));
        };
        if ticket.client_id != service.client_id {
            warn!(
                client_id = %service.client_id,
                device_client_id = %ticket.client_id,
                "Device code belongs to a different client"
            );
            return reject(Rejection::invalid_grant("Device code was issued to another client"));
        }
        if ticket.is_expired() {
            warn!(
                client_id = %service.client_id,
                expires_at = %ticket.expires_at,
                "Device code has expired"
            );
            return reject(Rejection::invalid_grant("Device code has expired"));
        }
        if !ticket.approved {
            debug!(
                client_id = %service.client_id,
                user_code = %ticket.user_code,
                "Device code is awaiting user approval"
            );
            return reject(Rejection::AuthorizationPending);
        }
        accept(self.grant_type(), service)
    }
}
