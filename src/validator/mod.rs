//! Token request validators.
//!
//! Every validator runs the same pipeline ([`validate_request`]): the grant
//! type must be known, the caller must be authenticated, the client must be
//! registered and admitted by the access strategy, and the grant type must be
//! on the client's allow-list. Only then does the validator's own
//! [`TokenRequestValidator::validate_grant`] run.

pub mod authorization_code;
pub mod chain;
pub mod client_credentials;
pub mod device_code;
pub mod password;
pub mod refresh_token;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, instrument, warn};

use crate::oauth_core::config::{GateConfig, UnrestrictedServicePolicy};
use crate::oauth_core::context::{TokenRequestContext, REDIRECT_URI};
use crate::oauth_core::grant_type::{is_any_grant_type, is_grant_type, GrantType};
use crate::oauth_core::memory::{InMemoryTicketRegistry, PermitAllAccessStrategy};
use crate::oauth_core::oauth_provider::{
    AccessStrategyEnforcer, ProfileLookup, ProfileResolver, ServiceResolver, TicketRegistry,
};
use crate::oauth_core::types::{
    AuthenticatedProfile, GateError, RegisteredService, Rejection, Verdict,
};

pub use authorization_code::AuthorizationCodeValidator;
pub use chain::{ValidatorChain, ValidatorChainBuilder, LOWEST_PRECEDENCE};
pub use client_credentials::ClientCredentialsValidator;
pub use device_code::DeviceCodeValidator;
pub use password::PasswordValidator;
pub use refresh_token::RefreshTokenValidator;

/// Collaborators shared by all validators.
#[derive(Clone)]
pub struct ValidatorServices {
    pub services: Arc<dyn ServiceResolver>,
    pub profiles: Arc<dyn ProfileResolver>,
    pub access_strategy: Arc<dyn AccessStrategyEnforcer>,
    pub tickets: Arc<dyn TicketRegistry>,
    pub config: Arc<GateConfig>,
}

impl ValidatorServices {
    /// Creates the shared services with a permissive access strategy, an
    /// empty ticket registry and default configuration.
    pub fn new(services: Arc<dyn ServiceResolver>, profiles: Arc<dyn ProfileResolver>) -> Self {
        ValidatorServices {
            services,
            profiles,
            access_strategy: Arc::new(PermitAllAccessStrategy),
            tickets: Arc::new(InMemoryTicketRegistry::new()),
            config: Arc::new(GateConfig::default()),
        }
    }

    /// Sets a custom access strategy.
    pub fn access_strategy(mut self, enforcer: Arc<dyn AccessStrategyEnforcer>) -> Self {
        self.access_strategy = enforcer;
        self
    }

    /// Sets a custom ticket registry.
    pub fn tickets(mut self, tickets: Arc<dyn TicketRegistry>) -> Self {
        self.tickets = tickets;
        self
    }

    pub fn config(mut self, config: GateConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Whether `service` may use `grant_type`.
    pub fn is_grant_type_supported_by(
        &self,
        service: Option<&RegisteredService>,
        grant_type: GrantType,
    ) -> bool {
        self.is_grant_type_name_supported_by(service, grant_type.as_str())
    }

    /// Whether `service` may use the raw grant type `grant_type`.
    pub fn is_grant_type_name_supported_by(
        &self,
        service: Option<&RegisteredService>,
        grant_type: &str,
    ) -> bool {
        is_grant_type_authorized(service, grant_type, self.config.unrestricted_services)
    }
}

/// Decides whether a registered service may use a grant type.
///
/// An absent service is never authorized. A service without an allow-list is
/// governed by `policy`. Otherwise the grant type must match an entry of the
/// allow-list, ignoring ASCII case.
pub fn is_grant_type_authorized(
    service: Option<&RegisteredService>,
    grant_type: &str,
    policy: UnrestrictedServicePolicy,
) -> bool {
    let Some(service) = service else {
        warn!("No registered service definition was supplied to examine for supported grant types");
        return false;
    };

    let grant_types = match service.supported_grant_types.as_deref() {
        Some(list) if !list.is_empty() => list,
        _ => {
            return match policy {
                UnrestrictedServicePolicy::AllowAll => {
                    warn!(
                        client_id = %service.client_id,
                        "Service definition does not define any authorized grant types and is \
                         authorized for all of them. Assign grant types to the service \
                         definition; set unrestricted_services to deny to enforce this"
                    );
                    true
                }
                UnrestrictedServicePolicy::Deny => {
                    warn!(
                        client_id = %service.client_id,
                        "Service definition does not define any authorized grant types"
                    );
                    false
                }
            };
        }
    };

    if grant_types.iter().any(|t| t.eq_ignore_ascii_case(grant_type)) {
        return true;
    }
    warn!(
        ?grant_types,
        client_id = %service.client_id,
        requested = %grant_type,
        "Unauthorized requested grant type. None of the service's grant types match"
    );
    false
}

/// A validator for one grant type.
#[async_trait]
pub trait TokenRequestValidator: Send + Sync + 'static {
    /// The grant type this validator handles.
    fn grant_type(&self) -> GrantType;

    fn services(&self) -> &ValidatorServices;

    /// The client the request is made for. Defaults to the authenticated profile.
    fn client_id<'a>(
        &self,
        profile: &'a AuthenticatedProfile,
        _ctx: &'a TokenRequestContext,
    ) -> Result<&'a str, Rejection> {
        Ok(profile.id.as_str())
    }

    /// Grant-specific checks, run once the shared checks have passed.
    /// Validators that do not override this reject every request.
    async fn validate_grant(
        &self,
        grant_type: &str,
        profile: &AuthenticatedProfile,
        service: &RegisteredService,
        _ctx: &TokenRequestContext,
    ) -> Result<Verdict, GateError> {
        warn!(
            %grant_type,
            client_id = %service.client_id,
            profile = %profile.id,
            "No grant-specific validation is defined"
        );
        Ok(Rejection::invalid_grant("Grant type has no validation").into())
    }

    /// Whether the request's grant type is the one this validator handles.
    fn supports(&self, ctx: &TokenRequestContext) -> bool {
        let raw = ctx.parameter(&self.services().config.grant_type_parameter);
        is_grant_type(raw, self.grant_type())
    }

    async fn validate(&self, ctx: &TokenRequestContext) -> Result<Verdict, GateError> {
        validate_request(self, ctx).await
    }
}

/// The pipeline shared by every validator.
#[instrument(
    skip_all,
    level = "debug",
    fields(request_id = %ctx.request_id(), validator = %validator.grant_type())
)]
pub async fn validate_request<V>(
    validator: &V,
    ctx: &TokenRequestContext,
) -> Result<Verdict, GateError>
where
    V: TokenRequestValidator + ?Sized,
{
    let services = validator.services();

    let raw = ctx.parameter(&services.config.grant_type_parameter);
    debug!(grant_type = ?raw, "Grant type received");
    let Some(grant_type) = raw.filter(|_| is_any_grant_type(raw, GrantType::all())) else {
        error!(grant_type = ?raw, "Unsupported grant type");
        return Ok(Rejection::UnsupportedGrantType.into());
    };

    let profile = match services.profiles.current_profile(ctx).await? {
        ProfileLookup::Authenticated(profile) => profile,
        ProfileLookup::Unavailable => {
            warn!(
                "Could not locate authenticated profile for this request. \
                 Request is not authenticated"
            );
            return Ok(Rejection::Unauthenticated.into());
        }
        ProfileLookup::Empty => {
            warn!("Could not locate authenticated profile for this request: no profile is present");
            return Ok(Rejection::Unauthenticated.into());
        }
    };

    let client_id = match validator.client_id(&profile, ctx) {
        Ok(client_id) => client_id,
        Err(rejection) => {
            warn!(profile = %profile.id, ?rejection, "Request does not identify a usable client");
            return Ok(rejection.into());
        }
    };
    let Some(service) = services.services.find_service_by(client_id).await? else {
        warn!(%client_id, "No registered service definition was found for the client");
        return Ok(Rejection::UnknownService.into());
    };

    let allowed = services
        .access_strategy
        .is_access_allowed(&service, &profile, ctx.parameter(REDIRECT_URI))
        .await?;
    if !allowed {
        warn!(client_id = %service.client_id, "Service access is denied by its access strategy");
        return Ok(Rejection::AccessDenied.into());
    }

    if !services.is_grant_type_name_supported_by(Some(&service), grant_type) {
        return Ok(Rejection::UnauthorizedGrantType.into());
    }

    validator.validate_grant(grant_type, &profile, &service, ctx).await
}

pub(crate) fn accept(
    grant_type: GrantType,
    service: &RegisteredService,
) -> Result<Verdict, GateError> {
    debug!(%grant_type, client_id = %service.client_id, "Token request accepted");
    Ok(Verdict::Accepted { grant_type, client_id: service.client_id.clone() })
}

pub(crate) fn reject(rejection: Rejection) -> Result<Verdict, GateError> {
    Ok(Verdict::Rejected(rejection))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(grant_types: Option<Vec<&str>>) -> RegisteredService {
        let svc = RegisteredService::new("svc");
        match grant_types {
            Some(list) => svc.grant_types(list),
            None => svc,
        }
    }

    #[test]
    fn absent_service_is_never_authorized() {
        for g in GrantType::all() {
            let policy = UnrestrictedServicePolicy::AllowAll;
            assert!(!is_grant_type_authorized(None, g.as_str(), policy));
        }
    }

    #[test]
    fn missing_or_empty_list_allows_everything() {
        for svc in [service(None), service(Some(vec![]))] {
            for g in GrantType::all() {
                let policy = UnrestrictedServicePolicy::AllowAll;
                assert!(is_grant_type_authorized(Some(&svc), g.as_str(), policy));
            }
            let policy = UnrestrictedServicePolicy::Deny;
            assert!(!is_grant_type_authorized(Some(&svc), "password", policy));
        }
    }

    #[test]
    fn explicit_list_matches_case_insensitively() {
        let svc = service(Some(vec!["client_credentials", "REFRESH_TOKEN"]));
        let policy = UnrestrictedServicePolicy::AllowAll;
        assert!(is_grant_type_authorized(Some(&svc), "Client_Credentials", policy));
        assert!(is_grant_type_authorized(Some(&svc), "refresh_token", policy));
        assert!(!is_grant_type_authorized(Some(&svc), "password", policy));
        assert!(!is_grant_type_authorized(Some(&svc), "authorization_code", policy));
    }
}
