//! Collaborator traits the gate consumes but never implements for production.

use async_trait::async_trait;

use super::context::TokenRequestContext;
use super::types::{
    AuthenticatedProfile, CodeTicket, DeviceTicket, GateError, RefreshTicket, RegisteredService,
};

/// Trait for looking up registered services.
#[async_trait]
pub trait ServiceResolver: Send + Sync + 'static {
    /// Finds the service registered under `client_id`, if any.
    async fn find_service_by(
        &self,
        client_id: &str,
    ) -> Result<Option<RegisteredService>, GateError>;
}

/// Outcome of looking for the caller's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileLookup {
    /// No profile container could be obtained for this request at all.
    Unavailable,
    /// A container exists but holds no authenticated profile.
    Empty,
    Authenticated(AuthenticatedProfile),
}

/// Trait resolving the authenticated caller of a request.
#[async_trait]
pub trait ProfileResolver: Send + Sync + 'static {
    async fn current_profile(&self, ctx: &TokenRequestContext) -> Result<ProfileLookup, GateError>;
}

/// Trait for the registered-service access strategy (enabled flags, time
/// windows, required attributes and similar policy).
#[async_trait]
pub trait AccessStrategyEnforcer: Send + Sync + 'static {
    /// Returns `false` when the service may not be used by this caller.
    async fn is_access_allowed(
        &self,
        service: &RegisteredService,
        profile: &AuthenticatedProfile,
        redirect_uri: Option<&str>,
    ) -> Result<bool, GateError>;
}

/// Trait for reading issued tickets (codes, refresh tokens, device codes).
#[async_trait]
pub trait TicketRegistry: Send + Sync + 'static {
    async fn get_code(&self, code: &str) -> Result<Option<CodeTicket>, GateError>;

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshTicket>, GateError>;

    async fn get_device_code(&self, device_code: &str) -> Result<Option<DeviceTicket>, GateError>;
}
