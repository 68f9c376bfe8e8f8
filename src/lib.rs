//! Token request validation gate for Starberry OAuth2 servers.
//!
//! A [`ValidatorChain`] picks the one validator matching a request's
//! `grant_type` and runs it. Every validator shares the same pipeline: the
//! grant type must be known, the caller authenticated, the client registered
//! and admitted by the access strategy, and the grant type allowed for the
//! client, before the grant-specific checks decide.

pub mod oauth_core;
pub mod validator;

pub use oauth_core::client_auth::ClientSecretProfileResolver;
pub use oauth_core::config::{GateConfig, UnrestrictedServicePolicy};
pub use oauth_core::context::TokenRequestContext;
pub use oauth_core::grant_type::GrantType;
pub use oauth_core::memory::{
    DisabledClientsAccessStrategy, InMemoryServiceRegistry, InMemoryTicketRegistry,
    PermitAllAccessStrategy, StaticProfileResolver,
};
pub use oauth_core::oauth_provider::{
    AccessStrategyEnforcer, ProfileLookup, ProfileResolver, ServiceResolver, TicketRegistry,
};
pub use oauth_core::types::{AuthenticatedProfile, GateError, RegisteredService, Rejection, Verdict};
pub use validator::{
    is_grant_type_authorized, TokenRequestValidator, ValidatorChain, ValidatorServices,
};
