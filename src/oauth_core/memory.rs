//! In-memory default implementations for the gate's collaborator traits.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;

use super::context::TokenRequestContext;
use super::oauth_provider::{
    AccessStrategyEnforcer, ProfileLookup, ProfileResolver, ServiceResolver, TicketRegistry,
};
use super::types::{
    AuthenticatedProfile, CodeTicket, DeviceTicket, GateError, RefreshTicket, RegisteredService,
};

#[derive(Clone, Default)]
pub struct InMemoryServiceRegistry {
    services: Arc<DashMap<String, RegisteredService>>,
}

impl InMemoryServiceRegistry {
    /// Creates a registry with an initial set of services.
    pub fn new(initial_services: Vec<RegisteredService>) -> Self {
        let map = DashMap::new();
        for service in initial_services {
            map.insert(service.client_id.clone(), service);
        }
        Self { services: Arc::new(map) }
    }

    /// Loads a JSON array of service definitions.
    pub fn from_json(json: &str) -> Result<Self, GateError> {
        let services: Vec<RegisteredService> = serde_json::from_str(json)
            .map_err(|e| GateError::Config(format!("invalid service definitions: {}", e)))?;
        Ok(Self::new(services))
    }

    /// Adds or replaces a service definition.
    pub fn insert(&self, service: RegisteredService) {
        self.services.insert(service.client_id.clone(), service);
    }

    pub fn remove(&self, client_id: &str) {
        self.services.remove(client_id);
    }
}

#[async_trait]
impl ServiceResolver for InMemoryServiceRegistry {
    async fn find_service_by(
        &self,
        client_id: &str,
    ) -> Result<Option<RegisteredService>, GateError> {
        Ok(self.services.get(client_id).map(|entry| entry.value().clone()))
    }
}

/// In-memory storage for codes, refresh tokens and device codes.
#[derive(Clone, Default)]
pub struct InMemoryTicketRegistry {
    codes: Arc<RwLock<HashMap<String, CodeTicket>>>,
    refresh_tokens: Arc<RwLock<HashMap<String, RefreshTicket>>>,
    device_codes: Arc<RwLock<HashMap<String, DeviceTicket>>>,
}

impl InMemoryTicketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn store_code(&self, ticket: CodeTicket) {
        let mut guard = self.codes.write().await;
        guard.insert(ticket.code.clone(), ticket);
    }

    pub async fn store_refresh_token(&self, ticket: RefreshTicket) {
        let mut guard = self.refresh_tokens.write().await;
        guard.insert(ticket.token.clone(), ticket);
    }

    pub async fn store_device_code(&self, ticket: DeviceTicket) {
        let mut guard = self.device_codes.write().await;
        guard.insert(ticket.device_code.clone(), ticket);
    }

    /// Marks a refresh token revoked. Returns whether it existed.
    pub async fn revoke_refresh_token(&self, token: &str) -> bool {
        let mut guard = self.refresh_tokens.write().await;
        match guard.get_mut(token) {
            Some(ticket) => {
                ticket.revoked = true;
                true
            }
            None => false,
        }
    }

    /// Records user approval of a device code. Returns whether it existed.
    pub async fn approve_device_code(&self, user_code: &str) -> bool {
        let mut guard = self.device_codes.write().await;
        match guard.values_mut().find(|t| t.user_code == user_code) {
            Some(ticket) => {
                ticket.approved = true;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl TicketRegistry for InMemoryTicketRegistry {
    async fn get_code(&self, code: &str) -> Result<Option<CodeTicket>, GateError> {
        let guard = self.codes.read().await;
        Ok(guard.get(code).cloned())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshTicket>, GateError> {
        let guard = self.refresh_tokens.read().await;
        Ok(guard.get(token).cloned())
    }

    async fn get_device_code(&self, device_code: &str) -> Result<Option<DeviceTicket>, GateError> {
        let guard = self.device_codes.read().await;
        Ok(guard.get(device_code).cloned())
    }
}

/// Resolves every request to the same lookup result.
#[derive(Debug, Clone)]
pub struct StaticProfileResolver {
    lookup: ProfileLookup,
}

impl StaticProfileResolver {
    pub fn authenticated(profile: AuthenticatedProfile) -> Self {
        Self { lookup: ProfileLookup::Authenticated(profile) }
    }

    pub fn anonymous() -> Self {
        Self { lookup: ProfileLookup::Empty }
    }

    pub fn unavailable() -> Self {
        Self { lookup: ProfileLookup::Unavailable }
    }
}

#[async_trait]
impl ProfileResolver for StaticProfileResolver {
    async fn current_profile(
        &self,
        _ctx: &TokenRequestContext,
    ) -> Result<ProfileLookup, GateError> {
        Ok(self.lookup.clone())
    }
}

/// Access strategy that allows every service.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermitAllAccessStrategy;

#[async_trait]
impl AccessStrategyEnforcer for PermitAllAccessStrategy {
    async fn is_access_allowed(
        &self,
        _service: &RegisteredService,
        _profile: &AuthenticatedProfile,
        _redirect_uri: Option<&str>,
    ) -> Result<bool, GateError> {
        Ok(true)
    }
}

/// Access strategy refusing a fixed set of disabled client ids.
#[derive(Debug, Clone, Default)]
pub struct DisabledClientsAccessStrategy {
    disabled: HashSet<String>,
}

impl DisabledClientsAccessStrategy {
    pub fn new<I, S>(client_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { disabled: client_ids.into_iter().map(Into::into).collect() }
    }
}

#[async_trait]
impl AccessStrategyEnforcer for DisabledClientsAccessStrategy {
    async fn is_access_allowed(
        &self,
        service: &RegisteredService,
        _profile: &AuthenticatedProfile,
        _redirect_uri: Option<&str>,
    ) -> Result<bool, GateError> {
        Ok(!self.disabled.contains(&service.client_id))
    }
}
