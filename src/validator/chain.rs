//! Selection of the single validator that handles a token request.

use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use super::{
    AuthorizationCodeValidator, ClientCredentialsValidator, DeviceCodeValidator, PasswordValidator,
    RefreshTokenValidator, TokenRequestValidator, ValidatorServices,
};
use crate::oauth_core::config::{GateConfig, UnrestrictedServicePolicy};
use crate::oauth_core::context::TokenRequestContext;
use crate::oauth_core::grant_type::GrantType;
use crate::oauth_core::types::{GateError, Rejection, Verdict};

/// Order given to validators registered without one; evaluated last.
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

struct OrderedValidator {
    order: i32,
    validator: Arc<dyn TokenRequestValidator>,
}

/// Builder collecting validators with their precedence.
pub struct ValidatorChainBuilder {
    entries: Vec<OrderedValidator>,
    config: Option<Arc<GateConfig>>,
}

impl ValidatorChainBuilder {
    /// Registers a validator with the lowest precedence.
    pub fn register(self, validator: Arc<dyn TokenRequestValidator>) -> Self {
        self.register_with_order(validator, LOWEST_PRECEDENCE)
    }

    /// Registers a validator; lower `order` values are consulted first.
    pub fn register_with_order(
        mut self,
        validator: Arc<dyn TokenRequestValidator>,
        order: i32,
    ) -> Self {
        self.entries.push(OrderedValidator { order, validator });
        self
    }

    /// Sets the configuration used to read the grant type from requests.
    /// Without it, the first registered validator's configuration is used.
    pub fn config(mut self, config: Arc<GateConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Sorts the validators once. Registration order breaks ties.
    pub fn build(mut self) -> ValidatorChain {
        let config = self
            .config
            .take()
            .or_else(|| self.entries.first().map(|e| e.validator.services().config.clone()))
            .unwrap_or_default();
        self.entries.sort_by_key(|e| e.order);

        if config.unrestricted_services == UnrestrictedServicePolicy::AllowAll {
            warn!(
                "Services without supported grant types are authorized for every grant type \
                 (unrestricted_services = allow_all)"
            );
        }
        for grant_type in GrantType::all() {
            let handlers =
                self.entries.iter().filter(|e| e.validator.grant_type() == *grant_type).count();
            match handlers {
                0 => warn!(%grant_type, "No token request validator is registered for grant type"),
                1 => {}
                n => warn!(
                    %grant_type,
                    validators = n,
                    "Several validators handle the same grant type; only the first is used"
                ),
            }
        }

        ValidatorChain { validators: self.entries, config }
    }
}

/// Priority-ordered set of validators. Exactly one validator runs per request.
pub struct ValidatorChain {
    validators: Vec<OrderedValidator>,
    config: Arc<GateConfig>,
}

impl ValidatorChain {
    pub fn builder() -> ValidatorChainBuilder {
        ValidatorChainBuilder { entries: Vec::new(), config: None }
    }

    /// A chain with a validator for every grant type in the catalog.
    pub fn with_defaults(services: ValidatorServices) -> Self {
        Self::builder()
            .register(Arc::new(AuthorizationCodeValidator::new(services.clone())))
            .register(Arc::new(PasswordValidator::new(services.clone())))
            .register(Arc::new(ClientCredentialsValidator::new(services.clone())))
            .register(Arc::new(RefreshTokenValidator::new(services.clone())))
            .register(Arc::new(DeviceCodeValidator::new(services)))
            .build()
    }

    /// The first validator, in precedence order, supporting the request.
    pub fn select(&self, ctx: &TokenRequestContext) -> Option<&Arc<dyn TokenRequestValidator>> {
        self.validators.iter().map(|e| &e.validator).find(|v| v.supports(ctx))
    }

    /// Grant types handled by this chain, in precedence order.
    pub fn grant_types(&self) -> Vec<GrantType> {
        self.validators.iter().map(|e| e.validator.grant_type()).collect()
    }

    /// Runs the request through the selected validator.
    #[instrument(skip_all, level = "debug", fields(request_id = %ctx.request_id()))]
    pub async fn validate(&self, ctx: &TokenRequestContext) -> Result<Verdict, GateError> {
        if let Some(validator) = self.select(ctx) {
            debug!(grant_type = %validator.grant_type(), "Selected token request validator");
            return validator.validate(ctx).await;
        }

        let raw = ctx.parameter(&self.config.grant_type_parameter);
        match raw.and_then(GrantType::parse) {
            Some(grant_type) => {
                error!(
                    %grant_type,
                    "Grant type is recognized but no validator is registered for it"
                );
                Ok(Rejection::NoValidator.into())
            }
            None => {
                warn!(grant_type = ?raw, "Grant type is not supported");
                Ok(Rejection::UnsupportedGrantType.into())
            }
        }
    }
}
