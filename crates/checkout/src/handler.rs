//! Per-provider completion handlers.
//!
//! Every payment method finishes through a handler that owns the call to
//! that provider's processing endpoint. The providers differ only in
//! endpoint path, numbering rules, and completion shape - all data on the
//! catalog record - so a single parametrized handler serves the whole
//! roster, resolved through a registry built once at startup. A bespoke
//! provider can still register its own implementation over the standard
//! one.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use boutik_core::{Amount, CurrencyCode, Email, PaymentToken, PhoneNumber};

use crate::catalog::{Catalog, CountryCode, MethodId, PaymentMethod};
use crate::gateway::{GatewayError, PaymentGateway, ProcessPaymentRequest};

/// Everything a handler needs to complete one payment.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    /// Token issued at initialization.
    pub payment_token: PaymentToken,
    /// `"First Last"`.
    pub customer_name: String,
    pub customer_email: Email,
    /// Local number; handlers render E.164 with the country dial prefix.
    pub customer_phone: PhoneNumber,
    /// Country the checkout is running in.
    pub country: CountryCode,
    pub amount: Amount,
    pub currency: CurrencyCode,
}

/// What a provider reports on success.
#[derive(Debug, Clone, Default)]
pub struct ProviderReceipt {
    /// Provider message, when one was given.
    pub message: Option<String>,
    /// Provider-hosted page to send the customer to, when the provider
    /// completes out-of-band.
    pub redirect_url: Option<String>,
}

/// Completes payments for exactly one payment method.
///
/// A handler must resolve to exactly one outcome per call: a receipt or
/// an error. Recoverability is the orchestrator's decision.
#[async_trait]
pub trait ProviderCompletionHandler: Send + Sync {
    /// The method this handler completes.
    fn method(&self) -> &'static PaymentMethod;

    /// Run the provider's processing step.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the provider declines or the call
    /// fails; the payment token stays valid either way.
    async fn complete(
        &self,
        gateway: &dyn PaymentGateway,
        ctx: &ProviderContext,
    ) -> Result<ProviderReceipt, GatewayError>;
}

/// The data-driven handler covering every cataloged provider.
pub struct StandardProviderHandler {
    method: &'static PaymentMethod,
}

impl StandardProviderHandler {
    /// Handler for one catalog method.
    #[must_use]
    pub const fn new(method: &'static PaymentMethod) -> Self {
        Self { method }
    }
}

#[async_trait]
impl ProviderCompletionHandler for StandardProviderHandler {
    fn method(&self) -> &'static PaymentMethod {
        self.method
    }

    async fn complete(
        &self,
        gateway: &dyn PaymentGateway,
        ctx: &ProviderContext,
    ) -> Result<ProviderReceipt, GatewayError> {
        let dial_prefix = Catalog::country(self.method.country()).dial_prefix;
        let request = ProcessPaymentRequest {
            phone_number: ctx.customer_phone.to_e164(dial_prefix),
            payment_token: ctx.payment_token.clone(),
            customer_name: ctx.customer_name.clone(),
            customer_email: ctx.customer_email.clone(),
            amount: ctx.amount,
            currency: ctx.currency,
        };

        let response = gateway.process_payment(&self.method.id(), &request).await?;

        Ok(ProviderReceipt {
            message: response.message,
            redirect_url: response.redirect_url,
        })
    }
}

/// Method-id keyed lookup of completion handlers, built once at startup.
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Arc<dyn ProviderCompletionHandler>>,
}

impl HandlerRegistry {
    /// Build the registry with a [`StandardProviderHandler`] for every
    /// method in the catalog.
    #[must_use]
    pub fn from_catalog() -> Self {
        let mut handlers: HashMap<&'static str, Arc<dyn ProviderCompletionHandler>> =
            HashMap::new();

        for country in Catalog::countries() {
            for method in Catalog::methods_for(country.code) {
                handlers.insert(
                    method.id_str(),
                    Arc::new(StandardProviderHandler::new(method)),
                );
            }
        }

        Self { handlers }
    }

    /// Replace (or add) the handler for one method.
    pub fn register(&mut self, handler: Arc<dyn ProviderCompletionHandler>) {
        self.handlers.insert(handler.method().id_str(), handler);
    }

    /// Handler for a method id, if one is registered.
    #[must_use]
    pub fn resolve(&self, id: &MethodId) -> Option<Arc<dyn ProviderCompletionHandler>> {
        self.handlers.get(id.as_str()).cloned()
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::from_catalog()
    }
}
