//! Integration test support for Boutik.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p boutik-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - End-to-end state machine scenarios
//! - `customer_vault` - Dual-store persistence properties
//! - `phone_rules` - Numbering-plan validation scenarios
//!
//! The [`MockGateway`] here stands in for the payment backend: outcomes
//! are scripted per endpoint (defaults are success) and every request is
//! recorded for assertions on the wire contract.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use boutik_checkout::gateway::{
    GatewayError, InitializePaymentRequest, OtpOutcome, PaymentGateway, ProcessPaymentRequest,
    ProcessPaymentResponse, VerifyOtpRequest,
};
use boutik_checkout::vault::MemoryStore;
use boutik_checkout::{CheckoutOrchestrator, CustomerVault, HandlerRegistry, MethodId, OrderContext};
use boutik_core::{Amount, CurrencyCode, PaymentToken, ProductId, StoreId};

/// Scripted payment backend double.
///
/// Each endpoint pops its next scripted outcome; with nothing scripted it
/// succeeds. Every incoming request is recorded verbatim.
#[derive(Default)]
pub struct MockGateway {
    init_script: Mutex<VecDeque<Result<String, String>>>,
    otp_script: Mutex<VecDeque<(bool, Option<String>)>>,
    process_script: Mutex<VecDeque<Result<ProcessPaymentResponse, String>>>,
    init_requests: Mutex<Vec<InitializePaymentRequest>>,
    otp_requests: Mutex<Vec<VerifyOtpRequest>>,
    process_requests: Mutex<Vec<(MethodId, ProcessPaymentRequest)>>,
}

impl MockGateway {
    /// A gateway that succeeds at everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next initialization to return this token.
    pub fn queue_init_token(&self, token: &str) {
        lock(&self.init_script).push_back(Ok(token.to_owned()));
    }

    /// Script the next initialization to be declined with this message.
    pub fn queue_init_failure(&self, message: &str) {
        lock(&self.init_script).push_back(Err(message.to_owned()));
    }

    /// Script the next OTP verification outcome.
    pub fn queue_otp_outcome(&self, accepted: bool, message: &str) {
        let message = (!message.is_empty()).then(|| message.to_owned());
        lock(&self.otp_script).push_back((accepted, message));
    }

    /// Script the next provider processing step to fail.
    pub fn queue_process_failure(&self, message: &str) {
        lock(&self.process_script).push_back(Err(message.to_owned()));
    }

    /// Initialization requests received so far.
    #[must_use]
    pub fn init_requests(&self) -> Vec<InitializePaymentRequest> {
        lock(&self.init_requests).clone()
    }

    /// OTP requests received so far.
    #[must_use]
    pub fn otp_requests(&self) -> Vec<VerifyOtpRequest> {
        lock(&self.otp_requests).clone()
    }

    /// Processing requests received so far, with the method they targeted.
    #[must_use]
    pub fn process_requests(&self) -> Vec<(MethodId, ProcessPaymentRequest)> {
        lock(&self.process_requests).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().expect("mock gateway lock")
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initialize_payment(
        &self,
        request: &InitializePaymentRequest,
    ) -> Result<PaymentToken, GatewayError> {
        lock(&self.init_requests).push(request.clone());
        let n = lock(&self.init_requests).len();

        match lock(&self.init_script).pop_front() {
            Some(Ok(token)) => Ok(PaymentToken::new(token)),
            Some(Err(message)) => Err(GatewayError::Rejected { message }),
            None => Ok(PaymentToken::new(format!("tok-{n}"))),
        }
    }

    async fn process_payment(
        &self,
        method: &MethodId,
        request: &ProcessPaymentRequest,
    ) -> Result<ProcessPaymentResponse, GatewayError> {
        lock(&self.process_requests)
            .push((method.clone(), request.clone()));

        match lock(&self.process_script).pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(GatewayError::Rejected { message }),
            None => Ok(ProcessPaymentResponse {
                message: Some("processed".to_owned()),
                redirect_url: None,
            }),
        }
    }

    async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<OtpOutcome, GatewayError> {
        lock(&self.otp_requests).push(request.clone());

        match lock(&self.otp_script).pop_front() {
            Some((success, message)) => Ok(OtpOutcome { success, message }),
            None => Ok(OtpOutcome {
                success: true,
                message: None,
            }),
        }
    }
}

/// An order for one 6 500 XOF product, amount supplied.
#[must_use]
pub fn order() -> OrderContext {
    OrderContext {
        store_id: StoreId::new("btk-7201"),
        product_id: ProductId::new("wax-print-tote"),
        product_name: "Wax print tote".to_owned(),
        amount: Some(Amount::from_minor(6500)),
        currency: CurrencyCode::XOF,
    }
}

/// Same order with no amount attached.
#[must_use]
pub fn order_without_amount() -> OrderContext {
    OrderContext {
        amount: None,
        ..order()
    }
}

/// A checkout over in-memory vault stores and the given gateway, with the
/// success grace period zeroed for tests.
#[must_use]
pub fn checkout_with(order: OrderContext, gateway: Arc<MockGateway>) -> CheckoutOrchestrator {
    checkout_with_vault(order, gateway, empty_vault())
}

/// Same, but over a caller-supplied vault.
#[must_use]
pub fn checkout_with_vault(
    order: OrderContext,
    gateway: Arc<MockGateway>,
    vault: Arc<CustomerVault>,
) -> CheckoutOrchestrator {
    CheckoutOrchestrator::new(order, vault, gateway, Arc::new(HandlerRegistry::from_catalog()))
        .with_success_grace(Duration::ZERO)
}

/// A vault over two fresh in-memory stores.
#[must_use]
pub fn empty_vault() -> Arc<CustomerVault> {
    Arc::new(CustomerVault::new(
        Box::new(MemoryStore::new()),
        Box::new(MemoryStore::new()),
    ))
}
