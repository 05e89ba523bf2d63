//! The checkout state machine.
//!
//! One `CheckoutOrchestrator` owns one checkout attempt: the form being
//! filled, the payment session once a token is issued, and the transitions
//! between form entry, initialization, the provider completion step, and
//! terminal success.
//!
//! ```text
//! CollectingInfo -> Submitting -> { DirectResult
//!                                 | RedirectHandoff
//!                                 | OtpChallenge } -> Succeeded
//! ```
//!
//! `CollectingInfo` is also the recovery target: a failed initialization
//! lands back on it with a notice, and the customer can abandon any
//! completion state with [`CheckoutOrchestrator::back_to_methods`], which
//! discards the token. Provider failures inside a completion state keep
//! the token so the customer can retry without re-initializing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use boutik_core::{Amount, CheckoutPhase, CompletionShape, CurrencyCode, PaymentToken, ProductId, StoreId};

use crate::catalog::{Catalog, CountryCode, MethodId};
use crate::error::CheckoutError;
use crate::form::{CustomerForm, ValidatedForm};
use crate::gateway::{
    CustomerDetails, InitializePaymentRequest, PaymentGateway, VerifyOtpRequest,
    extract_error_message,
};
use crate::handler::{HandlerRegistry, ProviderContext, ProviderReceipt};
use crate::vault::{CustomerVault, SavedCustomer};

/// Defensive fallback when the order carries no amount.
pub const DEFAULT_AMOUNT: Amount = Amount::from_minor(1000);

/// Length of the one-time code in the hard-coded OTP flow.
pub const OTP_LENGTH: usize = 4;

/// The one provider whose completion is an OTP challenge no matter what
/// the catalog says.
pub const OTP_METHOD: &str = "orange-money-ci";

/// Pause between a confirmed payment and the terminal transition, so the
/// confirmation is visible before the checkout resets.
pub const SUCCESS_GRACE: Duration = Duration::from_millis(1500);

/// What is being bought, handed to the orchestrator when checkout opens.
#[derive(Debug, Clone)]
pub struct OrderContext {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub product_name: String,
    /// Price in minor units; [`DEFAULT_AMOUNT`] when absent.
    pub amount: Option<Amount>,
    pub currency: CurrencyCode,
}

/// One payment attempt, alive from submission until success or abandon.
#[derive(Debug, Clone)]
pub struct PaymentSession {
    /// Token issued by initialization; absent while the request is in
    /// flight.
    pub token: Option<PaymentToken>,
    pub amount: Amount,
    pub currency: CurrencyCode,
    pub product_id: ProductId,
    pub store_id: StoreId,
    /// Method the token was issued for. Immutable for the session's
    /// lifetime; changing methods requires discarding the session.
    pub method: MethodId,
    pub phase: CheckoutPhase,
}

/// Where the checkout currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum CheckoutState {
    /// Editing the form.
    CollectingInfo,
    /// Initialization in flight; a second submit is a no-op.
    Submitting,
    /// Awaiting a single server-side finalization call.
    DirectResult,
    /// Awaiting the provider-hosted completion step.
    RedirectHandoff,
    /// Awaiting a one-time code from the customer.
    OtpChallenge {
        /// Digits the code must have before submission is allowed.
        expected_len: usize,
    },
    /// Terminal: payment confirmed, session discarded.
    Succeeded,
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Error,
    Info,
}

/// A dismissible user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }
}

/// Drives one checkout attempt end to end.
pub struct CheckoutOrchestrator {
    order: OrderContext,
    form: CustomerForm,
    state: CheckoutState,
    session: Option<PaymentSession>,
    submitted: Option<ValidatedForm>,
    notice: Option<Notice>,
    selected_customer: Option<(boutik_core::Email, boutik_core::PhoneNumber)>,
    vault: Arc<CustomerVault>,
    gateway: Arc<dyn PaymentGateway>,
    registry: Arc<HandlerRegistry>,
    success_grace: Duration,
}

impl CheckoutOrchestrator {
    /// Open a checkout for an order.
    #[must_use]
    pub fn new(
        order: OrderContext,
        vault: Arc<CustomerVault>,
        gateway: Arc<dyn PaymentGateway>,
        registry: Arc<HandlerRegistry>,
    ) -> Self {
        Self {
            order,
            form: CustomerForm::new(Catalog::default_country()),
            state: CheckoutState::CollectingInfo,
            session: None,
            submitted: None,
            notice: None,
            selected_customer: None,
            vault,
            gateway,
            registry,
            success_grace: SUCCESS_GRACE,
        }
    }

    /// Override the success grace period (tests use zero).
    #[must_use]
    pub const fn with_success_grace(mut self, grace: Duration) -> Self {
        self.success_grace = grace;
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Coarse session phase, for display.
    #[must_use]
    pub const fn phase(&self) -> CheckoutPhase {
        match self.state {
            CheckoutState::CollectingInfo => CheckoutPhase::CollectingInfo,
            CheckoutState::Submitting => CheckoutPhase::Initializing,
            CheckoutState::DirectResult
            | CheckoutState::RedirectHandoff
            | CheckoutState::OtpChallenge { .. } => CheckoutPhase::AwaitingCompletion,
            CheckoutState::Succeeded => CheckoutPhase::Succeeded,
        }
    }

    /// The form being edited.
    #[must_use]
    pub const fn form(&self) -> &CustomerForm {
        &self.form
    }

    /// The live payment session, if one exists.
    #[must_use]
    pub const fn session(&self) -> Option<&PaymentSession> {
        self.session.as_ref()
    }

    /// The current notification, if any.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Dismiss the current notification.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Methods available for the form's current country.
    #[must_use]
    pub fn available_methods(&self) -> &'static [crate::catalog::PaymentMethod] {
        Catalog::methods_for(self.form.country())
    }

    /// Saved customers, newest first.
    #[must_use]
    pub fn saved_customers(&self) -> Vec<SavedCustomer> {
        self.vault.load()
    }

    fn ensure_collecting(&self, what: &'static str) -> Result<(), CheckoutError> {
        if self.state == CheckoutState::CollectingInfo {
            Ok(())
        } else {
            Err(CheckoutError::InvalidTransition(what))
        }
    }

    /// Edit the email field.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside form entry.
    pub fn set_email(&mut self, value: &str) -> Result<(), CheckoutError> {
        self.ensure_collecting("edit email")?;
        self.form.set_email(value);
        Ok(())
    }

    /// Edit the first-name field.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside form entry.
    pub fn set_first_name(&mut self, value: &str) -> Result<(), CheckoutError> {
        self.ensure_collecting("edit first name")?;
        self.form.set_first_name(value);
        Ok(())
    }

    /// Edit the last-name field.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside form entry.
    pub fn set_last_name(&mut self, value: &str) -> Result<(), CheckoutError> {
        self.ensure_collecting("edit last name")?;
        self.form.set_last_name(value);
        Ok(())
    }

    /// Edit the phone field; the verdict is recomputed immediately.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside form entry.
    pub fn set_phone(&mut self, value: &str) -> Result<(), CheckoutError> {
        self.ensure_collecting("edit phone")?;
        self.form.set_phone(value);
        Ok(())
    }

    /// Switch country. Always clears the selected method and re-validates
    /// the phone against no method.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside form entry.
    pub fn set_country(&mut self, country: CountryCode) -> Result<(), CheckoutError> {
        self.ensure_collecting("change country")?;
        self.form.set_country(country);
        Ok(())
    }

    /// Select a payment method for the current country.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside form entry -
    /// in particular once a token has been issued, since a session is
    /// bound to the method it was initialized for.
    pub fn set_method(&mut self, method: MethodId) -> Result<(), CheckoutError> {
        self.ensure_collecting("change payment method")?;
        if !self.form.set_method(method) {
            return Err(CheckoutError::InvalidTransition(
                "method not offered in this country",
            ));
        }
        Ok(())
    }

    /// Apply a saved customer to the form, or clear the form if the same
    /// customer is picked twice in a row (toggle).
    ///
    /// Applying overwrites every field and the country atomically, leaves
    /// the method unselected, and re-stamps the vault entry. Clearing
    /// resets the country to the catalog default.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside form entry.
    pub fn select_saved_customer(&mut self, index: usize) -> Result<(), CheckoutError> {
        self.ensure_collecting("apply saved customer")?;

        let customers = self.vault.load();
        let Some(customer) = customers.get(index) else {
            tracing::warn!(index, "saved customer index out of range");
            return Ok(());
        };

        let key = (customer.email.clone(), customer.phone.clone());
        if self.selected_customer.as_ref() == Some(&key) {
            self.form.reset(Catalog::default_country());
            self.selected_customer = None;
            return Ok(());
        }

        self.form.apply_saved(customer);
        self.selected_customer = Some(key);
        self.vault.touch(index);
        Ok(())
    }

    /// Submit the form: validate, initialize the payment, remember the
    /// customer, and hand off to the method's completion protocol.
    ///
    /// Calling this while an initialization is already in flight is a
    /// no-op, which is the only duplicate-request guard the flow needs.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::Validation`] when the form does not pass;
    /// [`CheckoutError::Initialization`] when the backend declines or the
    /// call fails, in which case the checkout is back on the form.
    pub async fn submit(&mut self) -> Result<(), CheckoutError> {
        match self.state {
            CheckoutState::CollectingInfo => {}
            CheckoutState::Submitting => return Ok(()),
            _ => return Err(CheckoutError::InvalidTransition("submit")),
        }

        let Some(valid) = self.form.validate_for_submit() else {
            return Err(CheckoutError::Validation(self.form.errors().clone()));
        };

        let amount = self.order.amount.unwrap_or(DEFAULT_AMOUNT);
        let country = Catalog::country(valid.country);

        self.state = CheckoutState::Submitting;
        self.notice = None;
        self.session = Some(PaymentSession {
            token: None,
            amount,
            currency: self.order.currency,
            product_id: self.order.product_id.clone(),
            store_id: self.order.store_id.clone(),
            method: valid.method.clone(),
            phase: CheckoutPhase::Initializing,
        });

        let request = InitializePaymentRequest {
            store_id: self.order.store_id.clone(),
            product_id: self.order.product_id.clone(),
            product_name: self.order.product_name.clone(),
            amount,
            currency: self.order.currency,
            customer: CustomerDetails {
                email: valid.email.clone(),
                first_name: valid.first_name.clone(),
                last_name: valid.last_name.clone(),
                phone: valid.phone.clone(),
            },
            payment_method: valid.method.clone(),
            payment_country: country.name.to_owned(),
        };

        let gateway = Arc::clone(&self.gateway);
        match gateway.initialize_payment(&request).await {
            Ok(token) => {
                tracing::info!(method = %valid.method, "payment initialized");
                self.vault.save(SavedCustomer {
                    email: valid.email.clone(),
                    first_name: valid.first_name.clone(),
                    last_name: valid.last_name.clone(),
                    phone: valid.phone.clone(),
                    country: valid.country,
                    last_used: Utc::now(),
                });

                if let Some(session) = &mut self.session {
                    session.token = Some(token);
                    session.phase = CheckoutPhase::AwaitingCompletion;
                }
                self.state = Self::completion_state(&valid.method);
                self.submitted = Some(valid);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "payment initialization failed");
                let message = error.user_message();
                self.session = None;
                self.state = CheckoutState::CollectingInfo;
                self.notice = Some(Notice::error(message.clone()));
                Err(CheckoutError::Initialization(message))
            }
        }
    }

    /// Which completion state a method lands in after initialization.
    ///
    /// Orange Money Côte d'Ivoire goes to the OTP challenge no matter
    /// what shape the catalog gives it; everyone else follows the
    /// catalog.
    fn completion_state(method: &MethodId) -> CheckoutState {
        if method.as_str() == OTP_METHOD {
            return CheckoutState::OtpChallenge {
                expected_len: OTP_LENGTH,
            };
        }

        match Catalog::method(method).map(crate::catalog::PaymentMethod::shape) {
            Some(CompletionShape::OtpChallenge) => CheckoutState::OtpChallenge {
                expected_len: OTP_LENGTH,
            },
            Some(CompletionShape::Direct) => CheckoutState::DirectResult,
            Some(CompletionShape::Redirect) | None => CheckoutState::RedirectHandoff,
        }
    }

    /// Submit a one-time code. Returns `Ok(true)` once the payment is
    /// confirmed and `Ok(false)` when the code was rejected - the token
    /// stays valid and the customer may try again.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::OtpFormat`] when the code is not the expected
    /// number of digits (nothing is sent); [`CheckoutError::Provider`]
    /// when the verification call itself fails;
    /// [`CheckoutError::InvalidTransition`] outside the OTP challenge.
    pub async fn submit_otp(&mut self, code: &str) -> Result<bool, CheckoutError> {
        let CheckoutState::OtpChallenge { expected_len } = self.state else {
            return Err(CheckoutError::InvalidTransition("submit one-time code"));
        };

        if code.len() != expected_len || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(CheckoutError::OtpFormat {
                expected: expected_len,
            });
        }

        let (token, submitted) = self.session_for_completion("submit one-time code")?;
        let dial_prefix = Catalog::country(submitted.country).dial_prefix;

        let request = VerifyOtpRequest {
            phone_number: submitted.phone.to_e164(dial_prefix),
            otp: code.to_owned(),
            payment_token: token,
            customer_name: submitted.full_name(),
            customer_email: submitted.email.clone(),
        };

        let gateway = Arc::clone(&self.gateway);
        match gateway.verify_otp(&request).await {
            Ok(outcome) if outcome.success => {
                tokio::time::sleep(self.success_grace).await;
                self.finish_success(outcome.message);
                Ok(true)
            }
            Ok(outcome) => {
                let message = outcome
                    .message
                    .unwrap_or_else(|| "The code was not accepted. Try again.".to_owned());
                self.notice = Some(Notice::error(message));
                Ok(false)
            }
            Err(error) => {
                tracing::warn!(%error, "one-time code verification failed");
                let message = error.user_message();
                self.notice = Some(Notice::error(message.clone()));
                Err(CheckoutError::Provider(message))
            }
        }
    }

    /// Drive the current method's completion handler server-side, for the
    /// direct and hosted shapes alike. Success is terminal; failure keeps
    /// the token and the state so the same provider can be retried.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::Provider`] when the handler reports failure;
    /// [`CheckoutError::InvalidTransition`] outside a completion state.
    pub async fn complete_via_provider(&mut self) -> Result<ProviderReceipt, CheckoutError> {
        if !matches!(
            self.state,
            CheckoutState::DirectResult | CheckoutState::RedirectHandoff
        ) {
            return Err(CheckoutError::InvalidTransition("run provider completion"));
        }

        let (token, submitted) = self.session_for_completion("run provider completion")?;
        let Some(handler) = self.registry.resolve(&submitted.method) else {
            let message = "No completion handler for this payment method.".to_owned();
            self.notice = Some(Notice::error(message.clone()));
            return Err(CheckoutError::Provider(message));
        };

        let ctx = ProviderContext {
            payment_token: token,
            customer_name: submitted.full_name(),
            customer_email: submitted.email.clone(),
            customer_phone: submitted.phone.clone(),
            country: submitted.country,
            amount: self.session.as_ref().map_or(DEFAULT_AMOUNT, |s| s.amount),
            currency: self.order.currency,
        };

        let gateway = Arc::clone(&self.gateway);
        match handler.complete(gateway.as_ref(), &ctx).await {
            Ok(receipt) => {
                self.finish_success(receipt.message.clone());
                Ok(receipt)
            }
            Err(error) => {
                tracing::warn!(%error, token = %ctx.payment_token, "provider completion failed");
                let message = error.user_message();
                self.notice = Some(Notice::error(message.clone()));
                Err(CheckoutError::Provider(message))
            }
        }
    }

    /// Provider callback: the hosted completion step succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside the hand-off
    /// state.
    pub fn provider_succeeded(&mut self) -> Result<(), CheckoutError> {
        if self.state != CheckoutState::RedirectHandoff {
            return Err(CheckoutError::InvalidTransition("provider success"));
        }
        self.finish_success(None);
        Ok(())
    }

    /// Provider callback: the hosted completion step failed.
    ///
    /// The message is dug out of whatever shape the provider sent; the
    /// token and state are kept so the customer can retry in place.
    /// Returns the message that was surfaced.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] outside the hand-off
    /// state.
    pub fn provider_failed(
        &mut self,
        payload: &serde_json::Value,
    ) -> Result<String, CheckoutError> {
        if self.state != CheckoutState::RedirectHandoff {
            return Err(CheckoutError::InvalidTransition("provider failure"));
        }

        let message = extract_error_message(payload)
            .unwrap_or_else(|| "The payment could not be completed. Try again.".to_owned());
        self.notice = Some(Notice::error(message.clone()));
        Ok(message)
    }

    /// Abandon the completion step and go back to the form. The payment
    /// session - token included - is discarded; the method becomes
    /// editable again.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] while an
    /// initialization is in flight or after success.
    pub fn back_to_methods(&mut self) -> Result<(), CheckoutError> {
        match self.state {
            CheckoutState::CollectingInfo => Ok(()),
            CheckoutState::DirectResult
            | CheckoutState::RedirectHandoff
            | CheckoutState::OtpChallenge { .. } => {
                self.session = None;
                self.submitted = None;
                self.state = CheckoutState::CollectingInfo;
                Ok(())
            }
            CheckoutState::Submitting | CheckoutState::Succeeded => {
                Err(CheckoutError::InvalidTransition("back to methods"))
            }
        }
    }

    fn session_for_completion(
        &self,
        what: &'static str,
    ) -> Result<(PaymentToken, ValidatedForm), CheckoutError> {
        let token = self
            .session
            .as_ref()
            .and_then(|s| s.token.clone())
            .ok_or(CheckoutError::InvalidTransition(what))?;
        let submitted = self
            .submitted
            .clone()
            .ok_or(CheckoutError::InvalidTransition(what))?;
        Ok((token, submitted))
    }

    fn finish_success(&mut self, message: Option<String>) {
        tracing::info!("payment confirmed");
        self.session = None;
        self.submitted = None;
        self.selected_customer = None;
        self.form.reset(Catalog::default_country());
        self.state = CheckoutState::Succeeded;
        self.notice = Some(Notice::info(
            message.unwrap_or_else(|| "Payment received. Thank you!".to_owned()),
        ));
    }
}
