//! Boutik Checkout - payment orchestration for West and Central African
//! mobile-money rails.
//!
//! This crate drives one checkout attempt from form entry to a confirmed
//! payment:
//!
//! - [`catalog`] - countries and the payment methods available in each
//! - [`phone`] - country- and provider-specific mobile number rules
//! - [`vault`] - remembered customer identities over two redundant stores
//! - [`gateway`] - the payment backend client (initialize / process / OTP)
//! - [`handler`] - per-provider completion handlers resolved from a registry
//! - [`form`] - the customer form and its per-field validation
//! - [`orchestrator`] - the checkout state machine tying it all together
//!
//! # Flow
//!
//! A [`orchestrator::CheckoutOrchestrator`] starts in `CollectingInfo`.
//! Picking a country scopes the method list; picking a method re-validates
//! the phone number; submitting initializes the payment and hands off to
//! the method's completion protocol (immediate finalization, provider-hosted
//! hand-off, or an OTP challenge) until the session succeeds or the customer
//! backs out to retry.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod error;
pub mod form;
pub mod gateway;
pub mod handler;
pub mod orchestrator;
pub mod phone;
pub mod vault;

pub use catalog::{Catalog, Country, CountryCode, MethodId, PaymentMethod};
pub use error::CheckoutError;
pub use form::{CustomerForm, Field, FieldErrors};
pub use gateway::{GatewayConfig, GatewayError, HttpPaymentGateway, PaymentGateway};
pub use handler::{HandlerRegistry, ProviderCompletionHandler, ProviderContext, ProviderReceipt};
pub use orchestrator::{CheckoutOrchestrator, CheckoutState, Notice, NoticeKind, OrderContext};
pub use phone::{PhoneRuleError, validate_phone};
pub use vault::{CustomerVault, SavedCustomer};
