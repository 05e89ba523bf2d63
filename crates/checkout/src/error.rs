//! Checkout error taxonomy.

use thiserror::Error;

use crate::form::FieldErrors;

/// Errors a checkout attempt can surface.
///
/// Persistence failures are deliberately absent: the vault absorbs them
/// after logging, because losing saved-customer convenience must never
/// block a purchase.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Field-level validation failed. Never contacts the network; the
    /// map says which fields to fix.
    #[error("form validation failed")]
    Validation(FieldErrors),

    /// Payment initialization failed. The customer is back on the form
    /// and may resubmit.
    #[error("payment initialization failed: {0}")]
    Initialization(String),

    /// A provider completion step or OTP verification failed. The
    /// payment token stays valid and the same provider may be retried.
    #[error("{0}")]
    Provider(String),

    /// The one-time code is not the expected number of digits; nothing
    /// was sent.
    #[error("one-time code must be {expected} digits")]
    OtpFormat {
        /// Required code length.
        expected: usize,
    },

    /// The operation is not valid in the checkout's current state.
    #[error("operation not allowed right now: {0}")]
    InvalidTransition(&'static str),
}

impl CheckoutError {
    /// The per-field error map, when this is a validation failure.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
