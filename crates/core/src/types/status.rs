//! Status enums for the checkout flow.

use serde::{Deserialize, Serialize};

/// How a payment method finalizes once a payment has been initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionShape {
    /// Finalized immediately by a single server-side processing call
    /// (server-initiated push on the customer's handset).
    Direct,
    /// Hand-off to a provider-hosted completion step; the provider reports
    /// success or failure back asynchronously.
    Redirect,
    /// The customer proves possession of the line with a one-time passcode.
    OtpChallenge,
}

/// Phase of a payment session, from form entry to a terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CheckoutPhase {
    /// Customer is still filling in the form.
    #[default]
    CollectingInfo,
    /// An initialization request is in flight.
    Initializing,
    /// A token has been issued; waiting on the provider completion step.
    AwaitingCompletion,
    /// Payment confirmed.
    Succeeded,
    /// Payment failed terminally.
    Failed,
}

impl CheckoutPhase {
    /// True once the session has reached a terminal phase.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_shape_serde_names() {
        let json = serde_json::to_string(&CompletionShape::OtpChallenge).expect("serialize");
        assert_eq!(json, "\"otp-challenge\"");

        let shape: CompletionShape = serde_json::from_str("\"redirect\"").expect("deserialize");
        assert_eq!(shape, CompletionShape::Redirect);
    }

    #[test]
    fn test_phase_default_and_terminal() {
        assert_eq!(CheckoutPhase::default(), CheckoutPhase::CollectingInfo);
        assert!(CheckoutPhase::Succeeded.is_terminal());
        assert!(CheckoutPhase::Failed.is_terminal());
        assert!(!CheckoutPhase::AwaitingCompletion.is_terminal());
    }
}
