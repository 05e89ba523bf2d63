//! Country- and provider-specific mobile number validation.
//!
//! Validation runs in a fixed order: presence, minimum length, country
//! numbering shape, then the selected provider's leading-digit rule. The
//! first failing check wins, so the customer always sees the most basic
//! problem first. The function is pure; callers re-run it whenever the
//! phone text *or* the selected method changes, since a verdict computed
//! against a stale method is meaningless.

use boutik_core::PhoneNumber;

use crate::catalog::{Catalog, CountryCode, MethodId};

/// Why a phone number was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneRuleError {
    /// No digits were entered.
    #[error("phone number is required")]
    Required,
    /// Fewer digits than the country's minimum.
    #[error("enter at least {min} digits")]
    TooShort {
        /// The country's minimum digit count.
        min: usize,
    },
    /// The digit count (or a stray character) does not fit the country's
    /// numbering plan.
    #[error("a {country} number has {expected} digits")]
    CountryFormat {
        /// Country display name.
        country: &'static str,
        /// Expected digit count or range.
        expected: String,
    },
    /// The number does not start the way the selected provider requires.
    #[error("this number doesn't look like a {provider} number")]
    ProviderFormat {
        /// Provider display name.
        provider: &'static str,
    },
}

/// Validate a raw phone entry against a country and an optionally selected
/// payment method.
///
/// Returns the digits unchanged on success; rendering to E.164 with the
/// country dial prefix is the caller's concern when dialing out.
///
/// # Errors
///
/// Returns the first failing rule, in order: [`PhoneRuleError::Required`],
/// [`PhoneRuleError::TooShort`], [`PhoneRuleError::CountryFormat`],
/// [`PhoneRuleError::ProviderFormat`].
pub fn validate_phone(
    country: CountryCode,
    method: Option<&MethodId>,
    raw: &str,
) -> Result<PhoneNumber, PhoneRuleError> {
    let plan = Catalog::country(country);

    if raw.trim().is_empty() {
        return Err(PhoneRuleError::Required);
    }

    let phone = PhoneNumber::parse(raw).map_err(|_| PhoneRuleError::CountryFormat {
        country: plan.name,
        expected: plan.digit_rule.to_string(),
    })?;

    if phone.len() < plan.digit_rule.min() {
        return Err(PhoneRuleError::TooShort {
            min: plan.digit_rule.min(),
        });
    }

    if !plan.digit_rule.contains(phone.len()) {
        return Err(PhoneRuleError::CountryFormat {
            country: plan.name,
            expected: plan.digit_rule.to_string(),
        });
    }

    if let Some(id) = method {
        // A method id that isn't in the catalog carries no prefix rule.
        if let Some(m) = Catalog::method(id) {
            if !m.prefix().matches(phone.digits()) {
                return Err(PhoneRuleError::ProviderFormat {
                    provider: m.display_name(),
                });
            }
        }
    }

    Ok(phone)
}
