//! Monetary amounts in minor units.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the currency's minor unit.
///
/// Mobile-money rails deal in integer minor units end to end; conversion to
/// a decimal major-unit value only happens for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Create an amount from minor units.
    #[must_use]
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// The raw minor-unit value.
    #[must_use]
    pub const fn minor(self) -> u64 {
        self.0
    }

    /// Convert to a decimal value in the currency's major unit.
    ///
    /// ```
    /// use boutik_core::{Amount, CurrencyCode};
    ///
    /// // XOF has no minor subdivision
    /// let xof = Amount::from_minor(1000).to_decimal(CurrencyCode::XOF);
    /// assert_eq!(xof.to_string(), "1000");
    ///
    /// // ZMW is exponent 2
    /// let zmw = Amount::from_minor(1050).to_decimal(CurrencyCode::ZMW);
    /// assert_eq!(zmw.to_string(), "10.50");
    /// ```
    #[must_use]
    pub fn to_decimal(self, currency: CurrencyCode) -> Decimal {
        Decimal::new(i64::try_from(self.0).unwrap_or(i64::MAX), currency.exponent())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO 4217 currency codes for the supported payment corridors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// West African CFA franc.
    #[default]
    XOF,
    /// Central African CFA franc.
    XAF,
    /// Zambian kwacha.
    ZMW,
    /// Ugandan shilling.
    UGX,
}

impl CurrencyCode {
    /// ISO 4217 alphabetic code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::XOF => "XOF",
            Self::XAF => "XAF",
            Self::ZMW => "ZMW",
            Self::UGX => "UGX",
        }
    }

    /// ISO 4217 exponent: digits of minor subdivision.
    ///
    /// The CFA francs and the shilling have no minor unit.
    #[must_use]
    pub const fn exponent(self) -> u32 {
        match self {
            Self::XOF | Self::XAF | Self::UGX => 0,
            Self::ZMW => 2,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_minor_roundtrip() {
        let amount = Amount::from_minor(2500);
        assert_eq!(amount.minor(), 2500);
        assert_eq!(amount.to_string(), "2500");
    }

    #[test]
    fn test_to_decimal_zero_exponent() {
        let amount = Amount::from_minor(1000);
        assert_eq!(amount.to_decimal(CurrencyCode::XOF).to_string(), "1000");
        assert_eq!(amount.to_decimal(CurrencyCode::UGX).to_string(), "1000");
    }

    #[test]
    fn test_to_decimal_two_exponent() {
        let amount = Amount::from_minor(1050);
        assert_eq!(amount.to_decimal(CurrencyCode::ZMW).to_string(), "10.50");
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(CurrencyCode::XOF.code(), "XOF");
        assert_eq!(CurrencyCode::default(), CurrencyCode::XOF);
    }

    #[test]
    fn test_amount_serde_transparent() {
        let amount = Amount::from_minor(1000);
        assert_eq!(serde_json::to_string(&amount).unwrap(), "1000");
    }
}
