//! Local mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains a character that is not a digit, space, dot or dash.
    #[error("phone number may only contain digits")]
    NonDigit,
}

/// A local mobile number held as bare digits, without the international
/// dial prefix.
///
/// Whether the digits are *valid* for a given country or payment provider
/// is decided elsewhere; this type only guarantees the string is non-empty
/// and digits-only. Common grouping separators (spaces, dots, dashes) are
/// stripped on construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse a `PhoneNumber` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty after stripping separators,
    /// or contains anything other than ASCII digits and separators.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let mut digits = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '.' | '-' => {}
                _ => return Err(PhoneError::NonDigit),
            }
        }

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        Ok(Self(digits))
    }

    /// Returns the bare digits.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Number of digits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no digits. Unreachable through [`Self::parse`],
    /// but kept for the standard `len`/`is_empty` pairing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render the number in E.164 form for a given international dial prefix.
    ///
    /// ```
    /// use boutik_core::PhoneNumber;
    ///
    /// let phone = PhoneNumber::parse("07 12 34 56 78").unwrap();
    /// assert_eq!(phone.to_e164("225"), "+2250712345678");
    /// ```
    #[must_use]
    pub fn to_e164(&self, dial_prefix: &str) -> String {
        format!("+{dial_prefix}{}", self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_separators() {
        let phone = PhoneNumber::parse("77 123.45-67").unwrap();
        assert_eq!(phone.digits(), "771234567");
    }

    #[test]
    fn test_parse_rejects_letters() {
        assert!(matches!(
            PhoneNumber::parse("77abc4567"),
            Err(PhoneError::NonDigit)
        ));
    }

    #[test]
    fn test_parse_rejects_plus() {
        // The dial prefix is supplied by the country, not typed by the user.
        assert!(matches!(
            PhoneNumber::parse("+2250712345678"),
            Err(PhoneError::NonDigit)
        ));
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(PhoneNumber::parse(""), Err(PhoneError::Empty)));
        assert!(matches!(PhoneNumber::parse(" - "), Err(PhoneError::Empty)));
    }

    #[test]
    fn test_to_e164() {
        let phone = PhoneNumber::parse("0712345678").unwrap();
        assert_eq!(phone.to_e164("225"), "+2250712345678");
    }

    #[test]
    fn test_serde_is_transparent() {
        let phone = PhoneNumber::parse("901234567").unwrap();
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"901234567\"");
    }
}
