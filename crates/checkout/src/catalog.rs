//! Countries and the payment methods available in each.
//!
//! The catalog is static reference data loaded into the binary: which
//! countries checkout supports, their numbering plans, and the ordered list
//! of mobile-money providers a customer in that country may pay with.
//! Lookups are pure; nothing here performs I/O.

use boutik_core::{CompletionShape, CurrencyCode, define_id};
use serde::{Deserialize, Serialize};

define_id!(MethodId);

/// ISO 3166-1 alpha-2 codes of the supported checkout countries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountryCode {
    /// Côte d'Ivoire
    CI,
    /// Sénégal
    SN,
    /// Togo
    TG,
    /// Bénin
    BJ,
    /// Zambia
    ZM,
    /// Uganda
    UG,
}

impl CountryCode {
    /// The alpha-2 code as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CI => "CI",
            Self::SN => "SN",
            Self::TG => "TG",
            Self::BJ => "BJ",
            Self::ZM => "ZM",
            Self::UG => "UG",
        }
    }

    /// Parse an alpha-2 code, case-insensitively.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "CI" => Some(Self::CI),
            "SN" => Some(Self::SN),
            "TG" => Some(Self::TG),
            "BJ" => Some(Self::BJ),
            "ZM" => Some(Self::ZM),
            "UG" => Some(Self::UG),
            _ => None,
        }
    }
}

impl core::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// National numbering shape for local mobile numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitRule {
    /// Exactly this many digits.
    Exact(usize),
    /// An inclusive digit-count range.
    Range(usize, usize),
}

impl DigitRule {
    /// Minimum acceptable digit count.
    #[must_use]
    pub const fn min(self) -> usize {
        match self {
            Self::Exact(n) | Self::Range(n, _) => n,
        }
    }

    /// Whether a digit count satisfies the rule.
    #[must_use]
    pub const fn contains(self, len: usize) -> bool {
        match self {
            Self::Exact(n) => len == n,
            Self::Range(lo, hi) => len >= lo && len <= hi,
        }
    }
}

impl core::fmt::Display for DigitRule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Range(lo, hi) => write!(f, "{lo}-{hi}"),
        }
    }
}

/// Provider-specific leading-digit constraint, applied after the country
/// shape rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixRule {
    /// No provider-specific constraint.
    None,
    /// A leading `0` followed by a digit in 1-9 (Ivorian local dialing).
    ZeroThenNonZero,
    /// The number must start with one of these digit sequences.
    StartsWithAny(&'static [&'static str]),
}

impl PrefixRule {
    /// Whether the digits satisfy the rule.
    #[must_use]
    pub fn matches(self, digits: &str) -> bool {
        match self {
            Self::None => true,
            Self::ZeroThenNonZero => {
                let mut chars = digits.chars();
                chars.next() == Some('0') && matches!(chars.next(), Some('1'..='9'))
            }
            Self::StartsWithAny(prefixes) => prefixes.iter().any(|p| digits.starts_with(p)),
        }
    }
}

/// A checkout country: display data plus its numbering plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    /// ISO alpha-2 code.
    pub code: CountryCode,
    /// Display name, as sent to the payment backend.
    pub name: &'static str,
    /// International dial prefix, without the `+`.
    pub dial_prefix: &'static str,
    /// Settlement currency.
    pub currency: CurrencyCode,
    /// Local mobile number shape.
    pub digit_rule: DigitRule,
}

/// A mobile-money payment method offered in exactly one country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentMethod {
    id: &'static str,
    display_name: &'static str,
    country: CountryCode,
    shape: CompletionShape,
    prefix: PrefixRule,
}

impl PaymentMethod {
    /// The unique method id (provider + country), e.g. `orange-money-ci`.
    #[must_use]
    pub fn id(&self) -> MethodId {
        MethodId::new(self.id)
    }

    /// The method id as a static string.
    #[must_use]
    pub const fn id_str(&self) -> &'static str {
        self.id
    }

    /// Customer-facing provider name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        self.display_name
    }

    /// The country this method belongs to.
    #[must_use]
    pub const fn country(&self) -> CountryCode {
        self.country
    }

    /// How this method finalizes after initialization.
    #[must_use]
    pub const fn shape(&self) -> CompletionShape {
        self.shape
    }

    /// Provider-specific phone prefix rule.
    #[must_use]
    pub const fn prefix(&self) -> PrefixRule {
        self.prefix
    }
}

const COUNTRIES: &[Country] = &[
    Country {
        code: CountryCode::CI,
        name: "Côte d'Ivoire",
        dial_prefix: "225",
        currency: CurrencyCode::XOF,
        digit_rule: DigitRule::Range(8, 10),
    },
    Country {
        code: CountryCode::SN,
        name: "Sénégal",
        dial_prefix: "221",
        currency: CurrencyCode::XOF,
        digit_rule: DigitRule::Exact(9),
    },
    Country {
        code: CountryCode::TG,
        name: "Togo",
        dial_prefix: "228",
        currency: CurrencyCode::XOF,
        digit_rule: DigitRule::Range(8, 9),
    },
    Country {
        code: CountryCode::BJ,
        name: "Bénin",
        dial_prefix: "229",
        currency: CurrencyCode::XOF,
        digit_rule: DigitRule::Exact(8),
    },
    Country {
        code: CountryCode::ZM,
        name: "Zambia",
        dial_prefix: "260",
        currency: CurrencyCode::ZMW,
        digit_rule: DigitRule::Exact(9),
    },
    Country {
        code: CountryCode::UG,
        name: "Uganda",
        dial_prefix: "256",
        currency: CurrencyCode::UGX,
        digit_rule: DigitRule::Exact(9),
    },
];

// The orange-money-ci row carries the redirect shape like its Ivorian
// siblings; its OTP completion is a method-id special case in the
// orchestrator, not a catalog property.
const CI_METHODS: &[PaymentMethod] = &[
    PaymentMethod {
        id: "orange-money-ci",
        display_name: "Orange Money",
        country: CountryCode::CI,
        shape: CompletionShape::Redirect,
        prefix: PrefixRule::ZeroThenNonZero,
    },
    PaymentMethod {
        id: "wave-ci",
        display_name: "Wave",
        country: CountryCode::CI,
        shape: CompletionShape::Redirect,
        prefix: PrefixRule::ZeroThenNonZero,
    },
    PaymentMethod {
        id: "mtn-ci",
        display_name: "MTN Mobile Money",
        country: CountryCode::CI,
        shape: CompletionShape::Redirect,
        prefix: PrefixRule::ZeroThenNonZero,
    },
    PaymentMethod {
        id: "moov-ci",
        display_name: "Moov Money",
        country: CountryCode::CI,
        shape: CompletionShape::Redirect,
        prefix: PrefixRule::ZeroThenNonZero,
    },
];

const SN_METHODS: &[PaymentMethod] = &[
    PaymentMethod {
        id: "orange-money-senegal",
        display_name: "Orange Money",
        country: CountryCode::SN,
        shape: CompletionShape::Redirect,
        prefix: PrefixRule::StartsWithAny(&["7"]),
    },
    PaymentMethod {
        id: "wave-senegal",
        display_name: "Wave",
        country: CountryCode::SN,
        shape: CompletionShape::Redirect,
        prefix: PrefixRule::StartsWithAny(&["7"]),
    },
    PaymentMethod {
        id: "e-money-senegal",
        display_name: "E-Money",
        country: CountryCode::SN,
        shape: CompletionShape::Redirect,
        prefix: PrefixRule::StartsWithAny(&["7"]),
    },
    PaymentMethod {
        id: "wizall-senegal",
        display_name: "Wizall Money",
        country: CountryCode::SN,
        shape: CompletionShape::Redirect,
        prefix: PrefixRule::StartsWithAny(&["7"]),
    },
];

const TG_METHODS: &[PaymentMethod] = &[
    PaymentMethod {
        id: "togocel",
        display_name: "Togocel T-Money",
        country: CountryCode::TG,
        shape: CompletionShape::Redirect,
        prefix: PrefixRule::StartsWithAny(&["9"]),
    },
    PaymentMethod {
        id: "t-money",
        display_name: "Moov Flooz",
        country: CountryCode::TG,
        shape: CompletionShape::Redirect,
        prefix: PrefixRule::StartsWithAny(&["9"]),
    },
];

const BJ_METHODS: &[PaymentMethod] = &[
    PaymentMethod {
        id: "mtn-benin",
        display_name: "MTN Mobile Money",
        country: CountryCode::BJ,
        shape: CompletionShape::Redirect,
        prefix: PrefixRule::StartsWithAny(&["6", "5"]),
    },
    PaymentMethod {
        id: "moov-benin",
        display_name: "Moov Money",
        country: CountryCode::BJ,
        shape: CompletionShape::Redirect,
        prefix: PrefixRule::StartsWithAny(&["9"]),
    },
];

const ZM_METHODS: &[PaymentMethod] = &[
    PaymentMethod {
        id: "mtn-momo-zambia",
        display_name: "MTN MoMo",
        country: CountryCode::ZM,
        shape: CompletionShape::Direct,
        prefix: PrefixRule::StartsWithAny(&["76", "96"]),
    },
    PaymentMethod {
        id: "airtel-money-zambia",
        display_name: "Airtel Money",
        country: CountryCode::ZM,
        shape: CompletionShape::Direct,
        prefix: PrefixRule::StartsWithAny(&["77", "97"]),
    },
];

const UG_METHODS: &[PaymentMethod] = &[
    PaymentMethod {
        id: "mtn-momo-uganda",
        display_name: "MTN MoMo",
        country: CountryCode::UG,
        shape: CompletionShape::Direct,
        prefix: PrefixRule::StartsWithAny(&["76", "77", "78"]),
    },
    PaymentMethod {
        id: "airtel-money-uganda",
        display_name: "Airtel Money",
        country: CountryCode::UG,
        shape: CompletionShape::Direct,
        prefix: PrefixRule::StartsWithAny(&["70", "74", "75"]),
    },
];

/// Static lookup over countries and payment methods.
pub struct Catalog;

impl Catalog {
    /// All supported countries, in display order.
    #[must_use]
    pub const fn countries() -> &'static [Country] {
        COUNTRIES
    }

    /// The country pre-selected when a checkout opens.
    #[must_use]
    pub const fn default_country() -> CountryCode {
        CountryCode::CI
    }

    /// Country record for a code.
    #[must_use]
    pub fn country(code: CountryCode) -> &'static Country {
        // COUNTRIES covers every CountryCode variant.
        COUNTRIES
            .iter()
            .find(|c| c.code == code)
            .unwrap_or(&COUNTRIES[0])
    }

    /// Ordered payment methods available in a country.
    #[must_use]
    pub const fn methods_for(code: CountryCode) -> &'static [PaymentMethod] {
        match code {
            CountryCode::CI => CI_METHODS,
            CountryCode::SN => SN_METHODS,
            CountryCode::TG => TG_METHODS,
            CountryCode::BJ => BJ_METHODS,
            CountryCode::ZM => ZM_METHODS,
            CountryCode::UG => UG_METHODS,
        }
    }

    /// Methods for a raw country-code string; empty for unknown codes.
    #[must_use]
    pub fn methods_for_code(code: &str) -> &'static [PaymentMethod] {
        CountryCode::parse(code).map_or(&[], Self::methods_for)
    }

    /// Resolve a method by id across all countries.
    #[must_use]
    pub fn method(id: &MethodId) -> Option<&'static PaymentMethod> {
        COUNTRIES
            .iter()
            .flat_map(|c| Self::methods_for(c.code))
            .find(|m| m.id_str() == id.as_str())
    }
}
