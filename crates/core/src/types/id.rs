//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe wrappers around the string
//! identifiers the payment backend speaks, preventing a store id from being
//! passed where a product id or payment token belongs.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use boutik_core::define_id;
/// define_id!(StoreId);
/// define_id!(ProductId);
///
/// let store = StoreId::new("btk-7201");
/// let product = ProductId::new("wax-print-tote");
///
/// // These are different types, so this won't compile:
/// // let _: StoreId = product;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

// Define standard entity IDs
define_id!(StoreId);
define_id!(ProductId);
define_id!(PaymentToken);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = StoreId::new("btk-7201");
        assert_eq!(id.as_str(), "btk-7201");
        assert_eq!(id.to_string(), "btk-7201");
        assert_eq!(id.into_inner(), "btk-7201");
    }

    #[test]
    fn test_id_serde_transparent() {
        let token = PaymentToken::new("tok_8f3ab2");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"tok_8f3ab2\"");

        let parsed: PaymentToken = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_id_from_str() {
        let id: ProductId = "wax-print-tote".into();
        assert_eq!(id.as_str(), "wax-print-tote");
    }
}
