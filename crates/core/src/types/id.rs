//! Newtype IDs for type-safe entity references.
//!
//! The voucher API issues opaque string identifiers (document IDs), so the
//! `define_id!` macro wraps a `String` rather than an integer.

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use payment_voucher_core::define_id;
/// define_id!(AccountId);
/// define_id!(BeneficiaryId);
///
/// let account = AccountId::new("64f1c2");
/// let beneficiary = BeneficiaryId::new("64f1c2");
/// assert_eq!(account.as_str(), beneficiary.as_str());
///
/// // These are different types, so this won't compile:
/// // let _: AccountId = beneficiary;
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
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Convert into the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
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

define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_is_transparent_in_json() {
        let id = UserId::new("64f1c2ab");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"64f1c2ab\"");
    }

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId::from("u-1").to_string(), "u-1");
    }
}
