//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all domain identifiers in the TaxPulse engine.
//! These prevent accidental identifier confusion — you cannot pass a
//! `RateCode` where a `RuleCode` is expected, or a bucket name where a
//! form id belongs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tax return (one per company/period/tax-type/version).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReturnId(pub Uuid);

impl ReturnId {
    /// Generate a new random return identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReturnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReturnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "return:{}", self.0)
    }
}

macro_rules! string_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a raw string value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Access the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_newtype! {
    /// Source-transaction identifier assigned by the upstream ledger.
    TxnId
}

string_newtype! {
    /// Company code scoping a run and its return.
    CompanyCode
}

string_newtype! {
    /// Philippine Taxpayer Identification Number.
    Tin
}

string_newtype! {
    /// BIR Alphanumeric Tax Code identifying a withholding category (e.g. `W010`).
    AtcCode
}

string_newtype! {
    /// Code of a tax or validation rule (e.g. `VAT-OUT-12`, `V-NEG-BUCKET`).
    RuleCode
}

string_newtype! {
    /// Code of an effective-dated tax rate (e.g. `VAT_12_SALES`).
    RateCode
}

string_newtype! {
    /// Named accumulator for computed tax amounts (e.g. `VAT_OUTPUT_12`).
    BucketName
}

string_newtype! {
    /// Regulatory form identifier (e.g. `2550Q`).
    FormId
}
