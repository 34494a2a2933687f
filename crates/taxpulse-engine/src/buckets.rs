//! # Output Bucket Accumulator
//!
//! Named monetary accumulators keyed by [`BucketName`]. The map is
//! ordered so iteration, serialization, and downstream line mapping are
//! deterministic. A bucket nobody has written reads as zero, both through
//! [`Buckets::amount`] and through the [`SymbolTable`] lens aggregate
//! formulas evaluate against.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use taxpulse_core::{BucketName, FieldContext, FieldValue};
use taxpulse_expr::SymbolTable;

/// Ordered map of output buckets to accumulated amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Buckets(BTreeMap<BucketName, Decimal>);

impl Buckets {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an amount to a bucket, creating it at zero first if absent.
    pub fn accumulate(&mut self, bucket: BucketName, amount: Decimal) {
        *self.0.entry(bucket).or_insert(Decimal::ZERO) += amount;
    }

    /// Set a bucket to an exact amount, replacing any prior value.
    /// Aggregate rules use this so re-derivation never double-counts.
    pub fn set(&mut self, bucket: BucketName, amount: Decimal) {
        self.0.insert(bucket, amount);
    }

    /// The amount in a bucket; absent buckets read as zero.
    pub fn amount(&self, bucket: &BucketName) -> Decimal {
        self.0.get(bucket).copied().unwrap_or(Decimal::ZERO)
    }

    /// Whether the bucket has been written at all.
    pub fn contains(&self, bucket: &BucketName) -> bool {
        self.0.contains_key(bucket)
    }

    /// Buckets in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&BucketName, &Decimal)> {
        self.0.iter()
    }

    /// Number of written buckets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(BucketName, Decimal)> for Buckets {
    fn from_iter<I: IntoIterator<Item = (BucketName, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl SymbolTable for Buckets {
    fn resolve(&self, name: &str) -> Option<Decimal> {
        self.0.get(&BucketName::new(name)).copied()
    }
}

impl FieldContext for Buckets {
    fn field(&self, name: &str) -> FieldValue {
        match self.0.get(&BucketName::new(name)) {
            Some(amount) => FieldValue::Number(*amount),
            None => FieldValue::Null,
        }
    }
}
