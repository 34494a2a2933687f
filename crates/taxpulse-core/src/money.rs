//! # Money Policy
//!
//! The single rounding and tolerance policy for all monetary arithmetic.
//! Every computed tax amount flows through [`round_centavos`]; no call
//! site applies its own rounding strategy.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a monetary amount to two decimal places, half-up.
///
/// "Half-up" here is midpoint-away-from-zero, so negative contra amounts
/// round symmetrically: `2.005 → 2.01` and `-2.005 → -2.01`.
pub fn round_centavos(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Default absolute tolerance for ledger reconciliation: one centavo.
pub fn default_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Percent change from `prior` to `current`, rounded to two decimals.
///
/// Returns `None` when `prior` is zero — a ratio against an empty prior
/// period is undefined, and callers classify that case separately.
pub fn percent_change(current: Decimal, prior: Decimal) -> Option<Decimal> {
    if prior.is_zero() {
        return None;
    }
    let change = (current - prior) / prior * Decimal::ONE_HUNDRED;
    Some(round_centavos(change))
}
