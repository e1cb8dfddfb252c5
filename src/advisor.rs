//! Starting-point suggestions for mining parameters

use crate::error::{BasketError, Result};

/// Transactions an itemset should appear in under the suggested threshold
const TARGET_OCCURRENCES: f64 = 20.0;
const MIN_SUGGESTED_SUPPORT: f64 = 0.001;
const MAX_SUGGESTED_SUPPORT: f64 = 0.05;

/// Suggest `min_support` for a dataset of `n_transactions`:
/// `clamp(20 / n, 0.001, 0.05)`.
pub fn suggest_min_support(n_transactions: usize) -> Result<f64> {
    if n_transactions == 0 {
        return Err(BasketError::invalid(
            "n_transactions",
            "must be at least 1 to suggest a support threshold",
        ));
    }
    Ok((TARGET_OCCURRENCES / n_transactions as f64)
        .clamp(MIN_SUGGESTED_SUPPORT, MAX_SUGGESTED_SUPPORT))
}

/// How many transactions `min_support` corresponds to, rounded down
pub fn transactions_for_support(min_support: f64, n_transactions: usize) -> usize {
    (min_support * n_transactions as f64).floor() as usize
}
