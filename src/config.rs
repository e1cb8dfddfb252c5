//! Mining parameters and their validation

use crate::error::{BasketError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slack applied when comparing a support fraction against its threshold,
/// so that e.g. 2/5 still passes `min_support = 0.4`.
pub(crate) const SUPPORT_EPSILON: f64 = 1e-12;

/// Frequent itemset mining strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Level-wise candidate generation
    #[default]
    Apriori,
    /// Prefix-tree projection
    #[value(name = "fp-growth", alias = "fpgrowth")]
    FpGrowth,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Apriori => write!(f, "Apriori"),
            Algorithm::FpGrowth => write!(f, "FP-Growth"),
        }
    }
}

/// Parameters consumed by the miner and the rule generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningConfig {
    pub algorithm: Algorithm,
    /// Minimum fraction of transactions an itemset must appear in, in (0, 1]
    pub min_support: f64,
    /// Minimum rule confidence, in (0, 1]
    pub min_confidence: f64,
    /// Minimum rule lift; 0 disables the filter
    pub min_lift: f64,
    /// Largest itemset cardinality to mine
    pub max_len: usize,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Apriori,
            min_support: 0.01,
            min_confidence: 0.3,
            min_lift: 1.2,
            max_len: 4,
        }
    }
}

impl MiningConfig {
    /// Reject out-of-range parameters. Nothing is clamped.
    pub fn validate(&self) -> Result<()> {
        validate_min_support(self.min_support)?;
        validate_max_len(self.max_len)?;
        validate_min_confidence(self.min_confidence)?;
        validate_min_lift(self.min_lift)
    }
}

pub(crate) fn validate_min_support(min_support: f64) -> Result<()> {
    if !(min_support > 0.0 && min_support <= 1.0) {
        return Err(BasketError::invalid(
            "min_support",
            format!("must be in (0, 1], got {min_support}"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_max_len(max_len: usize) -> Result<()> {
    if max_len < 1 {
        return Err(BasketError::invalid("max_len", "must be at least 1"));
    }
    Ok(())
}

pub(crate) fn validate_min_confidence(min_confidence: f64) -> Result<()> {
    if !(min_confidence > 0.0 && min_confidence <= 1.0) {
        return Err(BasketError::invalid(
            "min_confidence",
            format!("must be in (0, 1], got {min_confidence}"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_min_lift(min_lift: f64) -> Result<()> {
    if !(min_lift >= 0.0 && min_lift.is_finite()) {
        return Err(BasketError::invalid(
            "min_lift",
            format!("must be a finite value >= 0, got {min_lift}"),
        ));
    }
    Ok(())
}

/// Smallest transaction count that satisfies `min_support` over `n_transactions`
pub(crate) fn min_count(min_support: f64, n_transactions: usize) -> usize {
    let n = n_transactions as f64;
    let mut count = ((min_support - SUPPORT_EPSILON) * n).ceil().max(1.0) as usize;
    // guard against the ceil landing one above due to float error
    while count > 1 && (count - 1) as f64 / n >= min_support - SUPPORT_EPSILON {
        count -= 1;
    }
    count
}
