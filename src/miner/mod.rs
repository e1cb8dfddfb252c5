//! Frequent itemset mining
//!
//! Two strategies share one entry point and one support threshold test, so
//! for the same basket and parameters they return the same table.

mod apriori;
mod fpgrowth;

use crate::config::{self, Algorithm};
use crate::encoder::BasketMatrix;
use crate::error::{BasketError, Result};
use crate::itemset::{FrequentItemset, FrequentItemsetTable};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Caller-side abort switch for a mining run
///
/// Clones share the same flag. The miner polls it between Apriori rounds and
/// between conditional-tree recursions.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that also trips once `timeout` has elapsed
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(BasketError::Cancelled);
        }
        Ok(())
    }
}

/// Mine every itemset with support >= `min_support` and at most `max_len` items
pub fn mine(
    basket: &BasketMatrix,
    min_support: f64,
    max_len: usize,
    algorithm: Algorithm,
) -> Result<FrequentItemsetTable> {
    mine_with_cancel(basket, min_support, max_len, algorithm, &CancelToken::new())
}

/// Same as [`mine`], stopping early with [`BasketError::Cancelled`] when the
/// token trips. A cancelled run returns no table.
#[instrument(
    skip(basket, cancel),
    fields(transactions = basket.n_transactions(), items = basket.n_items())
)]
pub fn mine_with_cancel(
    basket: &BasketMatrix,
    min_support: f64,
    max_len: usize,
    algorithm: Algorithm,
    cancel: &CancelToken,
) -> Result<FrequentItemsetTable> {
    config::validate_min_support(min_support)?;
    config::validate_max_len(max_len)?;

    let n = basket.n_transactions();
    if n == 0 || basket.n_items() == 0 {
        return Err(BasketError::EmptyInput("basket matrix has no cells".into()));
    }
    cancel.check()?;

    let min_count = config::min_count(min_support, n);
    let records = match algorithm {
        Algorithm::Apriori => apriori::mine(basket, min_count, max_len, cancel)?,
        Algorithm::FpGrowth => fpgrowth::mine(basket, min_count, max_len, cancel)?,
    };

    let table = FrequentItemsetTable::from_records(records, basket.items().to_vec(), n);
    info!(
        %algorithm,
        min_count,
        itemsets = table.len(),
        longest = table.max_itemset_len(),
        "Frequent itemset mining finished"
    );
    Ok(table)
}

pub(crate) fn record(items: crate::itemset::Itemset, count: usize, n: usize) -> FrequentItemset {
    FrequentItemset {
        items,
        count,
        support: count as f64 / n as f64,
    }
}
