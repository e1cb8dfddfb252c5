//! Caller-owned pipeline state: encoder → miner → rule generator
//!
//! Each stage stores its output on the context. Changing parameters drops the
//! outputs they invalidate, so stale rules are never served.

use crate::config::MiningConfig;
use crate::encoder::{BasketMatrix, TransactionEncoder};
use crate::error::{BasketError, Result};
use crate::itemset::FrequentItemsetTable;
use crate::miner::{self, CancelToken};
use crate::rules::{self, AssociationRule};
use serde::Serialize;

/// Shape of the encoded dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub n_transactions: usize,
    pub n_items: usize,
    pub avg_items_per_transaction: f64,
    /// Percentage of basket matrix cells that are set
    pub density_pct: f64,
}

impl DatasetSummary {
    pub fn of(basket: &BasketMatrix) -> Self {
        Self {
            n_transactions: basket.n_transactions(),
            n_items: basket.n_items(),
            avg_items_per_transaction: basket.avg_items_per_transaction(),
            density_pct: basket.density() * 100.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineContext {
    config: MiningConfig,
    basket: Option<BasketMatrix>,
    itemsets: Option<FrequentItemsetTable>,
    rules: Option<Vec<AssociationRule>>,
}

impl PipelineContext {
    pub fn new(config: MiningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            basket: None,
            itemsets: None,
            rules: None,
        })
    }

    /// Encode, mine and generate rules in one go
    pub fn run<I, T, S>(config: MiningConfig, transactions: I, cancel: &CancelToken) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut context = Self::new(config)?;
        context.encode(transactions)?;
        context.mine(cancel)?;
        context.generate_rules()?;
        Ok(context)
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// Swap parameters, dropping whatever they invalidate
    pub fn set_config(&mut self, config: MiningConfig) -> Result<()> {
        config.validate()?;
        let remine = config.algorithm != self.config.algorithm
            || config.min_support != self.config.min_support
            || config.max_len != self.config.max_len;
        if remine {
            self.itemsets = None;
        }
        self.rules = None;
        self.config = config;
        Ok(())
    }

    pub fn encode<I, T, S>(&mut self, transactions: I) -> Result<&BasketMatrix>
    where
        I: IntoIterator<Item = T>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let basket = TransactionEncoder::encode(transactions)?;
        self.itemsets = None;
        self.rules = None;
        Ok(self.basket.insert(basket))
    }

    pub fn mine(&mut self, cancel: &CancelToken) -> Result<&FrequentItemsetTable> {
        let basket = self
            .basket
            .as_ref()
            .ok_or_else(|| BasketError::Invariant("mining requested before encoding".into()))?;
        let table = miner::mine_with_cancel(
            basket,
            self.config.min_support,
            self.config.max_len,
            self.config.algorithm,
            cancel,
        )?;
        self.rules = None;
        Ok(self.itemsets.insert(table))
    }

    pub fn generate_rules(&mut self) -> Result<&[AssociationRule]> {
        let table = self.itemsets.as_ref().ok_or_else(|| {
            BasketError::Invariant("rule generation requested before mining".into())
        })?;
        let rules =
            rules::generate_rules(table, self.config.min_confidence, self.config.min_lift)?;
        Ok(self.rules.insert(rules).as_slice())
    }

    pub fn basket(&self) -> Option<&BasketMatrix> {
        self.basket.as_ref()
    }

    pub fn itemsets(&self) -> Option<&FrequentItemsetTable> {
        self.itemsets.as_ref()
    }

    pub fn rules(&self) -> Option<&[AssociationRule]> {
        self.rules.as_deref()
    }

    pub fn summary(&self) -> Option<DatasetSummary> {
        self.basket.as_ref().map(DatasetSummary::of)
    }
}
