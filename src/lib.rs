//! BasketForge: market basket analysis in Rust
//!
//! Encodes transactions into a boolean basket matrix, mines frequent itemsets
//! with Apriori or FP-Growth, and derives association rules scored by
//! support, confidence, lift, leverage and conviction.

pub mod advisor;
pub mod cli;
pub mod config;
pub mod data;
pub mod encoder;
pub mod error;
pub mod export;
pub mod itemset;
pub mod miner;
pub mod pipeline;
pub mod rules;
pub mod viz;

// Re-export public items for easier access
pub use advisor::suggest_min_support;
pub use cli::Args;
pub use config::{Algorithm, MiningConfig};
pub use data::{load_transactions, ColumnMapping, QualityReport, QualityWeights};
pub use encoder::{BasketMatrix, Transaction, TransactionEncoder};
pub use error::BasketError;
pub use itemset::{FrequentItemset, FrequentItemsetTable, Itemset};
pub use miner::{mine, mine_with_cancel, CancelToken};
pub use pipeline::{DatasetSummary, PipelineContext};
pub use rules::{generate_rules, AssociationRule, RuleStrength};

/// Result type used by the CLI-facing layers (loading, export, charts)
pub type Result<T> = anyhow::Result<T>;
