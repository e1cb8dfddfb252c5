//! Command-line interface definitions and argument parsing

use crate::advisor::suggest_min_support;
use crate::config::{Algorithm, MiningConfig};
use crate::data::{ColumnMapping, QualityWeights};
use clap::Parser;
use std::time::Duration;

/// Market basket analysis CLI: frequent itemsets and association rules
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "data.csv")]
    pub input: String,

    /// Column holding the transaction (invoice/order) id
    #[arg(long, default_value = "InvoiceNo")]
    pub transaction_col: String,

    /// Column holding the item name
    #[arg(long, default_value = "Description")]
    pub item_col: String,

    /// Optional quantity column; checked to exist, a line counts once whatever its value
    #[arg(long)]
    pub quantity_col: Option<String>,

    /// Mining algorithm
    #[arg(short, long, value_enum, default_value = "apriori")]
    pub algorithm: Algorithm,

    /// Minimum support; suggested from the transaction count when omitted
    #[arg(short = 's', long)]
    pub min_support: Option<f64>,

    /// Minimum rule confidence
    #[arg(short = 'c', long, default_value = "0.3")]
    pub min_confidence: f64,

    /// Minimum rule lift (0 disables the filter)
    #[arg(short = 'l', long, default_value = "1.2")]
    pub min_lift: f64,

    /// Maximum number of items in an itemset
    #[arg(short = 'm', long, default_value = "4")]
    pub max_len: usize,

    /// Directory for CSV (and JSON) exports
    #[arg(short, long, default_value = "basket_output")]
    pub output_dir: String,

    /// Also export a JSON report
    #[arg(long)]
    pub json: bool,

    /// Output path for the rule scatter plot; no charts when omitted
    #[arg(long)]
    pub plot: Option<String>,

    /// Number of top itemsets/rules to show
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Abort mining after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Quality score weights as completeness,uniqueness,richness
    #[arg(long, default_value = "1,1,1")]
    pub quality_weights: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn column_mapping(&self) -> ColumnMapping {
        ColumnMapping {
            transaction: self.transaction_col.clone(),
            item: self.item_col.clone(),
            quantity: self.quantity_col.clone(),
        }
    }

    /// Mining parameters for a dataset of `n_transactions`
    pub fn mining_config(&self, n_transactions: usize) -> crate::Result<MiningConfig> {
        let min_support = match self.min_support {
            Some(value) => value,
            None => suggest_min_support(n_transactions)?,
        };
        let config = MiningConfig {
            algorithm: self.algorithm,
            min_support,
            min_confidence: self.min_confidence,
            min_lift: self.min_lift,
            max_len: self.max_len,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Parse quality weights from the comma-separated string
    /// Expected format: "completeness,uniqueness,richness"
    pub fn parse_quality_weights(&self) -> crate::Result<QualityWeights> {
        let parts: Vec<&str> = self.quality_weights.split(',').collect();
        if parts.len() != 3 {
            anyhow::bail!("Quality weights must be in format 'completeness,uniqueness,richness'");
        }

        let parse = |name: &str, raw: &str| -> crate::Result<f64> {
            let value: f64 = raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid {} weight: {}", name, raw))?;
            if value < 0.0 {
                anyhow::bail!("{} weight must not be negative: {}", name, raw);
            }
            Ok(value)
        };

        Ok(QualityWeights {
            completeness: parse("completeness", parts[0])?,
            uniqueness: parse("uniqueness", parts[1])?,
            richness: parse("richness", parts[2])?,
        })
    }
}
