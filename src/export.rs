//! CSV and JSON export of itemset and rule tables

use crate::config::MiningConfig;
use crate::itemset::{FrequentItemsetTable, ItemsetRow};
use crate::pipeline::{DatasetSummary, PipelineContext};
use crate::rules::{rule_rows, AssociationRule, RuleRow};
use anyhow::Context;
use chrono::{DateTime, Utc};
use polars::df;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

const FORMAT_VERSION: &str = "1.0";
const ITEM_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Serialize)]
pub struct ExportMetadata {
    pub export_timestamp: DateTime<Utc>,
    pub format_version: &'static str,
    pub tool: &'static str,
}

/// Everything a downstream report needs, with item names resolved
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub parameters: MiningConfig,
    pub summary: Option<DatasetSummary>,
    pub frequent_itemsets: Vec<ItemsetRow>,
    pub rules: Vec<RuleRow>,
    pub metadata: ExportMetadata,
}

impl AnalysisReport {
    pub fn from_context(context: &PipelineContext) -> crate::Result<Self> {
        let table = context
            .itemsets()
            .context("No frequent itemsets to export; run mining first")?;
        Ok(Self {
            parameters: context.config().clone(),
            summary: context.summary(),
            frequent_itemsets: table.rows(),
            rules: rule_rows(table, context.rules().unwrap_or_default()),
            metadata: ExportMetadata {
                export_timestamp: Utc::now(),
                format_version: FORMAT_VERSION,
                tool: env!("CARGO_PKG_NAME"),
            },
        })
    }
}

/// Frequent itemsets as a DataFrame: itemsets, length, count, support
pub fn itemsets_frame(table: &FrequentItemsetTable) -> PolarsResult<DataFrame> {
    let rows = table.rows();
    let itemsets: Vec<String> = rows.iter().map(|r| r.items.join(ITEM_SEPARATOR)).collect();
    let lengths: Vec<u32> = rows.iter().map(|r| r.length as u32).collect();
    let counts: Vec<u64> = rows.iter().map(|r| r.count as u64).collect();
    let supports: Vec<f64> = rows.iter().map(|r| r.support).collect();

    df!(
        "itemsets" => itemsets,
        "length" => lengths,
        "count" => counts,
        "support" => supports
    )
}

/// Rules as a DataFrame, one column per metric; infinite conviction is null
pub fn rules_frame(
    table: &FrequentItemsetTable,
    rules: &[AssociationRule],
) -> PolarsResult<DataFrame> {
    let rows = rule_rows(table, rules);
    let metric = |f: fn(&RuleRow) -> f64| rows.iter().map(f).collect::<Vec<f64>>();

    df!(
        "antecedents" => rows.iter().map(|r| r.antecedents.join(ITEM_SEPARATOR)).collect::<Vec<_>>(),
        "consequents" => rows.iter().map(|r| r.consequents.join(ITEM_SEPARATOR)).collect::<Vec<_>>(),
        "antecedent_support" => metric(|r| r.antecedent_support),
        "consequent_support" => metric(|r| r.consequent_support),
        "support" => metric(|r| r.support),
        "confidence" => metric(|r| r.confidence),
        "lift" => metric(|r| r.lift),
        "leverage" => metric(|r| r.leverage),
        "conviction" => rows.iter().map(|r| r.conviction).collect::<Vec<Option<f64>>>(),
        "strength" => rows.iter().map(|r| r.strength.to_string()).collect::<Vec<_>>()
    )
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> crate::Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

pub fn write_json(report: &AnalysisReport, path: &Path) -> crate::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

/// Write itemsets and rules CSVs (and optionally the JSON report) into
/// `output_dir`, with a timestamp suffix. Returns the written paths.
pub fn export_results(
    context: &PipelineContext,
    output_dir: &Path,
    include_json: bool,
) -> crate::Result<Vec<PathBuf>> {
    let table = context
        .itemsets()
        .context("No frequent itemsets to export; run mining first")?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let stamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
    let mut written = Vec::new();

    let itemsets_path = output_dir.join(format!("frequent_itemsets_{stamp}.csv"));
    write_csv(&mut itemsets_frame(table)?, &itemsets_path)?;
    written.push(itemsets_path);

    let rules_path = output_dir.join(format!("association_rules_{stamp}.csv"));
    write_csv(
        &mut rules_frame(table, context.rules().unwrap_or_default())?,
        &rules_path,
    )?;
    written.push(rules_path);

    if include_json {
        let json_path = output_dir.join(format!("analysis_{stamp}.json"));
        write_json(&AnalysisReport::from_context(context)?, &json_path)?;
        written.push(json_path);
    }

    info!(files = written.len(), "Exported results to {}", output_dir.display());
    Ok(written)
}
