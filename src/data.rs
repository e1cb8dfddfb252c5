//! Loading transaction/item pairs from CSV using Polars
//!
//! This is the thin cleaning layer in front of the encoder: it drops rows with
//! a missing id or item, normalizes item names, and groups rows into
//! transactions. Quantities never remove a row; the basket matrix only
//! records presence.

use crate::encoder::{Transaction, TransactionEncoder};
use anyhow::Context;
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// Which CSV columns hold the transaction id, the item and (optionally) the quantity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub transaction: String,
    pub item: String,
    /// Must exist when set; a line counts once whatever its quantity
    pub quantity: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            transaction: "InvoiceNo".to_string(),
            item: "Description".to_string(),
            quantity: None,
        }
    }
}

/// Weights of the three quality components; they need not sum to one
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityWeights {
    pub completeness: f64,
    pub uniqueness: f64,
    pub richness: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            completeness: 1.0,
            uniqueness: 1.0,
            richness: 1.0,
        }
    }
}

/// Quality metrics of the raw extracted rows, before any row is dropped or
/// deduplicated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub total_rows: usize,
    pub missing_transactions: usize,
    pub missing_items: usize,
    pub unique_transactions: usize,
    pub unique_items: usize,
    pub avg_items_per_transaction: f64,
    /// 0-100
    pub quality_score: f64,
}

impl QualityReport {
    /// Score is the weighted mean of completeness, item uniqueness and basket
    /// richness (5 items per basket counts as fully rich), each in 0-100.
    pub fn compute(
        total_rows: usize,
        missing_transactions: usize,
        missing_items: usize,
        unique_transactions: usize,
        unique_items: usize,
        avg_items_per_transaction: f64,
        weights: QualityWeights,
    ) -> Self {
        let quality_score = if total_rows == 0 {
            0.0
        } else {
            let rows = total_rows as f64;
            let completeness =
                (1.0 - (missing_transactions + missing_items) as f64 / (2.0 * rows)) * 100.0;
            let uniqueness = (unique_items as f64 / rows).min(1.0) * 100.0;
            let richness = (avg_items_per_transaction / 5.0).min(1.0) * 100.0;
            let total_weight = weights.completeness + weights.uniqueness + weights.richness;
            if total_weight <= 0.0 {
                0.0
            } else {
                (completeness * weights.completeness
                    + uniqueness * weights.uniqueness
                    + richness * weights.richness)
                    / total_weight
            }
        };

        Self {
            total_rows,
            missing_transactions,
            missing_items,
            unique_transactions,
            unique_items,
            avg_items_per_transaction,
            quality_score,
        }
    }
}

/// Cleaned transactions ready for encoding
#[derive(Debug, Clone)]
pub struct TransactionData {
    pub transactions: Vec<Transaction>,
    pub quality: QualityReport,
    /// Rows removed by cleaning
    pub rows_dropped: usize,
}

/// Load a CSV file and group its rows into transactions
///
/// # Arguments
/// * `file_path` - Path to the CSV file (with header row)
/// * `mapping` - Column names to read
/// * `weights` - Weights for the quality score
pub fn load_transactions(
    file_path: &str,
    mapping: &ColumnMapping,
    weights: QualityWeights,
) -> crate::Result<TransactionData> {
    let mut columns = vec![col(&mapping.transaction), col(&mapping.item)];
    if let Some(quantity) = &mapping.quantity {
        columns.push(col(quantity));
    }

    // every column is read as a string so ids like "C536379" survive
    let raw = LazyCsvReader::new(file_path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
        .with_context(|| format!("Failed to open CSV file: {file_path}"))?
        .select(columns)
        .collect()
        .with_context(|| {
            format!(
                "Failed to read columns '{}' and '{}' from {file_path}",
                mapping.transaction, mapping.item
            )
        })?;

    let total_rows = raw.height();
    if total_rows == 0 {
        anyhow::bail!("CSV file {file_path} has no data rows");
    }
    let quality = raw_quality(&raw, mapping, weights)?;

    let keep = col(&mapping.transaction)
        .is_not_null()
        .and(col(&mapping.item).is_not_null());
    let filtered = raw.lazy().filter(keep).collect()?;

    let ids = filtered.column(&mapping.transaction)?.str()?;
    let items = filtered.column(&mapping.item)?.str()?;
    let pairs: Vec<(String, String)> = ids
        .into_iter()
        .zip(items.into_iter())
        .filter_map(|(id, item)| {
            let id = id?.trim();
            let item = normalize_item(item?);
            (!id.is_empty() && !item.is_empty()).then(|| (id.to_string(), item))
        })
        .collect();

    let rows_dropped = total_rows - pairs.len();
    debug!(total_rows, rows_dropped, "Cleaned transaction rows");

    let transactions = TransactionEncoder::group_pairs(pairs.iter().map(|(t, i)| (t, i)));
    if transactions.is_empty() {
        anyhow::bail!("No valid transactions remain after cleaning");
    }

    info!(
        transactions = transactions.len(),
        quality_score = quality.quality_score,
        "Loaded transactions from {file_path}"
    );

    Ok(TransactionData {
        transactions,
        quality,
        rows_dropped,
    })
}

/// Quality of the rows as read, nulls and duplicates included
fn raw_quality(
    raw: &DataFrame,
    mapping: &ColumnMapping,
    weights: QualityWeights,
) -> crate::Result<QualityReport> {
    let ids = raw.column(&mapping.transaction)?;
    let items = raw.column(&mapping.item)?;

    let missing_transactions = ids.null_count();
    let unique_transactions = ids.drop_nulls().n_unique()?;
    let unique_items = items.drop_nulls().n_unique()?;

    // rows per transaction id, averaged over ids
    let avg_items_per_transaction = if unique_transactions == 0 {
        0.0
    } else {
        let sizes = raw
            .clone()
            .lazy()
            .filter(col(&mapping.transaction).is_not_null())
            .group_by([col(&mapping.transaction)])
            .agg([len().alias("rows")])
            .collect()?;
        sizes.column("rows")?.mean().unwrap_or(0.0)
    };

    Ok(QualityReport::compute(
        raw.height(),
        missing_transactions,
        items.null_count(),
        unique_transactions,
        unique_items,
        avg_items_per_transaction,
        weights,
    ))
}

/// Canonical item name: punctuation other than hyphens removed, title case,
/// single spaces
fn normalize_item(raw: &str) -> String {
    let mut titled = String::with_capacity(raw.len());
    let mut after_letter = false;
    for c in raw
        .chars()
        .filter(|&c| c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace())
    {
        if c.is_alphabetic() {
            if after_letter {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            titled.push(c);
            after_letter = false;
        }
    }
    titled.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "InvoiceNo,StockCode,Description,Quantity,CustomerID").unwrap();
        writeln!(file, "536365,85123A,WHITE HANGING HEART T-LIGHT HOLDER,6,17850").unwrap();
        writeln!(file, "536365,71053,WHITE  METAL LANTERN ,6,17850").unwrap();
        writeln!(file, "536365,71053,WHITE METAL LANTERN,2,17850").unwrap();
        writeln!(file, "536366,22633,HAND WARMER UNION JACK,6,17850").unwrap();
        writeln!(file, "C536367,22633,HAND WARMER UNION JACK,-1,13047").unwrap();
        writeln!(file, "536368,84406B,,8,13047").unwrap();
        file
    }

    #[test]
    fn test_load_transactions() {
        let test_file = create_test_csv();
        let file_path = test_file.path().to_str().unwrap();

        let mapping = ColumnMapping {
            quantity: Some("Quantity".to_string()),
            ..ColumnMapping::default()
        };
        let data = load_transactions(file_path, &mapping, QualityWeights::default()).unwrap();

        // only the row without a description is dropped; the return line stays
        assert_eq!(data.transactions.len(), 3);
        assert_eq!(data.transactions[0].len(), 2);
        assert!(data.transactions[0].contains("White Metal Lantern"));
        assert!(data.transactions[0].contains("White Hanging Heart T-Light Holder"));
        assert!(data.transactions[2].contains("Hand Warmer Union Jack"));
        assert_eq!(data.rows_dropped, 1);
    }

    #[test]
    fn test_quality_measured_on_raw_rows() {
        let test_file = create_test_csv();
        let file_path = test_file.path().to_str().unwrap();

        let data =
            load_transactions(file_path, &ColumnMapping::default(), QualityWeights::default())
                .unwrap();
        let quality = &data.quality;
        assert_eq!(quality.total_rows, 6);
        assert_eq!(quality.missing_transactions, 0);
        assert_eq!(quality.missing_items, 1);
        assert_eq!(quality.unique_transactions, 4);
        // the two spellings of the lantern are still distinct here
        assert_eq!(quality.unique_items, 4);
        assert!((quality.avg_items_per_transaction - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_quantity_never_drops_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "TID,Item,Qty").unwrap();
        writeln!(file, "T1,Bread,2").unwrap();
        writeln!(file, "T2,Milk,0").unwrap();
        writeln!(file, "T3,Eggs,-1").unwrap();
        writeln!(file, "T4,Eggs,").unwrap();
        writeln!(file, "T5,Tea,n/a").unwrap();

        let mapping = ColumnMapping {
            transaction: "TID".to_string(),
            item: "Item".to_string(),
            quantity: Some("Qty".to_string()),
        };
        let data =
            load_transactions(file.path().to_str().unwrap(), &mapping, QualityWeights::default())
                .unwrap();

        assert_eq!(data.transactions.len(), 5);
        assert_eq!(data.rows_dropped, 0);
        assert!(data.transactions[2].contains("Eggs"));
        assert!(data.transactions[3].contains("Eggs"));
    }

    #[test]
    fn test_item_spellings_merge() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "TID,Item").unwrap();
        writeln!(file, "T1,bread").unwrap();
        writeln!(file, "T1,BREAD").unwrap();
        writeln!(file, "T1,Milk!").unwrap();
        writeln!(file, "T2,Bread").unwrap();
        writeln!(file, "T2,  milk ").unwrap();

        let mapping = ColumnMapping {
            transaction: "TID".to_string(),
            item: "Item".to_string(),
            quantity: None,
        };
        let data =
            load_transactions(file.path().to_str().unwrap(), &mapping, QualityWeights::default())
                .unwrap();

        let expected: Transaction = ["Bread", "Milk"].iter().map(|s| s.to_string()).collect();
        assert_eq!(data.transactions, vec![expected.clone(), expected]);
    }

    #[test]
    fn test_normalize_item() {
        assert_eq!(normalize_item("WHITE  METAL LANTERN "), "White Metal Lantern");
        assert_eq!(normalize_item("t-light holder"), "T-Light Holder");
        assert_eq!(normalize_item("Milk!!"), "Milk");
        assert_eq!(normalize_item("3d printer"), "3D Printer");
        assert_eq!(normalize_item("?!"), "");
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let test_file = create_test_csv();
        let file_path = test_file.path().to_str().unwrap();

        let mapping = ColumnMapping {
            item: "Product".to_string(),
            ..ColumnMapping::default()
        };
        assert!(load_transactions(file_path, &mapping, QualityWeights::default()).is_err());
    }

    #[test]
    fn test_quality_score_weights() {
        let equal = QualityReport::compute(10, 0, 0, 2, 10, 5.0, QualityWeights::default());
        assert!((equal.quality_score - 100.0).abs() < 1e-9);

        let richness_only = QualityWeights {
            completeness: 0.0,
            uniqueness: 0.0,
            richness: 1.0,
        };
        let report = QualityReport::compute(10, 2, 0, 4, 1, 2.5, richness_only);
        assert!((report.quality_score - 50.0).abs() < 1e-9);
    }
}
