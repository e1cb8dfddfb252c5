//! Transaction encoding into a boolean basket matrix

use crate::error::{BasketError, Result};
use ndarray::{Array2, ArrayView1, Axis};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// One purchase: the set of distinct items bought together
pub type Transaction = BTreeSet<String>;

/// Boolean transaction-by-item presence matrix
///
/// Rows follow transaction order, columns follow the sorted item universe.
/// Only [`TransactionEncoder`] builds one, so columns and names always line up.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketMatrix {
    matrix: Array2<bool>,
    /// Sorted; column `j` holds `items[j]`
    items: Vec<String>,
}

impl BasketMatrix {
    /// Presence matrix of shape (n_transactions, n_items)
    pub fn matrix(&self) -> &Array2<bool> {
        &self.matrix
    }

    /// Item universe in column order
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn n_transactions(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_items(&self) -> usize {
        self.matrix.ncols()
    }

    /// Column index of an item, if it is part of the universe
    pub fn item_index(&self, item: &str) -> Option<usize> {
        self.items
            .binary_search_by(|probe| probe.as_str().cmp(item))
            .ok()
    }

    /// Item names for a set of column indices
    pub fn decode(&self, columns: &[usize]) -> Vec<&str> {
        columns.iter().map(|&c| self.items[c].as_str()).collect()
    }

    pub fn row(&self, row: usize) -> ArrayView1<'_, bool> {
        self.matrix.row(row)
    }

    /// Column indices present in each row
    pub fn row_indices(&self) -> Vec<Vec<usize>> {
        self.matrix
            .outer_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter_map(|(j, &present)| present.then_some(j))
                    .collect()
            })
            .collect()
    }

    /// Number of transactions containing each item
    pub fn column_counts(&self) -> Vec<usize> {
        self.matrix
            .axis_iter(Axis(1))
            .map(|column| column.iter().filter(|&&present| present).count())
            .collect()
    }

    /// Fraction of true cells
    pub fn density(&self) -> f64 {
        let cells = self.matrix.len();
        if cells == 0 {
            return 0.0;
        }
        self.matrix.iter().filter(|&&present| present).count() as f64 / cells as f64
    }

    /// Mean basket size
    pub fn avg_items_per_transaction(&self) -> f64 {
        if self.n_transactions() == 0 {
            return 0.0;
        }
        self.matrix.iter().filter(|&&present| present).count() as f64
            / self.n_transactions() as f64
    }
}

/// Turns transactions into a [`BasketMatrix`]
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionEncoder;

impl TransactionEncoder {
    /// Group (transaction-id, item) pairs into transactions.
    ///
    /// Transactions come out in order of the first appearance of their id.
    /// Repeated items inside a transaction collapse to one.
    pub fn group_pairs<I, K, S>(pairs: I) -> Vec<Transaction>
    where
        I: IntoIterator<Item = (K, S)>,
        K: AsRef<str>,
        S: AsRef<str>,
    {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut transactions: Vec<Transaction> = Vec::new();

        for (id, item) in pairs {
            let slot = match slots.get(id.as_ref()) {
                Some(&slot) => slot,
                None => {
                    slots.insert(id.as_ref().to_string(), transactions.len());
                    transactions.push(Transaction::new());
                    transactions.len() - 1
                }
            };
            transactions[slot].insert(item.as_ref().to_string());
        }

        transactions
    }

    /// Encode transactions into a basket matrix.
    ///
    /// Fails when there are no transactions or one of them is empty.
    pub fn encode<I, T, S>(transactions: I) -> Result<BasketMatrix>
    where
        I: IntoIterator<Item = T>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let transactions: Vec<Transaction> = transactions
            .into_iter()
            .map(|t| t.into_iter().map(|s| s.as_ref().to_string()).collect())
            .collect();

        if transactions.is_empty() {
            return Err(BasketError::EmptyInput("no transactions to encode".into()));
        }
        if let Some(pos) = transactions.iter().position(|t| t.is_empty()) {
            return Err(BasketError::EmptyInput(format!(
                "transaction {pos} has no items"
            )));
        }

        let universe: BTreeSet<&str> = transactions
            .iter()
            .flat_map(|t| t.iter().map(String::as_str))
            .collect();
        let items: Vec<String> = universe.into_iter().map(str::to_string).collect();
        if items.is_empty() {
            return Err(BasketError::EmptyInput("item universe is empty".into()));
        }

        let columns: HashMap<&str, usize> = items
            .iter()
            .enumerate()
            .map(|(j, item)| (item.as_str(), j))
            .collect();

        let mut matrix = Array2::from_elem((transactions.len(), items.len()), false);
        for (i, transaction) in transactions.iter().enumerate() {
            for item in transaction {
                matrix[[i, columns[item.as_str()]]] = true;
            }
        }

        debug!(
            transactions = matrix.nrows(),
            items = matrix.ncols(),
            "Encoded basket matrix"
        );

        Ok(BasketMatrix { matrix, items })
    }
}
